use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::action::{Action, Connection};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::store::{SqliteStore, UserRepository};

/// Asynchronous work requested by the state machine. Each command produces exactly
/// one result [`Action`].
#[derive(Debug, Clone)]
pub enum Command {
    Connect,
    LookupUser { repo: Connection, email: String },
    FetchToken { email: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Connect,
    Lookup,
    Fetch,
}

impl Command {
    pub fn kind(&self) -> CommandKind {
        match self {
            Command::Connect => CommandKind::Connect,
            Command::LookupUser { .. } => CommandKind::Lookup,
            Command::FetchToken { .. } => CommandKind::Fetch,
        }
    }
}

/// Runs commands on their own tasks and feeds the results back into the action channel.
pub struct Dispatcher {
    config: Arc<Config>,
    action_tx: mpsc::UnboundedSender<Action>,
}

impl Dispatcher {
    pub fn new(config: Config, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        Self {
            config: Arc::new(config),
            action_tx,
        }
    }

    /// Spawns the command. The returned handle may be dropped; the task runs detached.
    pub fn dispatch(&self, command: Command) -> JoinHandle<()> {
        debug!(kind = ?command.kind(), "dispatching command");
        match command {
            Command::Connect => self.spawn_connect(),
            Command::LookupUser { repo, email } => self.spawn_lookup(repo, email),
            Command::FetchToken { email } => self.spawn_fetch_token(email),
        }
    }

    fn spawn_connect(&self) -> JoinHandle<()> {
        let tx = self.action_tx.clone();
        let config = Arc::clone(&self.config);
        tokio::spawn(async move {
            // The receiver is gone once the loop has quit; late results are dropped.
            tx.send(connect(&config).await).ok();
        })
    }

    fn spawn_lookup(&self, repo: Connection, email: String) -> JoinHandle<()> {
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            tx.send(lookup_user(repo.as_ref(), &email).await).ok();
        })
    }

    fn spawn_fetch_token(&self, email: String) -> JoinHandle<()> {
        let tx = self.action_tx.clone();
        let delay = self.config.fetch_delay;
        tokio::spawn(async move {
            tx.send(fetch_token(&email, delay).await).ok();
        })
    }
}

pub async fn connect(config: &Config) -> Action {
    match open_and_seed(config).await {
        Ok(store) => {
            info!("connected to database");
            Action::Connected(Arc::new(store))
        }
        Err(e) => {
            warn!(error = %e, "database connect failed");
            Action::ConnectFailed(e.to_string())
        }
    }
}

async fn open_and_seed(config: &Config) -> Result<SqliteStore> {
    let store = SqliteStore::connect(&config.database_url, config.connect_timeout).await?;
    store
        .ping()
        .await
        .map_err(|e| AppError::Store(format!("failed pinging db: {}", e)))?;

    for email in &config.seed_users {
        store.ensure_seeded(email).await?;
    }
    Ok(store)
}

pub async fn lookup_user(repo: &dyn UserRepository, email: &str) -> Action {
    match repo.find_by_email(email).await {
        Ok(user) => {
            debug!(email, found = user.is_some(), "lookup finished");
            Action::UserLoaded(user)
        }
        Err(e) => {
            warn!(email, error = %e, "lookup failed");
            Action::LookupFailed(e.to_string())
        }
    }
}

/// Simulated remote call: waits `delay`, then derives a token from the email and the
/// completion time.
pub async fn fetch_token(email: &str, delay: Duration) -> Action {
    tokio::time::sleep(delay).await;
    match token_for(email, Utc::now()) {
        Ok(token) => Action::TokenFetched(token),
        Err(e) => Action::FetchFailed(e.to_string()),
    }
}

fn token_for(email: &str, at: DateTime<Utc>) -> Result<String> {
    if !(0..=9999).contains(&at.year()) {
        return Err(AppError::Token(format!(
            "year {} outside of range [0,9999]",
            at.year()
        )));
    }
    Ok(format!(
        "{}{}",
        email,
        at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
    ))
}
