mod action;
mod app;
mod commands;
mod config;
mod error;
mod event;
mod input;
mod store;
mod tui;
mod types;
mod ui;

use std::fs::OpenOptions;
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::action::Action;
use crate::app::App;
use crate::commands::Dispatcher;
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::event::Event;
use crate::tui::{EventHandler, Rates};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let config = Config::load();

    // Set DEBUG=1 and `tail -f debug.log` to follow the logs
    init_logging(&config)?;

    tui::install_panic_hook();

    run(config).await?;
    Ok(())
}

fn init_logging(config: &Config) -> Result<()> {
    if !config.debug {
        return Ok(());
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&config.log_file)
        .map_err(|source| AppError::LogFile {
            path: config.log_file.clone(),
            source,
        })?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false),
        )
        .init();
    Ok(())
}

async fn run(config: Config) -> Result<()> {
    let mut terminal = tui::init()?;

    let result = run_loop(&mut terminal, config).await;

    // The loop's error takes precedence over a failed restore.
    if let Err(e) = tui::restore() {
        warn!(error = %e, "failed restoring terminal");
    }
    result
}

async fn run_loop(terminal: &mut tui::Tui, config: Config) -> Result<()> {
    let (action_tx, mut action_rx) = mpsc::unbounded_channel::<Action>();

    let mut app = App::new();
    let dispatcher = Dispatcher::new(config, action_tx.clone());
    let mut events = EventHandler::new(Rates::default());

    // Every mutation goes through `app.update`, in the order actions arrive.
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                if event.is_quit() {
                    break;
                }

                match event {
                    Event::Render => {
                        terminal.draw(|frame| ui::render(frame, &app))?;
                    }
                    _ => {
                        let action = app.handle_event(event);
                        if !matches!(action, Action::None) {
                            action_tx.send(action).ok();
                        }
                    }
                }
            }
            Some(action) = action_rx.recv() => {
                if let Some(command) = app.update(action) {
                    dispatcher.dispatch(command);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    info!("quitting");
    Ok(())
}
