use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

pub const DATABASE_URL_ENV: &str = "TOKENTUI_DATABASE_URL";
pub const DEBUG_ENV: &str = "DEBUG";

const DEFAULT_SEED_USERS: [&str; 2] = ["john@gmail.com", "ana2@yahoo.com"];

/// Contents of `config.toml`. Every field is optional.
#[derive(Debug, Clone, Deserialize, Default)]
struct FileConfig {
    database_url: Option<String>,
    connect_timeout_secs: Option<u64>,
    fetch_delay_ms: Option<u64>,
    log_file: Option<PathBuf>,
    seed_users: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Empty means the store's built-in default
    pub database_url: String,
    pub connect_timeout: Duration,
    pub fetch_delay: Duration,
    pub debug: bool,
    pub log_file: PathBuf,
    pub seed_users: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            connect_timeout: Duration::from_secs(5),
            fetch_delay: Duration::from_secs(2),
            debug: false,
            log_file: PathBuf::from("debug.log"),
            seed_users: DEFAULT_SEED_USERS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

fn config_path() -> Option<PathBuf> {
    let config_dir = dirs::config_dir()?;
    Some(config_dir.join("tokentui").join("config.toml"))
}

impl Config {
    /// Config file (if any) overlaid with the process environment.
    pub fn load() -> Self {
        let content = config_path().and_then(|path| std::fs::read_to_string(path).ok());
        let config = content
            .as_deref()
            .map(Config::from_toml_str)
            .unwrap_or_default();
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Parse a config file. Malformed input falls back to defaults.
    pub fn from_toml_str(content: &str) -> Self {
        let Ok(file) = toml::from_str::<FileConfig>(content) else {
            return Config::default();
        };

        let mut config = Config::default();
        if let Some(url) = file.database_url {
            config.database_url = url;
        }
        if let Some(secs) = file.connect_timeout_secs {
            config.connect_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = file.fetch_delay_ms {
            config.fetch_delay = Duration::from_millis(ms);
        }
        if let Some(path) = file.log_file {
            config.log_file = path;
        }
        if let Some(seeds) = file.seed_users {
            config.seed_users = seeds;
        }
        config
    }

    /// Apply environment overrides; `lookup` returns the variable's value if set.
    pub fn with_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(DATABASE_URL_ENV).filter(|v| !v.is_empty()) {
            self.database_url = url;
        }
        self.debug = lookup(DEBUG_ENV).is_some_and(|v| !v.is_empty());
        self
    }
}
