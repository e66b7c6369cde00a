use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("store error: {0}")]
    Store(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("token error: {0}")]
    Token(String),

    #[error("failed setting the debug log file {}: {source}", .path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Store(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
