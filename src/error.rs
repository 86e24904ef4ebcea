use std::io;
use std::result;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid base observation {0}: expected a value in [0, 4)")]
    InvalidBase(u8),
    #[error("{0}")]
    Config(String),
    #[error("unsupported layout: {0}")]
    UnsupportedLayout(String),
    #[error("line {line}: {msg}")]
    Parse { line: u64, msg: String },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("plot config error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("plot error: {0}")]
    Plot(String),
}

impl Error {
    pub fn config<S: Into<String>>(msg: S) -> Error {
        Error::Config(msg.into())
    }
}

pub type Result<T> = result::Result<T, Error>;
