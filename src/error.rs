//! Error types for tabrecon operations

use thiserror::Error;

pub type Result<T> = std::result::Result<T, TabreconError>;

#[derive(Error, Debug)]
pub enum TabreconError {
    #[error("{side} table has no columns")]
    NoColumns { side: String },

    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl TabreconError {
    pub fn no_columns(side: impl Into<String>) -> Self {
        Self::NoColumns { side: side.into() }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }
}
