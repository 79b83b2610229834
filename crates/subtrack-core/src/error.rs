//! Error types for subtrack

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Database pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Input rejected at the boundary; fixable by resubmitting
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    /// Calendar arithmetic left the range chrono can represent
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    /// Money arithmetic exceeded the decimal range
    #[error("Amount out of range: {0}")]
    AmountOutOfRange(String),
}

impl Error {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn subscription_not_found(id: i64) -> Self {
        Self::NotFound(format!("Subscription {} not found", id))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
