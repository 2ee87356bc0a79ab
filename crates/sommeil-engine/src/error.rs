//! Error types for sommeil-engine operations.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid time: {0}")]
    InvalidTime(String),

    #[error("Invalid shift window: {0}")]
    InvalidShiftWindow(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
