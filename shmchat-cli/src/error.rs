//! CLI error type.

use thiserror::Error;

use shmchat_core::{ChatError, HardValidationError};

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Chat(#[from] ChatError),

    #[error("Invalid option: {0}")]
    InvalidOption(#[from] HardValidationError),

    #[error("Failed to write report: {0}")]
    Report(#[from] serde_json::Error),
}
