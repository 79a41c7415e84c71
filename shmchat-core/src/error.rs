//! Custom error types for shmchat.
//!
//! Explicit enum error types only. No `Box<dyn Error>`, no `anyhow::Result`.
//! Only startup failures (config, shared memory) cross into the CLI; envelope
//! problems are absorbed by the session loop.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type for shmchat.
#[derive(Debug, Error)]
pub enum ChatError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Shared Memory Errors - Fatal, never retried
    // =========================================================================
    #[error("Shared memory error: {0}")]
    SharedMemory(#[from] SharedMemoryError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors stop the program before any region is mapped.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Both participants use the same name: {name}")]
    DuplicateParticipantName { name: String },
}

/// Shared memory errors.
#[derive(Debug, Error)]
pub enum SharedMemoryError {
    #[error("Failed to create shared memory region: {name} - {reason}")]
    CreateFailed { name: String, reason: String },

    #[error("Shared memory region already exists: {name}")]
    AlreadyExists { name: String },

    #[error("Failed to open shared memory region: {name} - {reason}")]
    OpenFailed { name: String, reason: String },

    #[error("Failed to map shared memory: {reason}")]
    MapFailed { reason: String },

    #[error("Payload size exceeds maximum: {size} > {max}")]
    PayloadTooLarge { size: usize, max: usize },
}

/// Envelope parse failures. Recovered locally as "no message".
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    #[error("Envelope has no ':' delimiter")]
    MissingDelimiter,

    #[error("Envelope content starts past the end: colon at char {colon}, {len} chars total")]
    ContentOutOfRange { colon: usize, len: usize },
}

/// Result type alias using ChatError.
pub type ChatResult<T> = Result<T, ChatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hard_validation_error_display() {
        let err = HardValidationError::InvalidFieldValue {
            field: "participant_name",
            value: "a:b".to_string(),
            reason: "Participant name must not contain ':'".to_string(),
        };
        assert!(err.to_string().contains("participant_name"));
        assert!(err.to_string().contains("a:b"));
    }

    #[test]
    fn test_error_chain() {
        let shm_err = SharedMemoryError::MapFailed {
            reason: "mmap failed".to_string(),
        };
        let chat_err: ChatError = shm_err.into();
        assert!(matches!(chat_err, ChatError::SharedMemory(_)));
        assert!(chat_err.to_string().contains("mmap failed"));
    }
}
