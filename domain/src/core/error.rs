//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Unknown agent identity: {0}")]
    UnknownAgent(String),

    #[error("Message must not be empty")]
    EmptyMessage,

    #[error("Subtask instruction must not be empty")]
    EmptyInstruction,
}
