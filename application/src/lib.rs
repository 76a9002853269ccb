//! Application layer for taskforce
//!
//! This crate contains use cases, port definitions, the session store and
//! application configuration. It depends only on the domain layer.

pub mod config;
pub mod ports;
pub mod sessions;
pub mod use_cases;

// Re-export commonly used types
pub use config::CarryMode;
pub use ports::{
    endpoint_client::{EndpointClient, EndpointError, EndpointReply, UsageMetadata},
    transcript_logger::{NoTranscriptLogger, TranscriptEvent, TranscriptLogger},
};
pub use sessions::SessionStore;
pub use use_cases::{
    decompose::{DecomposeError, DecomposeTaskUseCase},
    direct_message::DirectMessageUseCase,
    run_task::RunTaskUseCase,
};
