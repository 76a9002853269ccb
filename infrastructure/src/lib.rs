//! Infrastructure layer for taskforce
//!
//! This crate contains adapters that implement the ports defined in the
//! application layer: the retrying HTTP endpoint client, configuration
//! file loading and the JSONL transcript logger.

pub mod config;
pub mod http;
pub mod logging;

// Re-export commonly used types
pub use config::{
    ConfigError, ConfigLoader, FileAgentConfig, FileCarryConfig, FileConfig, FileServerConfig,
};
pub use http::{
    client::{AgentEndpoint, HttpEndpointClient},
    retry::RetryPolicy,
};
pub use logging::JsonlTranscriptLogger;
