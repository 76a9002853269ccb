//! Ports (interfaces) for the application layer
//!
//! These traits define how the application layer communicates with
//! external systems. Implementations (adapters) live in the
//! infrastructure layer.

pub mod endpoint_client;
pub mod transcript_logger;
