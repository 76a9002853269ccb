//! HTTP endpoint adapter
//!
//! Implements the [`EndpointClient`] port against OpenAI-compatible
//! chat-completion backends: one POST per attempt, wrapped in an
//! exponential-backoff retry policy.
//!
//! [`EndpointClient`]: taskforce_application::EndpointClient

pub mod client;
pub mod protocol;
pub mod retry;
