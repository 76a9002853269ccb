//! Endpoint client port
//!
//! Defines the interface for issuing one inference request to an agent's
//! configured backend. Retry/backoff policy is the adapter's concern: by
//! the time an error surfaces through this port, transient failures have
//! already been retried to exhaustion.

use async_trait::async_trait;
use taskforce_domain::{AgentIdentity, FailureKind, Turn};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Errors that can occur during an endpoint call
#[derive(Error, Debug)]
pub enum EndpointError {
    /// Transport-level failure (connection refused, timeout). Transient:
    /// absorbed by the adapter's retry policy and only seen here from a
    /// single-attempt primitive.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Backend answered with a retryable status (5xx, 429). Transient.
    #[error("Endpoint returned status {0}")]
    UpstreamStatus(u16),

    /// Transient retries exhausted.
    #[error("Endpoint unreachable after {attempts} attempts: {last}")]
    Unreachable { attempts: u32, last: String },

    /// Backend rejected authentication (401/403). Never retried.
    #[error("Authentication rejected by endpoint")]
    AuthRejected,

    /// Backend rejected the request as invalid (other 4xx). Never retried.
    #[error("Request rejected: {0}")]
    InvalidRequest(String),

    /// Backend reply could not be parsed into the expected shape. Never
    /// retried.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// No endpoint configured for this agent.
    #[error("No endpoint configured for agent {0}")]
    UnknownAgent(AgentIdentity),

    #[error("Message must not be empty")]
    EmptyMessage,

    /// Caller-initiated cancellation aborted the call.
    #[error("Request cancelled")]
    Cancelled,
}

impl EndpointError {
    /// Whether this error class is expected to resolve with retry.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            EndpointError::Transport(_) | EndpointError::UpstreamStatus(_)
        )
    }

    /// The task-level error class this endpoint error is reported under.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            EndpointError::Unreachable { .. }
            | EndpointError::Transport(_)
            | EndpointError::UpstreamStatus(_) => FailureKind::EndpointUnreachable,
            EndpointError::AuthRejected => FailureKind::AuthRejected,
            EndpointError::MalformedResponse(_) => FailureKind::MalformedResponse,
            EndpointError::InvalidRequest(_)
            | EndpointError::UnknownAgent(_)
            | EndpointError::EmptyMessage => FailureKind::InvalidRequest,
            EndpointError::Cancelled => FailureKind::Cancelled,
        }
    }
}

/// Token accounting reported by the backend, when available
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UsageMetadata {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Successful reply from one endpoint call
///
/// Attributable to exactly one request: adapters never reuse a response
/// across retry attempts.
#[derive(Debug, Clone)]
pub struct EndpointReply {
    pub text: String,
    pub usage: Option<UsageMetadata>,
}

impl EndpointReply {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Client for agent inference endpoints
///
/// One call serializes the session snapshot plus the new message into the
/// backend's wire format and resolves to a single reply. The client never
/// mutates sessions — appending turns on success is the caller's job.
#[async_trait]
pub trait EndpointClient: Send + Sync {
    /// Send `message` to `identity`'s endpoint with `turns` as the
    /// conversation context, in order.
    ///
    /// `cancel` aborts any remaining retry attempts mid-call.
    async fn send(
        &self,
        identity: AgentIdentity,
        turns: &[Turn],
        message: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<EndpointReply, EndpointError>;

    /// Cheap reachability probe against `identity`'s configured endpoint.
    async fn probe(&self, identity: AgentIdentity) -> Result<(), EndpointError>;
}
