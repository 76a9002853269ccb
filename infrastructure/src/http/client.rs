//! Retrying HTTP endpoint client.
//!
//! Adapter for the [`EndpointClient`] port: resolves the agent's
//! configured backend, issues one POST per attempt and applies the
//! [`RetryPolicy`] around the single-attempt primitive. Status mapping:
//!
//! - connect errors / timeouts → transient
//! - 429 and 5xx → transient
//! - 401 / 403 → `AuthRejected`, no retry
//! - other 4xx → `InvalidRequest`, no retry
//! - unparseable body → `MalformedResponse`, no retry

use crate::http::protocol::{build_request, parse_reply};
use crate::http::retry::RetryPolicy;
use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::time::Duration;
use taskforce_application::{EndpointClient, EndpointError, EndpointReply};
use taskforce_domain::{AgentIdentity, Turn};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Timeout for reachability probes.
const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolved backend configuration for one agent.
#[derive(Debug, Clone)]
pub struct AgentEndpoint {
    /// Chat-completions URL.
    pub url: String,
    /// Model name sent in the request body.
    pub model: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Bearer token attached when the backend requires authentication.
    pub bearer_token: Option<String>,
}

/// HTTP adapter for agent inference endpoints.
pub struct HttpEndpointClient {
    http: reqwest::Client,
    endpoints: HashMap<AgentIdentity, AgentEndpoint>,
    retry: RetryPolicy,
}

impl HttpEndpointClient {
    pub fn new(endpoints: HashMap<AgentIdentity, AgentEndpoint>, retry: RetryPolicy) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoints,
            retry,
        }
    }

    fn endpoint(&self, identity: AgentIdentity) -> Result<&AgentEndpoint, EndpointError> {
        self.endpoints
            .get(&identity)
            .ok_or(EndpointError::UnknownAgent(identity))
    }

    /// One attempt: POST, classify the status, parse the body.
    async fn attempt(
        &self,
        endpoint: &AgentEndpoint,
        body: &serde_json::Value,
    ) -> Result<EndpointReply, EndpointError> {
        let mut request = self
            .http
            .post(&endpoint.url)
            .timeout(endpoint.timeout)
            .json(body);
        if let Some(token) = &endpoint.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(classify_request_error)?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EndpointError::AuthRejected);
        }
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Err(EndpointError::UpstreamStatus(status.as_u16()));
        }
        if !status.is_success() {
            return Err(EndpointError::InvalidRequest(format!(
                "endpoint returned status {}",
                status.as_u16()
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| EndpointError::MalformedResponse(e.to_string()))?;
        let (text, usage) = parse_reply(&json).map_err(EndpointError::MalformedResponse)?;
        Ok(EndpointReply { text, usage })
    }
}

fn classify_request_error(error: reqwest::Error) -> EndpointError {
    // Connect failures and timeouts are the transient class; anything
    // else at this stage is still a transport-level failure.
    EndpointError::Transport(error.to_string())
}

#[async_trait]
impl EndpointClient for HttpEndpointClient {
    async fn send(
        &self,
        identity: AgentIdentity,
        turns: &[Turn],
        message: &str,
        cancel: Option<&CancellationToken>,
    ) -> Result<EndpointReply, EndpointError> {
        if message.trim().is_empty() {
            return Err(EndpointError::EmptyMessage);
        }
        let endpoint = self.endpoint(identity)?;

        let request = build_request(&endpoint.model, turns, message);
        let body = serde_json::to_value(&request)
            .map_err(|e| EndpointError::InvalidRequest(e.to_string()))?;

        debug!(agent = %identity, url = %endpoint.url, turns = turns.len(), "Dispatching request");

        // Each retry serializes the same snapshot into a fresh request.
        self.retry
            .run(cancel, || self.attempt(endpoint, &body))
            .await
    }

    async fn probe(&self, identity: AgentIdentity) -> Result<(), EndpointError> {
        let endpoint = self.endpoint(identity)?;
        // Any HTTP answer proves reachability — completion paths commonly
        // reject GET with 4xx, which is still a live server.
        self.http
            .get(&endpoint.url)
            .timeout(PROBE_TIMEOUT)
            .send()
            .await
            .map_err(classify_request_error)?;
        Ok(())
    }
}
