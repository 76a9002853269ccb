//! Task decomposition use case.
//!
//! Sends the decomposition prompt through the PM's own session and parses
//! the reply into an ordered subtask sequence. A reply that does not
//! contain at least one valid subtask fails the whole task before any
//! worker is contacted.

use crate::ports::endpoint_client::{EndpointClient, EndpointError};
use crate::sessions::SessionStore;
use crate::use_cases::shared::exchange;
use std::sync::Arc;
use taskforce_domain::{AgentIdentity, PromptTemplate, Subtask, parse_subtasks};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Errors from the decomposition round-trip
#[derive(Error, Debug)]
pub enum DecomposeError {
    /// The PM replied, but the reply did not contain a parsable subtask
    /// sequence.
    #[error("PM reply did not contain a parsable subtask sequence")]
    Unparseable,

    /// The PM call itself failed.
    #[error(transparent)]
    Endpoint(#[from] EndpointError),
}

/// Use case: decompose a task into an ordered subtask sequence via the PM.
pub struct DecomposeTaskUseCase {
    client: Arc<dyn EndpointClient>,
    sessions: Arc<SessionStore>,
}

impl DecomposeTaskUseCase {
    pub fn new(client: Arc<dyn EndpointClient>, sessions: Arc<SessionStore>) -> Self {
        Self { client, sessions }
    }

    /// Ask the PM to decompose `task_text`.
    ///
    /// The exchange goes through the PM's session like any other agent
    /// call, so the PM keeps conversational context across tasks.
    pub async fn execute(
        &self,
        task_text: &str,
        cancel: &Option<CancellationToken>,
    ) -> Result<Vec<Subtask>, DecomposeError> {
        let prompt = PromptTemplate::decomposition_request(task_text);
        let reply = exchange(
            self.client.as_ref(),
            &self.sessions,
            AgentIdentity::Pm,
            &prompt,
            cancel,
        )
        .await?;

        let subtasks = parse_subtasks(&reply).ok_or(DecomposeError::Unparseable)?;
        debug!(count = subtasks.len(), "Task decomposed");
        Ok(subtasks)
    }
}
