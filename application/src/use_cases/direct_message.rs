//! Direct-addressing bypass.
//!
//! Lets a caller target one worker directly, skipping decomposition: a
//! single exchange against that worker's session with no forward-context
//! chaining. The result is still a structured [`TaskResult`] so callers
//! and the transcript log see the same shape as a full task run.

use crate::ports::endpoint_client::EndpointClient;
use crate::ports::transcript_logger::{TranscriptEvent, TranscriptLogger};
use crate::sessions::SessionStore;
use crate::use_cases::shared::exchange;
use std::sync::Arc;
use taskforce_domain::{
    AgentIdentity, FailureKind, SubtaskRecord, TaskFailure, TaskId, TaskResult,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Use case for sending one message straight to a named worker.
pub struct DirectMessageUseCase {
    client: Arc<dyn EndpointClient>,
    sessions: Arc<SessionStore>,
    transcript: Arc<dyn TranscriptLogger>,
}

impl DirectMessageUseCase {
    pub fn new(
        client: Arc<dyn EndpointClient>,
        sessions: Arc<SessionStore>,
        transcript: Arc<dyn TranscriptLogger>,
    ) -> Self {
        Self {
            client,
            sessions,
            transcript,
        }
    }

    /// Send `message` to `target` and return a single-subtask result.
    pub async fn execute(
        &self,
        target: AgentIdentity,
        message: &str,
        cancel: Option<CancellationToken>,
    ) -> TaskResult {
        let task_id = TaskId::next();

        if !target.is_worker() {
            let failure = TaskFailure::new(
                Some(1),
                FailureKind::InvalidRequest,
                format!("direct addressing requires a worker, got {}", target),
            );
            return TaskResult::failed(task_id, Vec::new(), failure);
        }

        debug!(task = %task_id, agent = %target, "Direct dispatch");

        match exchange(
            self.client.as_ref(),
            &self.sessions,
            target,
            message,
            &cancel,
        )
        .await
        {
            Ok(output) => {
                self.transcript.log(TranscriptEvent::new(
                    "subtask",
                    serde_json::json!({
                        "task_id": task_id.as_str(),
                        "ordinal": 1,
                        "agent": target,
                        "request": message,
                        "response": &output,
                    }),
                ));
                let record = SubtaskRecord {
                    ordinal: 1,
                    agent: target,
                    instruction: message.to_string(),
                    output,
                };
                TaskResult::completed(task_id, vec![record])
            }
            Err(error) => {
                self.transcript.log(TranscriptEvent::new(
                    "subtask",
                    serde_json::json!({
                        "task_id": task_id.as_str(),
                        "ordinal": 1,
                        "agent": target,
                        "request": message,
                        "error": error.to_string(),
                        "kind": error.failure_kind(),
                    }),
                ));
                let failure =
                    TaskFailure::new(Some(1), error.failure_kind(), error.to_string());
                TaskResult::failed(task_id, Vec::new(), failure)
            }
        }
    }
}
