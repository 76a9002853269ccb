//! Run Task use case — the orchestration loop.
//!
//! Drives a task through the phase sequence
//! `Idle → Decomposing → Dispatching(i) → Completed | Failed`: one
//! decomposition call to the PM, then strictly sequential dispatch of
//! each subtask to its assigned worker, feeding each response forward as
//! context for the next instruction.
//!
//! Failure semantics: transport-level transient errors are absorbed by
//! the endpoint client's retry policy; whatever surfaces here halts the
//! loop at the current ordinal. There is no cross-subtask retry and no
//! silent skip — callers always get a structured result.

use crate::config::CarryMode;
use crate::ports::endpoint_client::EndpointClient;
use crate::ports::transcript_logger::{TranscriptEvent, TranscriptLogger};
use crate::sessions::SessionStore;
use crate::use_cases::decompose::{DecomposeError, DecomposeTaskUseCase};
use crate::use_cases::shared::{check_cancelled, exchange};
use std::sync::Arc;
use taskforce_domain::{
    FailureKind, PromptTemplate, Subtask, SubtaskRecord, TaskFailure, TaskId, TaskPhase,
    TaskResult,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Use case for running one task end-to-end: decomposition plus the
/// sequential dispatch loop.
pub struct RunTaskUseCase {
    client: Arc<dyn EndpointClient>,
    sessions: Arc<SessionStore>,
    transcript: Arc<dyn TranscriptLogger>,
    decomposer: DecomposeTaskUseCase,
    carry: CarryMode,
}

impl RunTaskUseCase {
    pub fn new(
        client: Arc<dyn EndpointClient>,
        sessions: Arc<SessionStore>,
        transcript: Arc<dyn TranscriptLogger>,
        carry: CarryMode,
    ) -> Self {
        let decomposer = DecomposeTaskUseCase::new(client.clone(), sessions.clone());
        Self {
            client,
            sessions,
            transcript,
            decomposer,
            carry,
        }
    }

    /// Run `task_text` to a terminal state.
    ///
    /// Cancellation is checked before every dispatch; mid-call
    /// cancellation aborts the endpoint client's remaining retry
    /// attempts. Terminal states are final — a new task starts over.
    pub async fn execute(
        &self,
        task_text: &str,
        cancel: Option<CancellationToken>,
    ) -> TaskResult {
        let task_id = TaskId::next();
        let mut phase = TaskPhase::Idle;
        info!(task = %task_id, phase = %phase, "Task received");

        phase = TaskPhase::Decomposing;
        debug!(task = %task_id, phase = %phase, "Decomposing task");
        let subtasks = match self.decomposer.execute(task_text, &cancel).await {
            Ok(subtasks) => subtasks,
            Err(error) => {
                let failure = decompose_failure(&error);
                return self.fail(task_id, Vec::new(), failure);
            }
        };

        let mut outputs: Vec<SubtaskRecord> = Vec::with_capacity(subtasks.len());
        let mut carried: Option<String> = None;

        for subtask in subtasks {
            if check_cancelled(&cancel).is_err() {
                let failure = TaskFailure::new(
                    Some(subtask.ordinal),
                    FailureKind::Cancelled,
                    "task cancelled before dispatch",
                );
                return self.fail(task_id, outputs, failure);
            }

            phase = TaskPhase::Dispatching(subtask.ordinal);
            debug!(task = %task_id, phase = %phase, agent = %subtask.assignee, "Dispatching subtask");

            let subtask = match carried.take() {
                Some(context) => subtask.with_context(context),
                None => subtask,
            };
            let instruction = dispatch_instruction(&subtask);

            match exchange(
                self.client.as_ref(),
                &self.sessions,
                subtask.assignee,
                &instruction,
                &cancel,
            )
            .await
            {
                Ok(output) => {
                    self.transcript.log(TranscriptEvent::new(
                        "subtask",
                        serde_json::json!({
                            "task_id": task_id.as_str(),
                            "ordinal": subtask.ordinal,
                            "agent": subtask.assignee,
                            "request": &instruction,
                            "response": &output,
                        }),
                    ));
                    carried = self.carry.apply(&output);
                    outputs.push(SubtaskRecord {
                        ordinal: subtask.ordinal,
                        agent: subtask.assignee,
                        instruction,
                        output,
                    });
                }
                Err(error) => {
                    warn!(
                        task = %task_id,
                        ordinal = subtask.ordinal,
                        agent = %subtask.assignee,
                        %error,
                        "Subtask dispatch failed"
                    );
                    self.transcript.log(TranscriptEvent::new(
                        "subtask",
                        serde_json::json!({
                            "task_id": task_id.as_str(),
                            "ordinal": subtask.ordinal,
                            "agent": subtask.assignee,
                            "request": &instruction,
                            "error": error.to_string(),
                            "kind": error.failure_kind(),
                        }),
                    ));
                    let failure = TaskFailure::new(
                        Some(subtask.ordinal),
                        error.failure_kind(),
                        error.to_string(),
                    );
                    return self.fail(task_id, outputs, failure);
                }
            }
        }

        phase = TaskPhase::Completed;
        info!(task = %task_id, phase = %phase, subtasks = outputs.len(), "Task completed");
        self.transcript.log(TranscriptEvent::new(
            "task",
            serde_json::json!({
                "task_id": task_id.as_str(),
                "status": "completed",
                "subtasks": outputs.len(),
            }),
        ));
        TaskResult::completed(task_id, outputs)
    }

    fn fail(
        &self,
        task_id: TaskId,
        outputs: Vec<SubtaskRecord>,
        failure: TaskFailure,
    ) -> TaskResult {
        warn!(
            task = %task_id,
            phase = %TaskPhase::Failed,
            kind = %failure.kind,
            "Task failed"
        );
        self.transcript.log(TranscriptEvent::new(
            "task",
            serde_json::json!({
                "task_id": task_id.as_str(),
                "status": "failed",
                "ordinal": failure.ordinal,
                "kind": failure.kind,
                "error": failure.message,
            }),
        ));
        TaskResult::failed(task_id, outputs, failure)
    }
}

/// Final instruction text for a subtask, with carried context applied.
fn dispatch_instruction(subtask: &Subtask) -> String {
    match &subtask.context {
        Some(context) => PromptTemplate::carried_context(&subtask.instruction, context),
        None => subtask.instruction.clone(),
    }
}

fn decompose_failure(error: &DecomposeError) -> TaskFailure {
    match error {
        DecomposeError::Unparseable => TaskFailure::new(
            None,
            FailureKind::DecompositionFailed,
            error.to_string(),
        ),
        DecomposeError::Endpoint(endpoint_error) => TaskFailure::new(
            None,
            endpoint_error.failure_kind(),
            endpoint_error.to_string(),
        ),
    }
}
