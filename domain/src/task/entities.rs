//! Task domain entities
//!
//! A task run moves through an explicit phase sequence:
//! `Idle → Decomposing → Dispatching(i) → Completed | Failed`. Terminal
//! phases are final for that task instance; a new task starts over at
//! `Idle`.

use crate::agent::AgentIdentity;
use crate::task::value_objects::TaskId;
use serde::{Deserialize, Serialize};

/// One unit of decomposed work (Entity)
///
/// Produced once by decomposition, consumed in strict ordinal order.
/// Never mutated after creation — carried-forward context is attached when
/// the subtask is consumed, via [`Subtask::with_context`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    /// 1-based position in the dispatch sequence; strictly increasing
    /// with no gaps.
    pub ordinal: u32,
    /// The worker this subtask is assigned to.
    pub assignee: AgentIdentity,
    /// Instruction text produced by the PM.
    pub instruction: String,
    /// Output of the previous subtask, carried forward as context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Subtask {
    pub fn new(ordinal: u32, assignee: AgentIdentity, instruction: impl Into<String>) -> Self {
        Self {
            ordinal,
            assignee,
            instruction: instruction.into(),
            context: None,
        }
    }

    /// Attach carried-forward context from the prior subtask's output.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

/// Phase of a task run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Idle,
    Decomposing,
    /// Dispatching the subtask with this ordinal.
    Dispatching(u32),
    Completed,
    Failed,
}

impl TaskPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskPhase::Idle => "idle",
            TaskPhase::Decomposing => "decomposing",
            TaskPhase::Dispatching(_) => "dispatching",
            TaskPhase::Completed => "completed",
            TaskPhase::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskPhase::Completed | TaskPhase::Failed)
    }
}

impl std::fmt::Display for TaskPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskPhase::Dispatching(ordinal) => write!(f, "dispatching({})", ordinal),
            other => write!(f, "{}", other.as_str()),
        }
    }
}

/// Error classes a task-level failure is reported under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// PM output could not be parsed into at least one subtask.
    DecompositionFailed,
    /// Transport retries exhausted.
    EndpointUnreachable,
    /// Backend rejected authentication; never retried.
    AuthRejected,
    /// Backend reply could not be parsed; never retried.
    MalformedResponse,
    /// Backend rejected the request as invalid.
    InvalidRequest,
    /// Caller-initiated cancellation.
    Cancelled,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::DecompositionFailed => "decomposition_failed",
            FailureKind::EndpointUnreachable => "endpoint_unreachable",
            FailureKind::AuthRejected => "auth_rejected",
            FailureKind::MalformedResponse => "malformed_response",
            FailureKind::InvalidRequest => "invalid_request",
            FailureKind::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why and where a task failed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Ordinal of the failing subtask; `None` when the task failed before
    /// any dispatch (decomposition).
    pub ordinal: Option<u32>,
    pub kind: FailureKind,
    pub message: String,
}

impl TaskFailure {
    pub fn new(ordinal: Option<u32>, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            ordinal,
            kind,
            message: message.into(),
        }
    }
}

/// Final status of a task run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskStatus {
    Completed,
    Failed(TaskFailure),
}

/// Output of one dispatched subtask
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubtaskRecord {
    pub ordinal: u32,
    pub agent: AgentIdentity,
    pub instruction: String,
    pub output: String,
}

/// Terminal artifact of a task run (Entity)
///
/// Aggregates all subtask outputs in ordinal order plus the overall
/// status. On failure, `outputs` holds the records completed before the
/// failing ordinal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: TaskId,
    #[serde(flatten)]
    pub status: TaskStatus,
    pub outputs: Vec<SubtaskRecord>,
}

impl TaskResult {
    pub fn completed(id: TaskId, outputs: Vec<SubtaskRecord>) -> Self {
        Self {
            id,
            status: TaskStatus::Completed,
            outputs,
        }
    }

    pub fn failed(id: TaskId, outputs: Vec<SubtaskRecord>, failure: TaskFailure) -> Self {
        Self {
            id,
            status: TaskStatus::Failed(failure),
            outputs,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.status, TaskStatus::Completed)
    }

    pub fn failure(&self) -> Option<&TaskFailure> {
        match &self.status {
            TaskStatus::Failed(failure) => Some(failure),
            TaskStatus::Completed => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_display() {
        assert_eq!(TaskPhase::Decomposing.to_string(), "decomposing");
        assert_eq!(TaskPhase::Dispatching(2).to_string(), "dispatching(2)");
        assert!(TaskPhase::Completed.is_terminal());
        assert!(!TaskPhase::Idle.is_terminal());
    }

    #[test]
    fn test_subtask_context_attachment() {
        let subtask = Subtask::new(2, AgentIdentity::WorkerB, "review the haiku");
        assert!(subtask.context.is_none());

        let with_context = subtask.with_context("an autumn haiku");
        assert_eq!(with_context.context.as_deref(), Some("an autumn haiku"));
        assert_eq!(with_context.ordinal, 2);
    }

    #[test]
    fn test_failed_result_carries_ordinal_and_kind() {
        let result = TaskResult::failed(
            TaskId::new("task-9"),
            vec![],
            TaskFailure::new(Some(2), FailureKind::EndpointUnreachable, "gave up"),
        );
        assert!(!result.is_completed());
        let failure = result.failure().unwrap();
        assert_eq!(failure.ordinal, Some(2));
        assert_eq!(failure.kind, FailureKind::EndpointUnreachable);
    }

    #[test]
    fn test_result_serializes_status_tag() {
        let result = TaskResult::completed(TaskId::new("task-1"), vec![]);
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["status"], "completed");
    }
}
