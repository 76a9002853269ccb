//! Task value objects

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_TASK: AtomicU64 = AtomicU64::new(1);

/// Identifier for a single task run (Value Object)
///
/// Process-local and monotonic; task history is not persisted, so global
/// uniqueness is not required.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Allocate the next sequential task id.
    pub fn next() -> Self {
        let n = NEXT_TASK.fetch_add(1, Ordering::Relaxed);
        Self(format!("task-{}", n))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TaskId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
