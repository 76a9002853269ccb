//! Application-level execution knobs

use serde::{Deserialize, Serialize};

/// Default cap for truncated carry-forward context.
pub const DEFAULT_CARRY_CHARS: usize = 2000;

/// Policy for how much of a prior subtask's output is carried forward as
/// context into the next subtask's instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CarryMode {
    /// Carry the full response text.
    Full,
    /// Carry at most `max_chars` characters of the response.
    Truncate { max_chars: usize },
    /// Carry nothing; subtasks are dispatched with their bare instruction.
    Off,
}

impl Default for CarryMode {
    fn default() -> Self {
        CarryMode::Truncate {
            max_chars: DEFAULT_CARRY_CHARS,
        }
    }
}

impl CarryMode {
    /// Apply the policy to a subtask output, returning the context to
    /// carry into the next instruction (or `None` when disabled).
    pub fn apply(&self, output: &str) -> Option<String> {
        match self {
            CarryMode::Full => Some(output.to_string()),
            CarryMode::Truncate { max_chars } => {
                let mut carried: String = output.chars().take(*max_chars).collect();
                if carried.len() < output.len() {
                    carried.push_str("\n[...truncated]");
                }
                Some(carried)
            }
            CarryMode::Off => None,
        }
    }
}
