//! Subtask parsing from PM responses.
//!
//! Extracts an ordered [`Subtask`] sequence from the PM's decomposition
//! reply — either a ` ```tasks` fenced code block containing JSON, or a
//! reply that is raw JSON in its entirety.
//!
//! Parsing is all-or-nothing: a reply with zero subtasks, a subtask with a
//! missing or non-worker assignee, or an empty instruction invalidates the
//! whole decomposition. Partial decompositions are never executed.

use crate::agent::AgentIdentity;
use crate::task::entities::Subtask;

/// Parse subtasks from a PM response.
///
/// Supports two formats:
/// 1. ` ```tasks` fenced code blocks containing JSON
/// 2. Raw JSON (the entire reply is valid JSON)
///
/// Returns `None` if no valid subtask sequence is found.
pub fn parse_subtasks(reply: &str) -> Option<Vec<Subtask>> {
    // Look for ```tasks ... ``` blocks
    let mut in_tasks_block = false;
    let mut current_block = String::new();

    for line in reply.lines() {
        if line.trim() == "```tasks" {
            in_tasks_block = true;
            current_block.clear();
        } else if in_tasks_block && line.trim() == "```" {
            in_tasks_block = false;
            if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(&current_block) {
                return parse_subtasks_json(&parsed);
            }
        } else if in_tasks_block {
            current_block.push_str(line);
            current_block.push('\n');
        }
    }

    // Try parsing the entire reply as JSON
    if let Ok(parsed) = serde_json::from_str::<serde_json::Value>(reply) {
        return parse_subtasks_json(&parsed);
    }

    None
}

/// Parse subtasks from a JSON value.
///
/// Expected schema:
/// ```json
/// {
///   "subtasks": [
///     {"ordinal": 1, "assignee": "A", "instruction": "write a haiku"},
///     {"ordinal": 2, "assignee": "B", "instruction": "review the haiku"}
///   ]
/// }
/// ```
///
/// Ordinals are normalized to array order (1..N) regardless of what the
/// model emitted, so the sequence is always strictly increasing with no
/// gaps. The `assignee` must name a worker — the PM cannot assign work to
/// itself. `instruction` also accepts a `description` alias.
pub fn parse_subtasks_json(json: &serde_json::Value) -> Option<Vec<Subtask>> {
    let entries = json.get("subtasks").and_then(|v| v.as_array())?;

    if entries.is_empty() {
        return None;
    }

    let mut subtasks = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let assignee: AgentIdentity = entry
            .get("assignee")
            .or_else(|| entry.get("target"))
            .and_then(|v| v.as_str())?
            .parse()
            .ok()?;
        if !assignee.is_worker() {
            return None;
        }

        let instruction = entry
            .get("instruction")
            .or_else(|| entry.get("description"))
            .and_then(|v| v.as_str())?
            .trim();
        if instruction.is_empty() {
            return None;
        }

        subtasks.push(Subtask::new(index as u32 + 1, assignee, instruction));
    }

    Some(subtasks)
}
