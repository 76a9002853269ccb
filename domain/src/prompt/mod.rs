//! Prompt templates for the PM/worker flow

/// Templates for the prompts exchanged with the PM and workers
pub struct PromptTemplate;

impl PromptTemplate {
    /// System prompt for the PM's decomposition call
    pub fn decomposition_system() -> &'static str {
        r#"You are a project manager coordinating three workers named A, B and C.
Your job is to break an incoming task into a short, ordered sequence of subtasks,
assigning each subtask to exactly one worker. Workers are interchangeable and
handle one subtask at a time; later subtasks may build on earlier results."#
    }

    /// User prompt asking the PM to decompose a task
    pub fn decomposition_request(task: &str) -> String {
        format!(
            r#"Break the following task into ordered subtasks for workers A, B and C:

{}

Answer with a ```tasks code block containing JSON of this exact shape:

```tasks
{{"subtasks": [
  {{"ordinal": 1, "assignee": "A", "instruction": "..."}},
  {{"ordinal": 2, "assignee": "B", "instruction": "..."}}
]}}
```

Use only "A", "B" or "C" as assignee. Keep instructions self-contained."#,
            task
        )
    }

    /// Instruction for a dispatched subtask, with prior output carried
    /// forward as context.
    pub fn carried_context(instruction: &str, previous_output: &str) -> String {
        format!(
            "{}\n\n--- Result of the previous subtask ---\n{}",
            instruction, previous_output
        )
    }

    /// System nudge appended when an agent returns an empty reply.
    pub fn empty_reply_nudge() -> &'static str {
        "The previous reply was empty or off-topic. Provide a concise self-summary of the intended answer."
    }
}
