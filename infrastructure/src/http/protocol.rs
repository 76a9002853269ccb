//! Wire types for OpenAI-compatible chat-completion backends.
//!
//! The request body is the `{model, messages}` shape LM Studio and
//! similar local servers accept. Reply parsing is tolerant of three
//! response layouts:
//!
//! 1. OpenAI-compatible: `choices[0].message.content`
//! 2. Ollama-style: `message.content`
//! 3. Bare: top-level `content`
//!
//! Anything else is a malformed response — surfaced with a truncated
//! snippet of the raw body for diagnosis.

use serde::Serialize;
use taskforce_application::UsageMetadata;
use taskforce_domain::Turn;

/// Maximum raw-body length quoted in malformed-response errors.
const ERROR_SNIPPET_LEN: usize = 200;

/// One message in the outbound request body.
#[derive(Debug, Serialize)]
pub struct WireMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

/// Outbound chat-completion request body.
#[derive(Debug, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<WireMessage<'a>>,
}

/// Serialize the session snapshot plus the new message, in order.
pub fn build_request<'a>(model: &'a str, turns: &'a [Turn], message: &'a str) -> ChatRequest<'a> {
    let mut messages: Vec<WireMessage<'a>> = turns
        .iter()
        .map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        })
        .collect();
    messages.push(WireMessage {
        role: "user",
        content: message,
    });
    ChatRequest { model, messages }
}

/// Extract the reply text and usage metadata from a response body.
///
/// Returns a diagnostic string (for `EndpointError::MalformedResponse`)
/// when the body matches none of the accepted layouts.
pub fn parse_reply(body: &serde_json::Value) -> Result<(String, Option<UsageMetadata>), String> {
    let usage = parse_usage(body);

    if let Some(content) = body
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
    {
        return Ok((content.to_string(), usage));
    }

    if let Some(content) = body
        .get("message")
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
    {
        return Ok((content.to_string(), usage));
    }

    if let Some(content) = body.get("content").and_then(|content| content.as_str()) {
        return Ok((content.to_string(), usage));
    }

    let mut snippet = body.to_string();
    snippet.truncate(
        snippet
            .char_indices()
            .nth(ERROR_SNIPPET_LEN)
            .map(|(i, _)| i)
            .unwrap_or(snippet.len()),
    );
    Err(format!("unexpected response shape: {}", snippet))
}

fn parse_usage(body: &serde_json::Value) -> Option<UsageMetadata> {
    let usage = body.get("usage")?;
    Some(UsageMetadata {
        prompt_tokens: usage.get("prompt_tokens")?.as_u64()?,
        completion_tokens: usage.get("completion_tokens")?.as_u64()?,
        total_tokens: usage.get("total_tokens")?.as_u64()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_request_appends_new_message_last() {
        let turns = vec![Turn::system("be brief"), Turn::user("hi"), Turn::assistant("hello")];
        let request = build_request("local-model", &turns, "write a haiku");

        assert_eq!(request.model, "local-model");
        assert_eq!(request.messages.len(), 4);
        assert_eq!(request.messages[0].role, "system");
        assert_eq!(request.messages[3].role, "user");
        assert_eq!(request.messages[3].content, "write a haiku");
    }

    #[test]
    fn test_request_serializes_in_order() {
        let turns = vec![Turn::user("first"), Turn::assistant("second")];
        let request = build_request("m", &turns, "third");
        let json = serde_json::to_value(&request).unwrap();
        let contents: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["content"].as_str().unwrap())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn test_parse_openai_shape() {
        let body = serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": "a haiku"}}],
            "usage": {"prompt_tokens": 12, "completion_tokens": 7, "total_tokens": 19}
        });
        let (text, usage) = parse_reply(&body).unwrap();
        assert_eq!(text, "a haiku");
        assert_eq!(usage.unwrap().total_tokens, 19);
    }

    #[test]
    fn test_parse_message_shape() {
        let body = serde_json::json!({"message": {"content": "a reply"}});
        let (text, usage) = parse_reply(&body).unwrap();
        assert_eq!(text, "a reply");
        assert!(usage.is_none());
    }

    #[test]
    fn test_parse_bare_content_shape() {
        let body = serde_json::json!({"content": "bare"});
        assert_eq!(parse_reply(&body).unwrap().0, "bare");
    }

    #[test]
    fn test_unknown_shape_is_error_with_snippet() {
        let body = serde_json::json!({"error": "model not loaded"});
        let err = parse_reply(&body).unwrap_err();
        assert!(err.contains("model not loaded"));
    }

    #[test]
    fn test_partial_usage_ignored() {
        let body = serde_json::json!({
            "content": "text",
            "usage": {"prompt_tokens": 3}
        });
        let (_, usage) = parse_reply(&body).unwrap();
        assert!(usage.is_none());
    }
}
