//! Canned chat-completions responses for driving the Brain against wiremock.

use serde_json::{json, Value};
use wiremock::{Match, MockServer, Request};

use crate::llm::{Brain, BrainConfig};

pub fn brain_for(server: &MockServer) -> Brain {
    Brain::new(BrainConfig {
        api_key: "test-key".to_string(),
        model: "gpt-test".to_string(),
        api_base: Some(server.uri()),
    })
}

pub fn completion(message: Value) -> Value {
    json!({
        "id": "chatcmpl-1",
        "object": "chat.completion",
        "created": 1,
        "model": "gpt-test",
        "choices": [{ "index": 0, "message": message, "finish_reason": "stop" }]
    })
}

pub fn text_completion(text: &str) -> Value {
    completion(json!({ "role": "assistant", "content": text }))
}

pub fn tool_call_completion(call_id: &str, name: &str, arguments: Value) -> Value {
    completion(json!({
        "role": "assistant",
        "content": null,
        "tool_calls": [{
            "id": call_id,
            "type": "function",
            "function": { "name": name, "arguments": arguments.to_string() }
        }]
    }))
}

/// Matches requests that do not yet carry any tool output.
pub struct NoToolResults;

impl Match for NoToolResults {
    fn matches(&self, request: &Request) -> bool {
        !String::from_utf8_lossy(&request.body).contains("tool_call_id")
    }
}
