use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ChatConfig;
use crate::error::TodoError;

use super::message::{AssistantReply, ChatMessage, ToolCall, ToolDefinition};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// A chat-completion backend that can request tool calls.
pub trait ChatModel {
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply, TodoError>;
}

/// Blocking client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAiClient {
    http: reqwest::blocking::Client,
    config: ChatConfig,
}

impl OpenAiClient {
    pub fn new(config: ChatConfig) -> Result<Self, TodoError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

impl ChatModel for OpenAiClient {
    fn complete(
        &self,
        messages: &[ChatMessage],
        tools: &[ToolDefinition],
    ) -> Result<AssistantReply, TodoError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            tools,
        };
        tracing::debug!(model = %self.config.model, messages = messages.len(), "chat completion request");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .map_err(|e| TodoError::from(e).context("chat completion"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(TodoError::model(format!(
                "chat completion failed with {status}: {}",
                body.trim()
            )));
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| TodoError::from(e).context("decode chat completion"))?;
        parsed.into_reply()
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Option<Vec<ToolCall>>,
}

impl ChatResponse {
    fn into_reply(self) -> Result<AssistantReply, TodoError> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| TodoError::model("No response from API"))?;
        Ok(AssistantReply {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use serde_json::json;

    #[test]
    fn parses_tool_call_reply() {
        let raw = json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "finish_reason": "tool_calls",
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_abc",
                        "type": "function",
                        "function": {"name": "get_statistics", "arguments": "{}"}
                    }]
                }
            }]
        });
        let response: ChatResponse = serde_json::from_value(raw).unwrap();
        let reply = response.into_reply().unwrap();
        assert!(reply.content.is_none());
        assert_eq!(reply.tool_calls.len(), 1);
        assert_eq!(reply.tool_calls[0].id, "call_abc");
        assert_eq!(reply.tool_calls[0].function.name, "get_statistics");
    }

    #[test]
    fn parses_text_reply_with_null_tool_calls() {
        let raw = json!({
            "choices": [{"message": {"role": "assistant", "content": "All done.", "tool_calls": null}}]
        });
        let reply = serde_json::from_value::<ChatResponse>(raw)
            .unwrap()
            .into_reply()
            .unwrap();
        assert_eq!(reply.content.as_deref(), Some("All done."));
        assert!(reply.tool_calls.is_empty());
    }

    #[test]
    fn empty_choices_is_model_error() {
        let response: ChatResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert_eq!(response.into_reply().unwrap_err().code, ErrorCode::ModelError);
    }

    #[test]
    fn request_shape() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("hi")];
        let tools = crate::agent::tools::definitions();
        let request = ChatRequest {
            model: "qwen-plus",
            messages: &messages,
            tools: &tools,
        };
        let v = serde_json::to_value(&request).unwrap();
        assert_eq!(v["model"], "qwen-plus");
        assert_eq!(v["messages"][1]["role"], "user");
        assert_eq!(v["tools"][0]["type"], "function");
        assert_eq!(v["tools"].as_array().unwrap().len(), 9);
    }

    #[test]
    fn endpoint_joins_base_url() {
        let mut config = ChatConfig::new("sk-test");
        config.base_url = "http://localhost:9000/v1/".into();
        let client = OpenAiClient::new(config).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9000/v1/chat/completions");
        assert_eq!(client.model(), crate::config::DEFAULT_MODEL);
    }
}
