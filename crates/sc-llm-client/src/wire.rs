//! OpenAI-compatible chat-completions wire shapes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionMessage {
    pub role: &'static str,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatCompletionMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionChoice {
    pub message: ChatCompletionResponseMessage,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatCompletionResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// The structured shape `generate_response` asks the model to emit. A model
/// that omits every field but `answer`/content still parses, falling back
/// to `GeneratedAnswer::from_plain_content`.
#[derive(Debug, Deserialize)]
pub(crate) struct StructuredAnswerPayload {
    pub answer: String,
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub response_type: Option<sc_protocol::ResponseType>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}
