use crate::conversation::{ChatRole, GenerationRequest};
use serde::{Deserialize, Serialize};

/// Sampling settings sent with every chat-completions call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingParameters {
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

impl Default for SamplingParameters {
    fn default() -> Self {
        Self {
            temperature: 0.2,
            max_tokens: 2048,
            top_p: 0.95,
            frequency_penalty: 0.0,
            presence_penalty: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WireMessage<'a> {
    pub role: ChatRole,
    pub content: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub messages: Vec<WireMessage<'a>>,
    #[serde(flatten)]
    pub sampling: &'a SamplingParameters,
}

impl<'a> ChatCompletionRequest<'a> {
    pub fn new(request: &'a GenerationRequest, sampling: &'a SamplingParameters) -> Self {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        messages.push(WireMessage {
            role: ChatRole::System,
            content: &request.system,
        });
        messages.extend(request.messages.iter().map(|m| WireMessage {
            role: m.role,
            content: &m.content,
        }));
        Self { messages, sampling }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResponseMessage {
    pub content: Option<String>,
}
