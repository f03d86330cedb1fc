//! Mistral Chat Completions wire types.
//!
//! See: <https://docs.mistral.ai/api/#tag/chat>

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::attachment::EncodedImage;
use crate::client::ClientError;
use crate::model::Message;
use crate::options::ModelOptions;

pub const MISTRAL_API_BASE: &str = "https://api.mistral.ai";

/// Chat completions endpoint below an API base URL.
pub fn chat_completions_url(base_url: &str) -> String {
    format!("{}/v1/chat/completions", base_url.trim_end_matches('/'))
}

impl ChatRequest {
    /// A single user turn carrying plain text.
    pub(crate) fn text(model: &str, text: &str, options: &ModelOptions) -> Self {
        Self::single_turn(model, ChatContent::Text(text.to_string()), options)
    }

    /// A single user turn carrying a text block and an image block.
    pub(crate) fn image(
        model: &str,
        text: &str,
        image: &EncodedImage,
        options: &ModelOptions,
    ) -> Self {
        let content = ChatContent::Parts(vec![
            ContentPart::Text {
                text: text.to_string(),
            },
            ContentPart::ImageUrl {
                image_url: image.data_uri(),
            },
        ]);
        Self::single_turn(model, content, options)
    }

    fn single_turn(model: &str, content: ChatContent, options: &ModelOptions) -> Self {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &options.system {
            messages.push(ChatMessage {
                role: "system".to_string(),
                content: ChatContent::Text(system.clone()),
            });
        }
        messages.push(ChatMessage {
            role: "user".to_string(),
            content,
        });

        ChatRequest {
            model: model.to_string(),
            messages,
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            random_seed: options.random_seed,
            safe_prompt: options.safe_prompt,
        }
    }

    pub(crate) fn to_value(&self) -> Result<Value, ClientError> {
        serde_json::to_value(self).map_err(|e| ClientError::Transport {
            status: None,
            message: format!("Could not encode request body: {}", e),
        })
    }
}

/// Pull the first completion out of a chat completions response body.
pub(crate) fn parse_completion(body: Value) -> Result<Message, ClientError> {
    let response: ChatResponse =
        serde_json::from_value(body).map_err(|e| ClientError::ResponseParse(e.to_string()))?;

    if let Some(usage) = &response.usage {
        debug!(
            "Token usage: {} prompt, {} completion",
            usage.prompt_tokens, usage.completion_tokens
        );
    }

    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ClientError::ResponseParse("Response contained no choices".to_string()))?;

    if let Some(reason) = &choice.finish_reason {
        debug!("Finish reason: {}", reason);
    }

    let content = match choice.message.content {
        Some(ChatContent::Text(text)) => text,
        Some(ChatContent::Parts(parts)) => parts
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text { text } => Some(text),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
        None => {
            return Err(ClientError::ResponseParse(
                "Completion has no content".to_string(),
            ))
        }
    };

    Ok(Message::assistant(content))
}

// --- Chat Completions API Types ---

#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: Option<f32>,
    top_p: Option<f32>,
    max_tokens: Option<u32>,
    random_seed: Option<u64>,
    safe_prompt: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: ChatContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum ChatContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ResponseMessage {
    content: Option<ChatContent>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}
