//! Language model access and legislative text analysis
//!
//! [`ChatModel`] is the infrastructure seam: it only knows how to send chat
//! and embedding requests. What to ask lives in [`prompts`] and
//! [`AnalysisService`].

pub mod openai;
pub mod prompts;
pub mod service;

pub use openai::OpenAiClient;
pub use service::*;

use crate::Result;
use async_trait::async_trait;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// One chat completion call
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Text of the first choice of a chat completion
    async fn complete(&self, request: ChatRequest) -> Result<String>;

    /// Embedding vector of `text`
    async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>>;
}
