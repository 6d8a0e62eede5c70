//! Answer generation through a remote chat-completions API

mod answer;
mod client;
mod prompt;

pub use answer::{AnswerGenerator, FALLBACK_ANSWER, NO_CONTEXT_ANSWER};
pub use client::ChatCompletionClient;
pub use prompt::{ChatMessage, PromptBuilder, Role, SYSTEM_PROMPT};

use async_trait::async_trait;

use crate::error::Result;

/// A language model that completes a chat conversation
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Text of the assistant's reply
    ///
    /// Failures are reported as `Error::GenerationApiFailure`.
    async fn complete(&self, messages: &[ChatMessage]) -> Result<String>;

    /// Provider or model name for logging
    fn name(&self) -> &str;
}
