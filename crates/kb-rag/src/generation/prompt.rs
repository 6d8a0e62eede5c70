//! Prompt construction for grounded answers

use serde::{Deserialize, Serialize};

/// System instruction sent with every question
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that uses the provided context to answer questions.";

/// Author of a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One message of a chat-completions conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Prompt builder for knowledge-base questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// Join retrieved chunks into one context block, best first
    pub fn build_context(contexts: &[String]) -> String {
        contexts.join("\n")
    }

    /// User turn carrying the context and the question
    pub fn build_user_message(query: &str, context: &str) -> String {
        format!("Context: {}\n\nQuestion: {}", context, query)
    }

    /// Full message list for a question
    pub fn build_messages(query: &str, contexts: &[String]) -> Vec<ChatMessage> {
        let context = Self::build_context(contexts);
        vec![
            ChatMessage::system(SYSTEM_PROMPT),
            ChatMessage::user(Self::build_user_message(query, &context)),
        ]
    }
}
