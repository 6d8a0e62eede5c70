//! Grounded answer generation with a fixed fallback

use std::sync::Arc;

use super::prompt::PromptBuilder;
use super::LlmProvider;

/// Returned when the generation API fails for any reason
pub const FALLBACK_ANSWER: &str = "Sorry, there was an error processing your request.";

/// Returned without calling the API when nothing was retrieved
pub const NO_CONTEXT_ANSWER: &str =
    "I could not find any relevant information in the knowledge base to answer that question.";

/// Turns a question and retrieved chunks into an answer
///
/// Never fails: generation errors are logged and replaced by
/// [`FALLBACK_ANSWER`].
#[derive(Clone)]
pub struct AnswerGenerator {
    llm: Arc<dyn LlmProvider>,
}

impl AnswerGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Answer `query` from `contexts` (best first)
    pub async fn answer(&self, query: &str, contexts: &[String]) -> String {
        if contexts.is_empty() {
            tracing::debug!("No context retrieved, skipping generation");
            return NO_CONTEXT_ANSWER.to_string();
        }

        let messages = PromptBuilder::build_messages(query, contexts);

        match self.llm.complete(&messages).await {
            Ok(answer) => {
                tracing::debug!("Generated {} chars with {}", answer.len(), self.llm.name());
                answer
            }
            Err(e) => {
                tracing::warn!("Answer generation failed: {}", e);
                FALLBACK_ANSWER.to_string()
            }
        }
    }
}
