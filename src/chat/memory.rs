//! Conversation memory with periodic summarization.
//!
//! State is explicit and owned by the caller: a chat turn appends to the
//! message list it was handed, and summarization reads only that state. No
//! process-global session storage.

use std::sync::Arc;

use crate::core::errors::ApiError;
use crate::llm::{ChatMessage, GenerateRequest, LlmProvider};

/// Messages accumulated before the first summary is taken.
const SUMMARIZE_AFTER: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    pub messages: Vec<ChatMessage>,
    pub summaries: Vec<String>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user_message(&mut self, content: &str) {
        self.messages.push(ChatMessage {
            role: "user".to_string(),
            content: content.to_string(),
        });
    }

    pub fn add_assistant_message(&mut self, content: &str) {
        self.messages.push(ChatMessage {
            role: "assistant".to_string(),
            content: content.to_string(),
        });
    }

    /// Condense the most recent messages into a summary once the history is
    /// long enough. Only the first crossing of the threshold summarizes.
    pub async fn summarize_if_needed(
        &mut self,
        llm: &Arc<dyn LlmProvider>,
        model_id: &str,
    ) -> Result<(), ApiError> {
        if self.messages.len() < SUMMARIZE_AFTER || !self.summaries.is_empty() {
            return Ok(());
        }

        let window = &self.messages[self.messages.len() - SUMMARIZE_AFTER..];
        let transcript = window
            .iter()
            .map(|m| {
                if m.role == "user" {
                    format!("User: {}", m.content)
                } else {
                    format!("Assistant: {}", m.content)
                }
            })
            .collect::<Vec<_>>()
            .join("\n");

        let prompt = format!(
            "Write a concise summary of the following conversation:\n\n{}\n\nCONCISE SUMMARY:",
            transcript
        );
        let summary = llm.generate(GenerateRequest::new(prompt), model_id).await?;
        self.summaries.push(summary.trim().to_string());

        Ok(())
    }

    /// Summaries joined for prompt injection.
    pub fn memory_context(&self) -> String {
        self.summaries.join("\n---\n")
    }

    pub fn reset(&mut self) {
        self.messages.clear();
        self.summaries.clear();
    }
}
