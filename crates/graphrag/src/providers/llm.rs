//! LLM provider trait for answer generation

use async_trait::async_trait;

use crate::error::Result;

/// Trait for generating natural-language text from a grounding prompt
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send the prompt to the generative model and return its text
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Provider name for logging
    fn name(&self) -> &str;

    /// Model identifier in use
    fn model(&self) -> &str;
}
