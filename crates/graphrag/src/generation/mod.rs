//! Grounding context assembly and prompt templates

pub mod prompt;

pub use prompt::PromptBuilder;
