//! Prompt assembly for grounded answers
//!
//! Pure functions: no I/O, deterministic for a given input, so the whole
//! grounding surface is unit-testable without a model.

use crate::types::QueryResult;

/// Sentinel context when retrieval produced nothing; downstream synthesis is
/// told explicitly so it declines instead of hallucinating
pub const NO_CONTEXT: &str = "No relevant context found.";

/// Builds grounding context and answer prompts from ranked retrieval results
pub struct PromptBuilder;

impl PromptBuilder {
    /// Render ranked results as labeled context blocks, in ranking order.
    /// Each block carries its 1-based rank, source name, and position.
    pub fn build_context(results: &[QueryResult]) -> String {
        if results.is_empty() {
            return NO_CONTEXT.to_string();
        }

        let mut blocks = Vec::with_capacity(results.len());
        for (i, result) in results.iter().enumerate() {
            blocks.push(format!(
                "[Context {} - Source: {}, Chunk {}]\n{}\n",
                i + 1,
                result.chunk.source,
                result.chunk.position,
                result.chunk.text
            ));
        }
        blocks.join("\n")
    }

    /// Embed the context and question into the fixed grounding instructions
    pub fn build_prompt(question: &str, context: &str) -> String {
        format!(
            r#"You are a helpful AI assistant answering questions based on provided context.

Context Information:
{context}

User Question: {question}

Instructions:
- Answer the question using ONLY the information provided in the context above
- Be accurate and specific
- If the context doesn't contain enough information to fully answer the question, acknowledge this
- Cite which context sources you used in your answer
- Keep your answer clear and concise

Answer:"#
        )
    }

    /// Context plus prompt in one call
    pub fn build(question: &str, results: &[QueryResult]) -> (String, String) {
        let context = Self::build_context(results);
        let prompt = Self::build_prompt(question, &context);
        (context, prompt)
    }
}
