//! Answer generation seam and the "stuff" prompt.
//!
//! The language model is an injected [`AnswerGenerator`]. The app crate
//! ships an Ollama implementation; tests use scripted generators.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::GenerationError;

/// A generated answer and the chunk texts it was grounded on, verbatim.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Answer {
    pub text: String,
    pub sources: Vec<String>,
}

#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Answer `question` from `context` using the named model.
    ///
    /// Implementations return `context` unchanged as [`Answer::sources`].
    async fn generate(
        &self,
        model: &str,
        question: &str,
        context: &[String],
    ) -> Result<Answer, GenerationError>;
}

/// Build the prompt: every context chunk, separated by blank lines, then the
/// question.
pub fn build_prompt(question: &str, context: &[String]) -> String {
    format!(
        "Use the following pieces of context to answer the question at the end. \
         If you don't know the answer, just say that you don't know, don't try to \
         make up an answer.\n\n{}\n\nQuestion: {}\nHelpful Answer:",
        context.join("\n\n"),
        question
    )
}
