use crate::answer::optimizer::{Candidate, ContextOptimizer, SelectedContext};
use crate::config::{AnswerConfig, PreprocessingConfig};
use crate::providers::CompletionProvider;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const REFUSAL_PHRASE: &str = "The answer is not available in the provided context.";

/// Per-chunk scores surfaced for observability.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextScore {
    pub ordinal: usize,
    pub source: String,
    pub quality: f32,
    pub relevance: f32,
}

/// The caller-visible result of answering a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerResponse {
    pub answer: String,
    /// The chunk texts actually placed in the prompt.
    pub context_used: Vec<String>,
    /// Present when the optimized path was taken.
    pub scores: Option<Vec<ContextScore>>,
    /// Whether context optimization succeeded or the fallback was used.
    pub optimized: bool,
}

/// Assembles a grounding prompt from selected context and delegates to the
/// generation model. Generation failures surface to the caller; there is no
/// retry here.
pub struct AnswerGenerator {
    provider: Arc<dyn CompletionProvider>,
    optimizer: ContextOptimizer,
}

impl AnswerGenerator {
    pub fn new(
        provider: Arc<dyn CompletionProvider>,
        answer: AnswerConfig,
        preprocessing: PreprocessingConfig,
    ) -> Self {
        Self {
            provider,
            optimizer: ContextOptimizer::new(answer, preprocessing),
        }
    }

    /// Optimize the candidate set for the question and generate an answer
    /// from the selected context.
    pub async fn answer(&self, question: &str, candidates: &[Candidate]) -> Result<AnswerResponse> {
        let selected = self.optimizer.select(candidates, question);
        if let SelectedContext::Fallback { reason, .. } = &selected {
            log::warn!("Context optimization fell back: {}", reason);
        }

        let context_used = selected.texts();
        let prompt = build_prompt(&context_used, question);
        let answer = self.provider.complete(&prompt).await?;

        let scores = selected.scores().map(|scored| {
            scored
                .iter()
                .map(|s| ContextScore {
                    ordinal: s.ordinal,
                    source: s.source.clone(),
                    quality: s.quality,
                    relevance: s.relevance,
                })
                .collect()
        });

        Ok(AnswerResponse {
            answer: answer.trim().to_string(),
            context_used,
            scores,
            optimized: selected.is_optimized(),
        })
    }
}

/// Build the grounding prompt: context block, question, and strict
/// answer-only-from-context instructions.
pub fn build_prompt(context_chunks: &[String], question: &str) -> String {
    let context = context_chunks.join("\n\n");
    format!(
        "You are a helpful assistant who answers questions based ONLY on the provided context.\n\
        \n\
        Context:\n\
        ---\n\
        {}\n\
        ---\n\
        \n\
        Question: {}\n\
        \n\
        Instructions:\n\
        1. Read the context carefully and identify the most relevant information.\n\
        2. Formulate a clear, concise answer based strictly on the information given in the context.\n\
        3. If the information needed to answer the question is not in the context, you must respond with exactly this phrase: \"{}\"",
        context, question, REFUSAL_PHRASE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_context_and_question() {
        let context = vec![
            "Cats are popular pets.".to_string(),
            "The cat sat on the mat.".to_string(),
        ];
        let prompt = build_prompt(&context, "Tell me about cats");
        assert!(prompt.contains("Cats are popular pets."));
        assert!(prompt.contains("The cat sat on the mat."));
        assert!(prompt.contains("Question: Tell me about cats"));
        assert!(prompt.contains(REFUSAL_PHRASE));
    }

    #[test]
    fn test_prompt_separates_chunks() {
        let context = vec!["First chunk.".to_string(), "Second chunk.".to_string()];
        let prompt = build_prompt(&context, "q");
        assert!(prompt.contains("First chunk.\n\nSecond chunk."));
    }

    #[test]
    fn test_empty_context_still_builds_prompt() {
        let prompt = build_prompt(&[], "What is covered?");
        assert!(prompt.contains("Question: What is covered?"));
    }
}
