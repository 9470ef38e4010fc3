use crate::answer::relevance::{combined_score, query_word_set, relevance_score};
use crate::config::{AnswerConfig, PreprocessingConfig};
use crate::preprocessing::TextPreprocessor;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// A chunk returned by retrieval for a question, in retrieval order. Not
/// guaranteed quality-sorted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    /// Similarity score from the vector index.
    pub vector_score: f32,
    pub ordinal: usize,
    /// Quality score stored at chunk creation, if the index kept it.
    pub quality: Option<f32>,
    pub source: String,
}

/// A candidate that survived filtering, with its per-question scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredContext {
    pub text: String,
    pub ordinal: usize,
    pub source: String,
    pub quality: f32,
    pub relevance: f32,
    pub combined: f32,
}

/// Why the optimizer fell back to plain truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FallbackReason {
    /// Advanced filtering is switched off in configuration.
    FilteringDisabled,
    /// The question contains no content words to rank against.
    NoQuestionVocabulary,
    /// Every candidate was filtered out.
    NoSurvivors,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackReason::FilteringDisabled => write!(f, "advanced filtering disabled"),
            FallbackReason::NoQuestionVocabulary => {
                write!(f, "question has no content words")
            }
            FallbackReason::NoSurvivors => write!(f, "no candidates survived filtering"),
        }
    }
}

/// Outcome of context selection. The degraded path is a first-class value,
/// not an intercepted exception: answer generation proceeds either way.
#[derive(Debug, Clone)]
pub enum SelectedContext {
    /// Quality- and relevance-ranked selection.
    Optimized { chunks: Vec<ScoredContext> },
    /// The unfiltered candidate set truncated to the context limit.
    Fallback {
        chunks: Vec<Candidate>,
        reason: FallbackReason,
    },
}

impl SelectedContext {
    pub fn is_optimized(&self) -> bool {
        matches!(self, SelectedContext::Optimized { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            SelectedContext::Optimized { chunks } => chunks.len(),
            SelectedContext::Fallback { chunks, .. } => chunks.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Chunk texts in selection order, ready for prompt assembly.
    pub fn texts(&self) -> Vec<String> {
        match self {
            SelectedContext::Optimized { chunks } => {
                chunks.iter().map(|c| c.text.clone()).collect()
            }
            SelectedContext::Fallback { chunks, .. } => {
                chunks.iter().map(|c| c.text.clone()).collect()
            }
        }
    }

    pub fn scores(&self) -> Option<&[ScoredContext]> {
        match self {
            SelectedContext::Optimized { chunks } => Some(chunks),
            SelectedContext::Fallback { .. } => None,
        }
    }
}

/// Re-filters and ranks retrieved candidates against the question, selecting
/// a bounded final context. Pure and synchronous.
#[derive(Debug, Clone)]
pub struct ContextOptimizer {
    answer: AnswerConfig,
    preprocessing: PreprocessingConfig,
    preprocessor: TextPreprocessor,
}

impl ContextOptimizer {
    pub fn new(answer: AnswerConfig, preprocessing: PreprocessingConfig) -> Self {
        Self {
            preprocessor: TextPreprocessor::new(preprocessing.clone()),
            answer,
            preprocessing,
        }
    }

    /// Select the final context for a question. Never fails: every degraded
    /// path yields the fallback variant so generation is never blocked.
    pub fn select(&self, candidates: &[Candidate], question: &str) -> SelectedContext {
        if !self.answer.enable_advanced_filtering {
            return self.fallback(candidates, FallbackReason::FilteringDisabled);
        }
        match self.optimize(candidates, question) {
            Ok(chunks) if !chunks.is_empty() => SelectedContext::Optimized { chunks },
            Ok(_) => self.fallback(candidates, FallbackReason::NoSurvivors),
            Err(reason) => self.fallback(candidates, reason),
        }
    }

    fn optimize(
        &self,
        candidates: &[Candidate],
        question: &str,
    ) -> Result<Vec<ScoredContext>, FallbackReason> {
        let question_words = query_word_set(question);
        if question_words.is_empty() {
            return Err(FallbackReason::NoQuestionVocabulary);
        }

        // Stage 1: quality filter, reusing stored scores where present.
        // Stage 2: relevance against the question vocabulary.
        let mut scored: Vec<ScoredContext> = candidates
            .iter()
            .filter_map(|candidate| {
                let quality = candidate
                    .quality
                    .unwrap_or_else(|| self.preprocessor.score(&candidate.text).semantic_density);
                if quality < self.preprocessing.min_semantic_density {
                    return None;
                }
                let relevance = relevance_score(&candidate.text, &question_words);
                if relevance < self.answer.min_relevance_threshold {
                    return None;
                }
                Some(ScoredContext {
                    text: candidate.text.clone(),
                    ordinal: candidate.ordinal,
                    source: candidate.source.clone(),
                    quality,
                    relevance,
                    combined: combined_score(relevance, quality, self.answer.relevance_weight),
                })
            })
            .collect();

        // Stage 3: combined score descending, ties by quality, then original
        // candidate order (stable sort).
        scored.sort_by(|a, b| {
            b.combined
                .partial_cmp(&a.combined)
                .unwrap_or(Ordering::Equal)
                .then(b.quality.partial_cmp(&a.quality).unwrap_or(Ordering::Equal))
        });
        scored.truncate(self.answer.max_context_chunks);
        Ok(scored)
    }

    fn fallback(&self, candidates: &[Candidate], reason: FallbackReason) -> SelectedContext {
        let chunks = candidates
            .iter()
            .take(self.answer.max_context_chunks)
            .cloned()
            .collect();
        SelectedContext::Fallback { chunks, reason }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(text: &str, ordinal: usize) -> Candidate {
        Candidate {
            text: text.to_string(),
            vector_score: 0.5,
            ordinal,
            quality: None,
            source: "doc".to_string(),
        }
    }

    fn optimizer(max_context_chunks: usize) -> ContextOptimizer {
        let answer = AnswerConfig {
            max_context_chunks,
            ..AnswerConfig::default()
        };
        let mut preprocessing = PreprocessingConfig::default();
        // These unit tests exercise ranking, not quality gating.
        preprocessing.min_semantic_density = 0.0;
        ContextOptimizer::new(answer, preprocessing)
    }

    fn cat_candidates() -> Vec<Candidate> {
        vec![
            candidate("The cat sat on the mat.", 0),
            candidate("Stock prices rose sharply today.", 1),
            candidate("Cats are popular pets.", 2),
        ]
    }

    #[test]
    fn test_selects_lexically_relevant_chunks() {
        let selected = optimizer(2).select(&cat_candidates(), "Tell me about cats");
        assert!(selected.is_optimized());
        let texts = selected.texts();
        assert_eq!(texts.len(), 2);
        assert!(texts.contains(&"The cat sat on the mat.".to_string()));
        assert!(texts.contains(&"Cats are popular pets.".to_string()));
        assert!(!texts.contains(&"Stock prices rose sharply today.".to_string()));
    }

    #[test]
    fn test_selection_never_exceeds_limit() {
        let opt = optimizer(3);
        for n in 0..6 {
            let candidates: Vec<Candidate> = (0..n)
                .map(|i| candidate("Cats are popular pets.", i))
                .collect();
            let selected = opt.select(&candidates, "Tell me about cats");
            assert!(selected.len() <= 3);
            assert_eq!(selected.len(), n.min(3));
        }
    }

    #[test]
    fn test_empty_candidates_yield_empty_fallback() {
        let selected = optimizer(3).select(&[], "Tell me about cats");
        assert!(!selected.is_optimized());
        assert!(selected.is_empty());
    }

    #[test]
    fn test_scoring_failure_falls_back_to_truncation() {
        // A question with only stop words gives relevance scoring nothing to
        // rank against; the selection must equal the first
        // max_context_chunks candidates, unfiltered.
        let candidates = cat_candidates();
        let selected = optimizer(2).select(&candidates, "the and of it");
        match selected {
            SelectedContext::Fallback { chunks, reason } => {
                assert_eq!(reason, FallbackReason::NoQuestionVocabulary);
                assert_eq!(chunks.len(), 2);
                assert_eq!(chunks[0].text, candidates[0].text);
                assert_eq!(chunks[1].text, candidates[1].text);
            }
            SelectedContext::Optimized { .. } => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_disabled_filtering_falls_back() {
        let answer = AnswerConfig {
            enable_advanced_filtering: false,
            ..AnswerConfig::default()
        };
        let opt = ContextOptimizer::new(answer, PreprocessingConfig::default());
        let selected = opt.select(&cat_candidates(), "Tell me about cats");
        match selected {
            SelectedContext::Fallback { reason, .. } => {
                assert_eq!(reason, FallbackReason::FilteringDisabled)
            }
            SelectedContext::Optimized { .. } => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_irrelevant_candidates_fall_back_not_empty() {
        let candidates = vec![
            candidate("Stock prices rose sharply today.", 0),
            candidate("Quarterly earnings beat expectations.", 1),
        ];
        let selected = optimizer(3).select(&candidates, "Tell me about cats");
        match selected {
            SelectedContext::Fallback { chunks, reason } => {
                assert_eq!(reason, FallbackReason::NoSurvivors);
                assert_eq!(chunks.len(), 2);
            }
            SelectedContext::Optimized { .. } => panic!("expected fallback"),
        }
    }

    #[test]
    fn test_stored_quality_is_reused() {
        let mut low = candidate("Cats are popular pets.", 0);
        low.quality = Some(0.05);
        let high = candidate("Cats are popular pets.", 1);
        let answer = AnswerConfig::default();
        let preprocessing = PreprocessingConfig::default();
        let opt = ContextOptimizer::new(answer, preprocessing);
        let selected = opt.select(&[low, high], "Tell me about cats");
        // The stored low score gates out the first candidate; the rescored
        // second one survives.
        assert!(selected.is_optimized());
        assert_eq!(selected.len(), 1);
        assert_eq!(selected.scores().unwrap()[0].ordinal, 1);
    }

    #[test]
    fn test_ranking_prefers_higher_overlap() {
        let candidates = vec![
            candidate("Dogs bark loudly at night.", 0),
            candidate("Cats are popular pets and cats sleep often.", 1),
        ];
        let selected = optimizer(2).select(&candidates, "Are cats popular pets?");
        let scores = selected.scores().unwrap();
        assert_eq!(scores[0].ordinal, 1);
        assert!(scores[0].relevance > 0.4);
    }
}
