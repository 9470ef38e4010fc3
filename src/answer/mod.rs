mod generator;
mod optimizer;
mod relevance;

pub use generator::{build_prompt, AnswerGenerator, AnswerResponse, ContextScore};
pub use optimizer::{Candidate, ContextOptimizer, FallbackReason, ScoredContext, SelectedContext};
pub use relevance::{combined_score, jaccard_similarity, query_word_set, relevance_score};
