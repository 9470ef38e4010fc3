//! Lexical relevance scoring between a chunk and a question. Pure functions
//! over immutable token sets; no shared state.

use crate::preprocessing::content_word_set;
use std::collections::HashSet;

// Light plural folding so singular and plural forms of the same noun count
// as overlap ("cats" matches "cat"). Deliberately conservative: only a
// trailing "s" on longer words, never "ss".
fn singularize(word: &str) -> String {
    if word.len() > 3 && word.ends_with('s') && !word.ends_with("ss") {
        word[..word.len() - 1].to_string()
    } else {
        word.to_string()
    }
}

/// Content-word vocabulary used on both sides of a relevance comparison:
/// lowercased, stop words removed, plurals folded.
pub fn query_word_set(text: &str) -> HashSet<String> {
    content_word_set(text)
        .iter()
        .map(|w| singularize(w))
        .collect()
}

/// Jaccard similarity of two word sets: |A∩B| / |A∪B|. Symmetric, in [0,1],
/// and 0 when the union is empty.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    intersection as f32 / union as f32
}

/// Relevance of a chunk to a question: Jaccard overlap of their content-word
/// vocabularies.
pub fn relevance_score(chunk_text: &str, question_words: &HashSet<String>) -> f32 {
    let chunk_words = query_word_set(chunk_text);
    jaccard_similarity(&chunk_words, question_words)
}

/// Final ranking score: relevance and quality blended by a configurable
/// weight. `relevance_weight` of 0.5 weighs them equally.
pub fn combined_score(relevance: f32, quality: f32, relevance_weight: f32) -> f32 {
    let w = relevance_weight.clamp(0.0, 1.0);
    w * relevance + (1.0 - w) * quality
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(words: &[&str]) -> HashSet<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_jaccard_is_symmetric() {
        let a = set(&["cat", "pet", "popular"]);
        let b = set(&["cat", "dog"]);
        assert_eq!(jaccard_similarity(&a, &b), jaccard_similarity(&b, &a));
    }

    #[test]
    fn test_jaccard_bounds() {
        let a = set(&["alpha", "beta"]);
        let b = set(&["beta", "gamma", "delta"]);
        let score = jaccard_similarity(&a, &b);
        assert!((0.0..=1.0).contains(&score));
        assert!((score - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_identical_vocabulary_scores_one() {
        let a = set(&["claims", "coverage"]);
        assert_eq!(jaccard_similarity(&a, &a.clone()), 1.0);
    }

    #[test]
    fn test_disjoint_vocabulary_scores_zero() {
        let a = set(&["claims"]);
        let b = set(&["orbit"]);
        assert_eq!(jaccard_similarity(&a, &b), 0.0);
    }

    #[test]
    fn test_empty_sets_score_zero() {
        let empty = HashSet::new();
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
    }

    #[test]
    fn test_plurals_fold_together() {
        let question = query_word_set("Tell me about cats");
        assert!(question.contains("cat"));
        let score = relevance_score("The cat sat on the mat.", &question);
        assert!(score > 0.0);
    }

    #[test]
    fn test_relevance_ignores_stop_words() {
        let question = query_word_set("Tell me about cats");
        let on_topic = relevance_score("Cats are popular pets.", &question);
        let off_topic = relevance_score("Stock prices rose sharply today.", &question);
        assert!(on_topic > off_topic);
        assert_eq!(off_topic, 0.0);
    }

    #[test]
    fn test_combined_score_weighting() {
        assert_eq!(combined_score(1.0, 0.0, 1.0), 1.0);
        assert_eq!(combined_score(1.0, 0.0, 0.0), 0.0);
        assert!((combined_score(0.8, 0.4, 0.5) - 0.6).abs() < 1e-6);
    }
}
