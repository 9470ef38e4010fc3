use lazy_static::lazy_static;
use std::collections::HashSet;

lazy_static! {
    /// English function words excluded from content-word statistics and
    /// relevance scoring. Shared by the preprocessor and the context
    /// optimizer so both sides of a Jaccard comparison agree on vocabulary.
    pub static ref STOP_WORDS: HashSet<&'static str> = [
        "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for",
        "of", "with", "by", "is", "are", "was", "were", "be", "been", "have",
        "has", "had", "do", "does", "did", "will", "would", "could", "should",
        "may", "might", "must", "can", "this", "that", "these", "those", "i",
        "you", "he", "she", "it", "we", "they", "me", "him", "her", "us",
        "them",
    ]
    .into_iter()
    .collect();
}

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_common_words_are_stopped() {
        assert!(is_stop_word("the"));
        assert!(is_stop_word("and"));
        assert!(is_stop_word("they"));
    }

    #[test]
    fn test_content_words_pass() {
        assert!(!is_stop_word("insurance"));
        assert!(!is_stop_word("cats"));
    }
}
