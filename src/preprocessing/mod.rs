mod stop_words;

pub use stop_words::{is_stop_word, STOP_WORDS};

use crate::config::PreprocessingConfig;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use unicode_normalization::UnicodeNormalization;

lazy_static! {
    // Lines that carry no document content.
    static ref NOISE_PATTERNS: Vec<Regex> = vec![
        Regex::new(r"^[^a-zA-Z0-9]*$").unwrap(),          // only special characters
        Regex::new(r"^[\d\s\-\.,]{10,}$").unwrap(),       // numbers and basic punctuation
        Regex::new(r"^[A-Z\s]{5,}$").unwrap(),            // shouting headers
        Regex::new(r"(?i)^\s*Page\s+\d+\s*$").unwrap(),   // page numbers
        Regex::new(r"^\s*\d+\s*$").unwrap(),              // bare numbers
        Regex::new(r"^[^\w\s]{3,}$").unwrap(),            // runs of special chars
    ];
    static ref SPACES: Regex = Regex::new(r"[ \t]+").unwrap();
    static ref BLANK_LINES: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref LOWER_UPPER: Regex = Regex::new(r"([a-z])([A-Z])").unwrap();
    static ref PERIOD_UPPER: Regex = Regex::new(r"\.([A-Z])").unwrap();
    static ref LETTER_DIGIT: Regex = Regex::new(r"([a-z])(\d)").unwrap();
    static ref DIGIT_LETTER: Regex = Regex::new(r"(\d)([a-z])").unwrap();
    static ref DOT_RUN: Regex = Regex::new(r"\.{4,}").unwrap();
    static ref DASH_RUN: Regex = Regex::new(r"-{4,}").unwrap();
    static ref WORD: Regex = Regex::new(r"\b\w+\b").unwrap();
}

/// Per-text quality metrics, each in [0,1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityReport {
    /// Letters over all non-space characters.
    pub letter_ratio: f32,
    /// Non-stop-word tokens over all tokens.
    pub content_density: f32,
    /// Distinct content tokens over all content tokens.
    pub unique_ratio: f32,
    /// Weighted combination of the above, clamped to [0,1].
    pub semantic_density: f32,
}

impl QualityReport {
    pub fn empty() -> Self {
        Self {
            letter_ratio: 0.0,
            content_density: 0.0,
            unique_ratio: 0.0,
            semantic_density: 0.0,
        }
    }
}

/// Cleaned text plus its quality report.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub text: String,
    pub quality: QualityReport,
}

/// Normalizes and scores raw extracted text. Pure: no external state is
/// touched, and empty or all-noise input yields an empty zero-score result
/// rather than an error.
#[derive(Debug, Clone)]
pub struct TextPreprocessor {
    config: PreprocessingConfig,
}

impl TextPreprocessor {
    pub fn new(config: PreprocessingConfig) -> Self {
        Self { config }
    }

    /// Canonicalize equivalent code-point sequences so visually identical
    /// text compares equal downstream.
    pub fn normalize_unicode(&self, text: &str) -> String {
        text.nfkd().collect()
    }

    /// Collapse space runs and cap consecutive blank lines at one.
    pub fn collapse_whitespace(&self, text: &str) -> String {
        let text = SPACES.replace_all(text, " ");
        BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
    }

    /// Heuristic check for boilerplate: too short, a known noise pattern, or
    /// letter-starved text.
    pub fn is_noise(&self, text: &str) -> bool {
        let trimmed = text.trim();
        if trimmed.chars().count() < self.config.min_chunk_chars {
            return true;
        }
        if NOISE_PATTERNS.iter().any(|p| p.is_match(trimmed)) {
            return true;
        }
        self.letter_ratio(trimmed) < self.config.min_letter_ratio
    }

    /// Repair common OCR and extraction artifacts: merged words, missing
    /// spaces around sentence boundaries and digits, runaway punctuation.
    pub fn repair_artifacts(&self, text: &str) -> String {
        let text = LOWER_UPPER.replace_all(text, "$1 $2");
        let text = PERIOD_UPPER.replace_all(&text, ". $1");
        let text = LETTER_DIGIT.replace_all(&text, "$1 $2");
        let text = DIGIT_LETTER.replace_all(&text, "$1 $2");
        let text = DOT_RUN.replace_all(&text, "...");
        DASH_RUN.replace_all(&text, "---").to_string()
    }

    /// Full cleaning pass. Returns an empty string for empty or all-noise
    /// input so downstream filters drop it.
    pub fn clean(&self, text: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }
        let text = if self.config.normalize_unicode {
            self.normalize_unicode(text)
        } else {
            text.to_string()
        };
        let text = self.collapse_whitespace(&text);
        if self.is_noise(&text) {
            return String::new();
        }
        self.repair_artifacts(&text).trim().to_string()
    }

    fn letter_ratio(&self, text: &str) -> f32 {
        let total = text.chars().filter(|c| !c.is_whitespace()).count();
        if total == 0 {
            return 0.0;
        }
        let letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
        letters as f32 / total as f32
    }

    /// Compute quality metrics over the given text. Empty text scores zero
    /// on every axis.
    pub fn score(&self, text: &str) -> QualityReport {
        let words = tokenize_words(text);
        if words.is_empty() {
            return QualityReport::empty();
        }

        let content: Vec<&String> = words
            .iter()
            .filter(|w| !is_stop_word(w) && w.chars().count() > 2)
            .collect();
        let content_density = content.len() as f32 / words.len() as f32;

        let unique_ratio = if content.is_empty() {
            0.0
        } else {
            let distinct: HashSet<&str> = content.iter().map(|w| w.as_str()).collect();
            distinct.len() as f32 / content.len() as f32
        };

        let letter_ratio = self.letter_ratio(text);
        let semantic_density = (self.config.letter_weight * letter_ratio
            + self.config.content_weight * content_density
            + self.config.unique_weight * unique_ratio)
            .clamp(0.0, 1.0);

        QualityReport {
            letter_ratio,
            content_density,
            unique_ratio,
            semantic_density,
        }
    }

    /// Clean and score in one pass: the preprocessor's main contract.
    pub fn process(&self, text: &str) -> PreprocessOutput {
        let cleaned = self.clean(text);
        if cleaned.is_empty() {
            return PreprocessOutput {
                text: cleaned,
                quality: QualityReport::empty(),
            };
        }
        let quality = self.score(&cleaned);
        PreprocessOutput {
            text: cleaned,
            quality,
        }
    }
}

/// Lowercased word tokens of the text.
pub fn tokenize_words(text: &str) -> Vec<String> {
    WORD.find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Distinct lowercased non-stop-word tokens longer than two characters. The
/// vocabulary both quality and relevance scoring operate on.
pub fn content_word_set(text: &str) -> HashSet<String> {
    tokenize_words(text)
        .into_iter()
        .filter(|w| !is_stop_word(w) && w.chars().count() > 2)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preprocessor() -> TextPreprocessor {
        TextPreprocessor::new(PreprocessingConfig::default())
    }

    #[test]
    fn test_empty_input_scores_zero() {
        let out = preprocessor().process("");
        assert!(out.text.is_empty());
        assert_eq!(out.quality.semantic_density, 0.0);
    }

    #[test]
    fn test_page_number_is_noise() {
        let pre = preprocessor();
        assert!(pre.is_noise("Page 42"));
        assert!(pre.is_noise("     317     "));
        assert_eq!(pre.clean("Page 42"), "");
    }

    #[test]
    fn test_special_char_runs_are_noise() {
        let pre = preprocessor();
        assert!(pre.is_noise("-----------------"));
        assert!(pre.is_noise("*** ### $$$ %%% @@@"));
    }

    #[test]
    fn test_real_prose_is_not_noise() {
        let pre = preprocessor();
        assert!(!pre.is_noise("The policy covers hospitalization expenses up to the sum insured."));
    }

    #[test]
    fn test_ocr_repair_inserts_spaces() {
        let pre = preprocessor();
        let fixed = pre.repair_artifacts("coverageLimits apply.The insured");
        assert_eq!(fixed, "coverage Limits apply. The insured");
    }

    #[test]
    fn test_ocr_repair_separates_digits() {
        let pre = preprocessor();
        assert_eq!(pre.repair_artifacts("section4 of the act"), "section 4 of the act");
        assert_eq!(pre.repair_artifacts("within 30days"), "within 30 days");
    }

    #[test]
    fn test_whitespace_collapse() {
        let pre = preprocessor();
        let out = pre.collapse_whitespace("a   b\t\tc\n\n\n\n\nd");
        assert_eq!(out, "a b c\n\nd");
    }

    #[test]
    fn test_quality_metrics_in_range() {
        let pre = preprocessor();
        let report =
            pre.score("Insurance policies define coverage limits, waiting periods and exclusions.");
        for value in [
            report.letter_ratio,
            report.content_density,
            report.unique_ratio,
            report.semantic_density,
        ] {
            assert!((0.0..=1.0).contains(&value), "metric out of range: {}", value);
        }
        assert!(report.semantic_density > 0.2);
    }

    #[test]
    fn test_repetition_lowers_unique_ratio() {
        let pre = preprocessor();
        let varied = pre.score("claims coverage premiums deductibles exclusions riders");
        let repeated = pre.score("claims claims claims claims claims claims");
        assert!(repeated.unique_ratio < varied.unique_ratio);
    }

    #[test]
    fn test_stop_word_text_has_zero_content_density() {
        let pre = preprocessor();
        let report = pre.score("the and of to in it");
        assert_eq!(report.content_density, 0.0);
        assert_eq!(report.unique_ratio, 0.0);
    }

    #[test]
    fn test_content_word_set_filters_stop_words() {
        let set = content_word_set("Tell me about the cats");
        assert!(set.contains("cats"));
        assert!(set.contains("tell"));
        assert!(set.contains("about"));
        assert!(!set.contains("the"));
        assert!(!set.contains("me"));
    }

    #[test]
    fn test_unicode_normalization_makes_equivalents_equal() {
        let pre = preprocessor();
        // "é" composed vs. decomposed
        let composed = pre.normalize_unicode("caf\u{e9}");
        let decomposed = pre.normalize_unicode("cafe\u{301}");
        assert_eq!(composed, decomposed);
    }
}
