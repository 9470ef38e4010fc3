use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // Words and standalone punctuation marks. Punctuation counts toward the
    // budget because generation models spend context on it too.
    static ref TOKEN: Regex = Regex::new(r"\w+|[^\w\s]").unwrap();
}

/// Tokenizer abstraction used for all chunk-size accounting. Any
/// implementation whose counts are proportional to model context cost is
/// acceptable; the chunker never depends on exact token ids.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: &str) -> Vec<String>;

    fn count_tokens(&self, text: &str) -> usize {
        self.tokenize(text).len()
    }

    /// Reassemble tokens into text. Lossy with respect to original spacing,
    /// which is fine for chunk content.
    fn join(&self, tokens: &[String]) -> String {
        tokens.join(" ")
    }
}

/// Default regex tokenizer: words plus punctuation marks. Approximates
/// subword tokenizers closely enough for chunk budgeting without pulling a
/// model vocabulary into the build.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer;

impl WordTokenizer {
    pub fn new() -> Self {
        Self
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        TOKEN.find_iter(text).map(|m| m.as_str().to_string()).collect()
    }
}
