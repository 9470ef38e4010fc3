mod tokenizer;

pub use tokenizer::{Tokenizer, WordTokenizer};

use crate::config::{ChunkingConfig, PreprocessingConfig};
use crate::preprocessing::TextPreprocessor;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref SENTENCE_END: Regex = Regex::new(r"[.!?]+\s+").unwrap();
}

/// An ordered segment of a document, sized for a model's input budget.
/// Immutable once created. Ordinals reflect position in the pre-filter chunk
/// sequence, so they stay meaningful (and possibly non-contiguous) after
/// low-quality chunks are dropped.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub ordinal: usize,
    pub token_count: usize,
    /// Semantic density in [0,1], computed once at creation.
    pub quality: f32,
    /// Source document identifier. A back-link, not an ownership edge.
    pub source: String,
}

// A sentence (or hard-split slice of one) tagged with its paragraph context.
struct Segment {
    tokens: Vec<String>,
    paragraph_start: bool,
    paragraph_tokens: usize,
}

/// Token-aware chunker producing bounded, overlapping, quality-filtered
/// chunks. Sentences are never split except when a single sentence alone
/// exceeds the token budget.
pub struct SmartChunker {
    config: ChunkingConfig,
    preprocessing: PreprocessingConfig,
    tokenizer: Box<dyn Tokenizer>,
    preprocessor: TextPreprocessor,
}

impl SmartChunker {
    pub fn new(config: ChunkingConfig, preprocessing: PreprocessingConfig) -> Self {
        Self {
            preprocessor: TextPreprocessor::new(preprocessing.clone()),
            config,
            preprocessing,
            tokenizer: Box::new(WordTokenizer::new()),
        }
    }

    pub fn with_tokenizer(mut self, tokenizer: Box<dyn Tokenizer>) -> Self {
        self.tokenizer = tokenizer;
        self
    }

    /// Chunk cleaned text into an ordered sequence. Empty input yields an
    /// empty sequence, not an error.
    pub fn chunk(&self, text: &str, source: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        if !self.config.use_smart_chunking {
            return self.basic_chunk(text, source);
        }

        let segments = self.split_segments(text);
        let assembled = self.assemble(segments);

        let mut chunks = Vec::with_capacity(assembled.len());
        for (ordinal, tokens) in assembled.into_iter().enumerate() {
            let text = self.tokenizer.join(&tokens);
            let quality = self.preprocessor.score(&text).semantic_density;
            chunks.push(Chunk {
                text,
                ordinal,
                token_count: tokens.len(),
                quality,
                source: source.to_string(),
            });
        }

        if self.preprocessing.enable_quality_filtering {
            chunks.retain(|c| {
                c.quality >= self.preprocessing.min_semantic_density
                    && c.token_count >= self.config.min_chunk_tokens
            });
        }
        chunks
    }

    // Paragraphs on blank lines, sentences on terminal punctuation. A
    // sentence longer than max_tokens is hard-split at token boundaries.
    fn split_segments(&self, text: &str) -> Vec<Segment> {
        let mut segments = Vec::new();

        for paragraph in text.split("\n\n") {
            let paragraph = paragraph.trim();
            if paragraph.is_empty() {
                continue;
            }
            let paragraph_tokens = self.tokenizer.count_tokens(paragraph);
            let mut first_in_paragraph = true;

            for sentence in split_sentences(paragraph) {
                let tokens = self.tokenizer.tokenize(sentence);
                if tokens.is_empty() {
                    continue;
                }
                if tokens.len() <= self.config.max_tokens {
                    segments.push(Segment {
                        tokens,
                        paragraph_start: first_in_paragraph,
                        paragraph_tokens,
                    });
                    first_in_paragraph = false;
                } else {
                    for window in tokens.chunks(self.config.max_tokens) {
                        segments.push(Segment {
                            tokens: window.to_vec(),
                            paragraph_start: first_in_paragraph,
                            paragraph_tokens,
                        });
                        first_in_paragraph = false;
                    }
                }
            }
        }
        segments
    }

    // Greedy accumulation with token-measured overlap carried across chunk
    // boundaries. The carry is trimmed so the incoming segment always fits
    // within max_tokens.
    fn assemble(&self, segments: Vec<Segment>) -> Vec<Vec<String>> {
        let max = self.config.max_tokens;
        let mut chunks: Vec<Vec<String>> = Vec::new();
        let mut current: Vec<String> = Vec::new();

        for segment in segments {
            if !current.is_empty() && current.len() + segment.tokens.len() > max {
                let carry = if self.skip_overlap(&segment) {
                    0
                } else {
                    self.config
                        .overlap_tokens
                        .min(current.len())
                        .min(max.saturating_sub(segment.tokens.len()))
                };
                let tail = current[current.len() - carry..].to_vec();
                chunks.push(std::mem::replace(&mut current, tail));
            }
            current.extend(segment.tokens);
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        chunks
    }

    // Overlap is skipped when the next segment opens a paragraph that can
    // stand alone, i.e. fills at least half a chunk by itself.
    fn skip_overlap(&self, segment: &Segment) -> bool {
        segment.paragraph_start && segment.paragraph_tokens >= self.config.max_tokens / 2
    }

    // Plain sentence accumulation by character budget, used when smart
    // chunking is toggled off. Budgets approximate tokens at four characters
    // each.
    fn basic_chunk(&self, text: &str, source: &str) -> Vec<Chunk> {
        let max_chars = self.config.max_tokens * 4;
        let overlap_chars = self.config.overlap_tokens * 4;

        let mut pieces: Vec<String> = Vec::new();
        let mut current = String::new();
        for paragraph in text.split("\n\n") {
            for sentence in split_sentences(paragraph.trim()) {
                if current.is_empty() {
                    current = sentence.to_string();
                } else if current.chars().count() + sentence.chars().count() + 1 <= max_chars {
                    current.push(' ');
                    current.push_str(sentence);
                } else {
                    pieces.push(std::mem::take(&mut current));
                    current = sentence.to_string();
                }
            }
        }
        if !current.is_empty() {
            pieces.push(current);
        }

        let mut chunks = Vec::with_capacity(pieces.len());
        for (ordinal, piece) in pieces.iter().enumerate() {
            let text = if ordinal > 0 && overlap_chars > 0 {
                let prev = &pieces[ordinal - 1];
                let tail: String = prev
                    .chars()
                    .skip(prev.chars().count().saturating_sub(overlap_chars))
                    .collect();
                match tail.find(' ') {
                    Some(cut) => format!("{} {}", tail[cut + 1..].trim(), piece),
                    None => piece.clone(),
                }
            } else {
                piece.clone()
            };
            let quality = self.preprocessor.score(&text).semantic_density;
            chunks.push(Chunk {
                token_count: self.tokenizer.count_tokens(&text),
                text,
                ordinal,
                quality,
                source: source.to_string(),
            });
        }
        chunks
    }
}

// Sentence boundaries on terminal punctuation followed by whitespace; the
// punctuation stays with the preceding sentence.
fn split_sentences(paragraph: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for boundary in SENTENCE_END.find_iter(paragraph) {
        let sentence = paragraph[start..boundary.end()].trim();
        if !sentence.is_empty() {
            out.push(sentence);
        }
        start = boundary.end();
    }
    let rest = paragraph[start..].trim();
    if !rest.is_empty() {
        out.push(rest);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunker(max_tokens: usize, overlap_tokens: usize) -> SmartChunker {
        let config = ChunkingConfig {
            max_tokens,
            overlap_tokens,
            min_chunk_tokens: 1,
            use_smart_chunking: true,
        };
        let mut preprocessing = PreprocessingConfig::default();
        preprocessing.enable_quality_filtering = false;
        SmartChunker::new(config, preprocessing)
    }

    // 9 distinct words plus a period: exactly 10 tokens per sentence.
    fn sentences(n: usize) -> String {
        (0..n)
            .map(|i| {
                format!(
                    "item{} alpha beta gamma delta epsilon zeta eta theta.",
                    i
                )
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    #[test]
    fn test_empty_input_yields_no_chunks() {
        let c = chunker(400, 50);
        assert!(c.chunk("", "doc").is_empty());
        assert!(c.chunk("   \n\n  ", "doc").is_empty());
    }

    #[test]
    fn test_short_text_single_chunk_no_overlap() {
        let c = chunker(400, 50);
        let chunks = c.chunk("The policy covers dental procedures. Claims are settled monthly.", "doc");
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].ordinal, 0);
        assert!(chunks[0].token_count <= 400);
    }

    #[test]
    fn test_token_budget_respected() {
        let c = chunker(50, 10);
        let chunks = c.chunk(&sentences(40), "doc");
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(
                chunk.token_count <= 50,
                "chunk {} has {} tokens",
                chunk.ordinal,
                chunk.token_count
            );
        }
    }

    #[test]
    fn test_pathological_sentence_is_hard_split() {
        let c = chunker(50, 10);
        // One 200-word sentence with no internal punctuation.
        let long: String = (0..200).map(|i| format!("word{} ", i)).collect();
        let chunks = c.chunk(long.trim(), "doc");
        assert!(!chunks.is_empty());
        for chunk in &chunks {
            assert!(chunk.token_count <= 50);
        }
    }

    #[test]
    fn test_adjacent_overlap_bounded() {
        let c = chunker(50, 10);
        let tokenizer = WordTokenizer::new();
        let chunks = c.chunk(&sentences(40), "doc");
        for pair in chunks.windows(2) {
            let prev = tokenizer.tokenize(&pair[0].text);
            let next = tokenizer.tokenize(&pair[1].text);
            // Longest prefix of `next` that is a suffix of `prev`.
            let mut shared = 0;
            for k in 1..=prev.len().min(next.len()) {
                if prev[prev.len() - k..] == next[..k] {
                    shared = k;
                }
            }
            assert!(shared <= 10, "overlap of {} tokens", shared);
        }
    }

    #[test]
    fn test_thousand_tokens_make_three_chunks() {
        // 100 sentences of 10 tokens each = 1000 tokens.
        let c = chunker(400, 50);
        let tokenizer = WordTokenizer::new();
        let chunks = c.chunk(&sentences(100), "doc");
        assert_eq!(chunks.len(), 3);

        // Chunk 2 opens with the trailing 50 tokens of chunk 1.
        let first = tokenizer.tokenize(&chunks[0].text);
        let second = tokenizer.tokenize(&chunks[1].text);
        assert_eq!(first[first.len() - 50..], second[..50]);
    }

    #[test]
    fn test_ordinals_preserved_after_filtering() {
        let config = ChunkingConfig {
            max_tokens: 30,
            overlap_tokens: 0,
            min_chunk_tokens: 1,
            use_smart_chunking: true,
        };
        let c = SmartChunker::new(config, PreprocessingConfig::default());
        // Prose paragraphs with a numeric noise paragraph in between; the
        // noise chunk scores low and is dropped, leaving a gap in ordinals.
        let digits: String = (0..25).map(|i| format!("{} ", 10 + i)).collect();
        let text = format!(
            "{}\n\n{}\n\n{}",
            "Hospital cover includes surgery anesthesia and aftercare benefits entirely.",
            digits.trim(),
            "Dental cover includes extraction implants orthodontics and cleaning benefits."
        );
        let chunks = c.chunk(&text, "doc");
        let ordinals: Vec<usize> = chunks.iter().map(|c| c.ordinal).collect();
        // The all-digit middle chunk scores zero density and is dropped.
        assert_eq!(ordinals, vec![0, 2]);
        assert!(chunks.iter().all(|c| c.quality >= 0.2));
    }

    #[test]
    fn test_standalone_paragraph_skips_overlap() {
        let c = chunker(40, 10);
        let tokenizer = WordTokenizer::new();
        // Two paragraphs, each large enough to stand alone.
        let text = format!("{}\n\n{}", sentences(4), sentences(4).replace("item", "entry"));
        let chunks = c.chunk(&text, "doc");
        assert_eq!(chunks.len(), 2);
        let first = tokenizer.tokenize(&chunks[0].text);
        let second = tokenizer.tokenize(&chunks[1].text);
        assert_ne!(first[first.len() - 1..], second[..1]);
        assert!(second[0].starts_with("entry"));
    }

    #[test]
    fn test_basic_chunking_fallback() {
        let config = ChunkingConfig {
            max_tokens: 25,
            overlap_tokens: 5,
            min_chunk_tokens: 1,
            use_smart_chunking: false,
        };
        let mut preprocessing = PreprocessingConfig::default();
        preprocessing.enable_quality_filtering = false;
        let c = SmartChunker::new(config, preprocessing);
        let chunks = c.chunk(&sentences(10), "doc");
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| !c.text.is_empty()));
    }

    #[test]
    fn test_quality_scores_in_unit_interval() {
        let c = chunker(60, 10);
        for chunk in c.chunk(&sentences(30), "doc") {
            assert!((0.0..=1.0).contains(&chunk.quality));
        }
    }
}
