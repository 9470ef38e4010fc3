use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

/// Chunking parameters. All token counts are measured with the pipeline's
/// tokenizer abstraction, not characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Maximum tokens per chunk.
    pub max_tokens: usize,
    /// Tokens re-included from the previous chunk.
    pub overlap_tokens: usize,
    /// Chunks shorter than this are dropped as too small to be meaningful.
    pub min_chunk_tokens: usize,
    /// Token-aware chunking with quality filtering; when off, falls back to
    /// plain sentence accumulation by character budget.
    pub use_smart_chunking: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            max_tokens: 400,
            overlap_tokens: 50,
            min_chunk_tokens: 20,
            use_smart_chunking: true,
        }
    }
}

impl ChunkingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_tokens: env_or("CHUNK_MAX_TOKENS", defaults.max_tokens),
            overlap_tokens: env_or("CHUNK_OVERLAP_TOKENS", defaults.overlap_tokens),
            min_chunk_tokens: env_or("CHUNK_MIN_TOKENS", defaults.min_chunk_tokens),
            use_smart_chunking: env_or("USE_SMART_CHUNKING", defaults.use_smart_chunking),
        }
    }
}

/// Text preprocessing and quality scoring parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreprocessingConfig {
    /// Minimum composite semantic density for a chunk to survive filtering.
    pub min_semantic_density: f32,
    /// Text with a letter-to-character ratio below this is treated as noise.
    pub min_letter_ratio: f32,
    /// Text shorter than this many characters is treated as noise.
    pub min_chunk_chars: usize,
    /// Apply NFKD unicode normalization before any other pass.
    pub normalize_unicode: bool,
    /// Master switch for quality filtering of chunks.
    pub enable_quality_filtering: bool,
    /// Weights of the composite semantic density score.
    pub letter_weight: f32,
    pub content_weight: f32,
    pub unique_weight: f32,
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            min_semantic_density: 0.2,
            min_letter_ratio: 0.3,
            min_chunk_chars: 15,
            normalize_unicode: true,
            enable_quality_filtering: true,
            letter_weight: 0.2,
            content_weight: 0.4,
            unique_weight: 0.4,
        }
    }
}

impl PreprocessingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            min_semantic_density: env_or("MIN_SEMANTIC_DENSITY", defaults.min_semantic_density),
            min_letter_ratio: env_or("MIN_LETTER_RATIO", defaults.min_letter_ratio),
            min_chunk_chars: env_or("MIN_CHUNK_CHARS", defaults.min_chunk_chars),
            normalize_unicode: env_or("NORMALIZE_UNICODE", defaults.normalize_unicode),
            enable_quality_filtering: env_or(
                "ENABLE_QUALITY_FILTERING",
                defaults.enable_quality_filtering,
            ),
            letter_weight: env_or("DENSITY_LETTER_WEIGHT", defaults.letter_weight),
            content_weight: env_or("DENSITY_CONTENT_WEIGHT", defaults.content_weight),
            unique_weight: env_or("DENSITY_UNIQUE_WEIGHT", defaults.unique_weight),
        }
    }
}

/// Answer generation and context selection parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerConfig {
    /// Maximum chunks passed to the generation model.
    pub max_context_chunks: usize,
    /// Candidates scoring below this relevance are excluded.
    pub min_relevance_threshold: f32,
    /// Weight of relevance in the combined ranking score; quality gets the
    /// complement. 0.5 weighs them equally.
    pub relevance_weight: f32,
    /// When off, the optimizer always takes the fallback path.
    pub enable_advanced_filtering: bool,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            max_context_chunks: 3,
            min_relevance_threshold: 0.1,
            relevance_weight: 0.5,
            enable_advanced_filtering: true,
        }
    }
}

impl AnswerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_context_chunks: env_or("MAX_CONTEXT_CHUNKS", defaults.max_context_chunks),
            min_relevance_threshold: env_or(
                "MIN_RELEVANCE_THRESHOLD",
                defaults.min_relevance_threshold,
            ),
            relevance_weight: env_or("RELEVANCE_WEIGHT", defaults.relevance_weight),
            enable_advanced_filtering: env_or(
                "ENABLE_ADVANCED_FILTERING",
                defaults.enable_advanced_filtering,
            ),
        }
    }
}

/// Retrieval parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Candidates fetched per question when the request does not say.
    pub default_top_k: usize,
    /// Hard cap on requested top_k.
    pub max_top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            default_top_k: 5,
            max_top_k: 10,
        }
    }
}

impl RetrievalConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            default_top_k: env_or("RETRIEVAL_TOP_K", defaults.default_top_k),
            max_top_k: env_or("RETRIEVAL_MAX_TOP_K", defaults.max_top_k),
        }
    }
}

/// Which external model service backs an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Gemini,
    OpenAI,
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gemini" => Ok(ProviderKind::Gemini),
            "openai" => Ok(ProviderKind::OpenAI),
            other => Err(format!("Unknown provider: {}", other)),
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderKind::Gemini => write!(f, "gemini"),
            ProviderKind::OpenAI => write!(f, "openai"),
        }
    }
}

/// Model selection. Embedding and generation providers are independent so a
/// deployment can mix services.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub embedding_provider: ProviderKind,
    pub generation_provider: ProviderKind,
    pub gemini_embedding_model: String,
    pub gemini_generation_model: String,
    pub openai_embedding_model: String,
    pub openai_generation_model: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            embedding_provider: ProviderKind::Gemini,
            generation_provider: ProviderKind::Gemini,
            gemini_embedding_model: "models/embedding-001".to_string(),
            gemini_generation_model: "gemini-1.5-flash".to_string(),
            openai_embedding_model: "text-embedding-ada-002".to_string(),
            openai_generation_model: "gpt-3.5-turbo".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            embedding_provider: env_or("EMBEDDING_PROVIDER", defaults.embedding_provider),
            generation_provider: env_or("GENERATION_PROVIDER", defaults.generation_provider),
            gemini_embedding_model: env::var("GEMINI_EMBEDDING_MODEL")
                .unwrap_or(defaults.gemini_embedding_model),
            gemini_generation_model: env::var("GEMINI_GENERATION_MODEL")
                .unwrap_or(defaults.gemini_generation_model),
            openai_embedding_model: env::var("OPENAI_EMBEDDING_MODEL")
                .unwrap_or(defaults.openai_embedding_model),
            openai_generation_model: env::var("OPENAI_GENERATION_MODEL")
                .unwrap_or(defaults.openai_generation_model),
        }
    }
}

/// Process-wide configuration, built once at startup and passed explicitly to
/// each component. Read-only after construction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub chunking: ChunkingConfig,
    pub preprocessing: PreprocessingConfig,
    pub answer: AnswerConfig,
    pub retrieval: RetrievalConfig,
    pub models: ModelConfig,
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        Self {
            chunking: ChunkingConfig::from_env(),
            preprocessing: PreprocessingConfig::from_env(),
            answer: AnswerConfig::from_env(),
            retrieval: RetrievalConfig::from_env(),
            models: ModelConfig::from_env(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chunking_defaults() {
        let config = ChunkingConfig::default();
        assert_eq!(config.max_tokens, 400);
        assert_eq!(config.overlap_tokens, 50);
        assert!(config.use_smart_chunking);
    }

    #[test]
    fn test_answer_defaults() {
        let config = AnswerConfig::default();
        assert_eq!(config.max_context_chunks, 3);
        assert!((config.relevance_weight - 0.5).abs() < f32::EPSILON);
        assert!(config.enable_advanced_filtering);
    }

    #[test]
    fn test_provider_kind_parsing() {
        assert_eq!("gemini".parse::<ProviderKind>().unwrap(), ProviderKind::Gemini);
        assert_eq!("OpenAI".parse::<ProviderKind>().unwrap(), ProviderKind::OpenAI);
        assert!("llama".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_density_weights_sum_to_one() {
        let config = PreprocessingConfig::default();
        let sum = config.letter_weight + config.content_weight + config.unique_weight;
        assert!((sum - 1.0).abs() < 1e-6);
    }
}
