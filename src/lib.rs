pub mod answer;
pub mod api;
pub mod chunking;
pub mod config;
pub mod database;
pub mod document;
pub mod pipeline;
pub mod preprocessing;
pub mod providers;
pub mod retrieval;

// Re-export commonly used items
pub use answer::{AnswerGenerator, AnswerResponse, Candidate, ContextOptimizer};
pub use chunking::{Chunk, SmartChunker};
pub use config::PipelineConfig;
pub use pipeline::{IngestReport, QaPipeline};
pub use preprocessing::TextPreprocessor;
pub use retrieval::Retriever;
