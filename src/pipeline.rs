use crate::answer::{AnswerGenerator, AnswerResponse};
use crate::chunking::SmartChunker;
use crate::config::PipelineConfig;
use crate::document::{self, DocumentError};
use crate::preprocessing::TextPreprocessor;
use crate::providers::CompletionProvider;
use crate::retrieval::Retriever;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Document(#[from] DocumentError),
    #[error("Document produced no usable text")]
    EmptyDocument,
    #[error("No indexable chunks after filtering")]
    NoChunks,
    #[error("Indexing failed: {0}")]
    Indexing(String),
    #[error("Retrieval failed: {0}")]
    Retrieval(String),
    #[error("Answer generation failed: {0}")]
    Generation(String),
}

/// What happened to a document on its way into the index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    pub source: String,
    pub characters_extracted: usize,
    pub chunks_created: usize,
    pub chunks_indexed: usize,
    pub semantic_density: f32,
}

/// The full question-answering pipeline: extract, clean, chunk, index,
/// retrieve, optimize, generate. Components are wired once at startup and
/// shared across requests.
pub struct QaPipeline {
    config: PipelineConfig,
    preprocessor: TextPreprocessor,
    chunker: SmartChunker,
    retriever: Retriever,
    generator: AnswerGenerator,
    http: reqwest::Client,
}

impl QaPipeline {
    pub fn new(
        config: PipelineConfig,
        retriever: Retriever,
        generation_provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            preprocessor: TextPreprocessor::new(config.preprocessing.clone()),
            chunker: SmartChunker::new(config.chunking.clone(), config.preprocessing.clone()),
            generator: AnswerGenerator::new(
                generation_provider,
                config.answer.clone(),
                config.preprocessing.clone(),
            ),
            retriever,
            config,
            http: reqwest::Client::new(),
        }
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Extract text from a local file without indexing it. Useful for
    /// previewing what the pipeline would see.
    pub async fn extract(&self, path: &Path) -> Result<String, PipelineError> {
        let document = document::extract_text(path).await?;
        let output = self.preprocessor.process(&document.text);
        if output.text.is_empty() {
            return Err(PipelineError::EmptyDocument);
        }
        Ok(output.text)
    }

    /// Run a local file through the full ingestion path: extract, clean,
    /// chunk, embed, index.
    pub async fn process_document(&self, path: &Path) -> Result<IngestReport, PipelineError> {
        let document = document::extract_text(path).await?;
        self.ingest(&document.source, &document.text).await
    }

    /// Download a document by URL and ingest it.
    pub async fn process_url(&self, url: &str) -> Result<IngestReport, PipelineError> {
        let path = document::download_document(&self.http, url).await?;
        let document = document::extract_text(&path).await?;
        let report = self.ingest(url, &document.text).await;
        if let Err(e) = tokio::fs::remove_file(&path).await {
            log::warn!("Failed to remove temp file {:?}: {}", path, e);
        }
        report
    }

    async fn ingest(&self, source: &str, raw_text: &str) -> Result<IngestReport, PipelineError> {
        let output = self.preprocessor.process(raw_text);
        if output.text.is_empty() {
            return Err(PipelineError::EmptyDocument);
        }

        let chunks = self.chunker.chunk(&output.text, source);
        if chunks.is_empty() {
            return Err(PipelineError::NoChunks);
        }
        let chunks_created = chunks.len();

        let ids = self
            .retriever
            .index_chunks(&chunks)
            .await
            .map_err(|e| PipelineError::Indexing(e.to_string()))?;

        log::info!(
            "Ingested {}: {} chunks created, {} indexed",
            source,
            chunks_created,
            ids.len()
        );
        Ok(IngestReport {
            source: source.to_string(),
            characters_extracted: output.text.chars().count(),
            chunks_created,
            chunks_indexed: ids.len(),
            semantic_density: output.quality.semantic_density,
        })
    }

    /// Retrieve candidates for a question without generating an answer.
    pub async fn query(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<Vec<crate::answer::Candidate>, PipelineError> {
        self.retriever
            .retrieve(question, top_k)
            .await
            .map_err(|e| PipelineError::Retrieval(e.to_string()))
    }

    /// Answer one question end to end.
    pub async fn answer_question(
        &self,
        question: &str,
        top_k: Option<usize>,
    ) -> Result<AnswerResponse, PipelineError> {
        let candidates = self.query(question, top_k).await?;
        self.generator
            .answer(question, &candidates)
            .await
            .map_err(|e| PipelineError::Generation(e.to_string()))
    }

    /// Answer a batch of questions sequentially. Per-question failures are
    /// recorded in place so one bad question does not sink the batch.
    pub async fn answer_all(
        &self,
        questions: &[String],
        top_k: Option<usize>,
    ) -> Vec<Result<AnswerResponse, PipelineError>> {
        let mut results = Vec::with_capacity(questions.len());
        for question in questions {
            let result = self.answer_question(question, top_k).await;
            if let Err(e) = &result {
                log::error!("Failed to answer {:?}: {}", question, e);
            }
            results.push(result);
        }
        results
    }
}
