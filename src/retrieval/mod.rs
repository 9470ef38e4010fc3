use crate::answer::Candidate;
use crate::chunking::Chunk;
use crate::config::RetrievalConfig;
use crate::database::VectorStore;
use crate::providers::{CachingEmbedder, CompletionProvider};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Embeds questions and searches the vector store for candidate chunks.
/// Owns the indexing path as well so chunk and query embeddings always come
/// from the same provider.
pub struct Retriever {
    store: VectorStore,
    embedder: Arc<dyn CompletionProvider>,
    query_cache: CachingEmbedder,
    collection: String,
    config: RetrievalConfig,
}

impl Retriever {
    pub fn new(
        store: VectorStore,
        embedder: Arc<dyn CompletionProvider>,
        collection: String,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            query_cache: CachingEmbedder::new(embedder.clone()),
            store,
            embedder,
            collection,
            config,
        }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Embed and upsert the chunks. Creates the collection on first use,
    /// sizing it from the embeddings themselves. Returns point ids.
    pub async fn index_chunks(&self, chunks: &[Chunk]) -> Result<Vec<String>> {
        if chunks.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let vectors = self
            .embedder
            .generate_batch_embeddings(&texts)
            .await
            .context("Failed to embed chunks")?;

        let dimension = vectors.first().map(|v| v.len()).unwrap_or(0) as u64;
        self.store
            .create_collection(&self.collection, dimension)
            .await
            .context("Failed to ensure collection")?;

        let ids = self
            .store
            .store_chunks(&self.collection, chunks, vectors)
            .await
            .context("Failed to store chunks")?;

        log::info!(
            "Indexed {} chunks into collection {}",
            ids.len(),
            self.collection
        );
        Ok(ids)
    }

    /// Fetch the top candidates for a question, in similarity order.
    pub async fn retrieve(&self, question: &str, top_k: Option<usize>) -> Result<Vec<Candidate>> {
        let limit = effective_top_k(&self.config, top_k);
        let query_vector = self
            .query_cache
            .embed(question)
            .await
            .context("Failed to embed question")?;

        let hits = self
            .store
            .search_chunks(&self.collection, query_vector, limit as u64)
            .await
            .context("Vector search failed")?;

        Ok(hits
            .into_iter()
            .map(|hit| Candidate {
                text: hit.text,
                vector_score: hit.score,
                ordinal: hit.ordinal,
                quality: hit.quality,
                source: hit.source.unwrap_or_default(),
            })
            .collect())
    }

}

/// Resolve the requested result count against configured bounds.
fn effective_top_k(config: &RetrievalConfig, requested: Option<usize>) -> usize {
    requested
        .unwrap_or(config.default_top_k)
        .clamp(1, config.max_top_k)
}
