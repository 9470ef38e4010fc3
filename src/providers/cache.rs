use crate::providers::traits::CompletionProvider;
use anyhow::Result;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

const DEFAULT_CAPACITY: usize = 512;

/// Bounded LRU cache in front of a provider's embedding endpoint. Question
/// texts repeat across requests; chunk texts generally do not, so only the
/// query path goes through here.
pub struct CachingEmbedder {
    provider: Arc<dyn CompletionProvider>,
    cache: Mutex<LruCache<String, Vec<f32>>>,
}

impl CachingEmbedder {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::with_capacity(provider, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(provider: Arc<dyn CompletionProvider>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap_or(NonZeroUsize::MIN);
        Self {
            provider,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(hit) = self.cache.lock().get(text) {
            return Ok(hit.clone());
        }
        let embedding = self.provider.generate_embedding(text).await?;
        self.cache
            .lock()
            .put(text.to_string(), embedding.clone());
        Ok(embedding)
    }
}
