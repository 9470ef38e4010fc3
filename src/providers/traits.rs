use anyhow::Result;
use async_trait::async_trait;

/// External model service used for generation and embeddings. Implementations
/// own their HTTP client and credentials; callers treat them as opaque,
/// independently-failing collaborators.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts. The default embeds sequentially; providers with
    /// a batch endpoint override this.
    async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.generate_embedding(text).await?);
        }
        Ok(embeddings)
    }

    fn model_info(&self) -> String;
}
