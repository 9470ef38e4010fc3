mod cache;
mod gemini;
mod openai;
mod traits;

pub use cache::CachingEmbedder;
pub use gemini::GeminiProvider;
pub use openai::OpenAIProvider;
pub use traits::CompletionProvider;

use crate::config::{ModelConfig, ProviderKind};
use anyhow::{anyhow, Result};
use std::env;
use std::sync::Arc;

fn gemini_api_key() -> Result<String> {
    env::var("GOOGLE_API_KEY")
        .or_else(|_| env::var("GEMINI_API_KEY"))
        .map_err(|_| anyhow!("GOOGLE_API_KEY or GEMINI_API_KEY must be set for the Gemini provider"))
}

fn openai_api_key() -> Result<String> {
    env::var("OPENAI_API_KEY")
        .map_err(|_| anyhow!("OPENAI_API_KEY must be set for the OpenAI provider"))
}

/// Build a provider from its kind, pulling credentials from the environment.
pub fn create_provider(
    kind: ProviderKind,
    models: &ModelConfig,
) -> Result<Arc<dyn CompletionProvider>> {
    match kind {
        ProviderKind::Gemini => {
            let provider = GeminiProvider::new(gemini_api_key()?, models);
            Ok(Arc::new(provider))
        }
        ProviderKind::OpenAI => {
            let provider = OpenAIProvider::new(openai_api_key()?, models);
            Ok(Arc::new(provider))
        }
    }
}
