use crate::config::ModelConfig;
use crate::providers::traits::CompletionProvider;
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini provider over the Generative Language REST API.
#[derive(Clone)]
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    generation_model: String,
    embedding_model: String,
}

impl GeminiProvider {
    pub fn new(api_key: String, models: &ModelConfig) -> Self {
        Self {
            api_key,
            client: Client::new(),
            generation_model: models.gemini_generation_model.clone(),
            embedding_model: models.gemini_embedding_model.clone(),
        }
    }

    fn embedding_url(&self, operation: &str) -> String {
        // Embedding model ids already carry the "models/" prefix.
        format!("{}/{}:{}", API_BASE, self.embedding_model, operation)
    }

    fn parse_embedding(value: &Value) -> Result<Vec<f32>> {
        value["values"]
            .as_array()
            .ok_or_else(|| anyhow!("Missing embedding values in Gemini response"))?
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| anyhow!("Non-numeric embedding value"))
            })
            .collect()
    }
}

#[async_trait]
impl CompletionProvider for GeminiProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/models/{}:generateContent",
            API_BASE, self.generation_model
        );
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "contents": [{
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }]
            }))
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;
        response_json["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| anyhow!("Invalid Gemini generation response format"))
    }

    async fn generate_embedding(&self, text: &str) -> Result<Vec<f32>> {
        let response = self
            .client
            .post(self.embedding_url("embedContent"))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({
                "model": self.embedding_model,
                "content": { "parts": [{ "text": text }] },
                "taskType": "RETRIEVAL_DOCUMENT"
            }))
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;
        Self::parse_embedding(&response_json["embedding"])
    }

    async fn generate_batch_embeddings(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let requests: Vec<Value> = texts
            .iter()
            .map(|text| {
                json!({
                    "model": self.embedding_model,
                    "content": { "parts": [{ "text": text }] },
                    "taskType": "RETRIEVAL_DOCUMENT"
                })
            })
            .collect();

        let response = self
            .client
            .post(self.embedding_url("batchEmbedContents"))
            .query(&[("key", self.api_key.as_str())])
            .json(&json!({ "requests": requests }))
            .send()
            .await?
            .error_for_status()?;

        let response_json: Value = response.json().await?;
        let embeddings = response_json["embeddings"]
            .as_array()
            .ok_or_else(|| anyhow!("Missing embeddings in Gemini batch response"))?;
        if embeddings.len() != texts.len() {
            return Err(anyhow!(
                "Gemini returned {} embeddings for {} texts",
                embeddings.len(),
                texts.len()
            ));
        }
        embeddings.iter().map(Self::parse_embedding).collect()
    }

    fn model_info(&self) -> String {
        format!("gemini:{}", self.generation_model)
    }
}
