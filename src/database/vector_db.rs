use crate::chunking::Chunk;
use chrono::Utc;
use log;
use qdrant_client::{
    config::QdrantConfig,
    qdrant::{
        point_id::PointIdOptions, with_payload_selector::SelectorOptions, CreateCollection,
        Distance, PointId, PointStruct, SearchPoints, Value, VectorParams, VectorsConfig,
        WithPayloadSelector,
    },
    Qdrant,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum VectorStoreError {
    #[error("Connection error: {0}")]
    Connection(String),
    #[error("Operation failed: {0}")]
    Operation(String),
    #[error("Vector count {vectors} does not match chunk count {chunks}")]
    CountMismatch { vectors: usize, chunks: usize },
}

/// A search result: the stored chunk payload plus its similarity score.
#[derive(Debug, Clone)]
pub struct ChunkHit {
    pub id: String,
    pub score: f32,
    pub text: String,
    pub ordinal: usize,
    pub quality: Option<f32>,
    pub source: Option<String>,
}

/// Qdrant-backed storage for embedded chunks.
#[derive(Clone)]
pub struct VectorStore {
    client: Arc<Qdrant>,
}

impl VectorStore {
    pub async fn connect(url: &str) -> Result<Self, VectorStoreError> {
        let client = create_client(url).await?;
        Ok(Self {
            client: Arc::new(client),
        })
    }

    pub async fn create_collection(
        &self,
        name: &str,
        vector_size: u64,
    ) -> Result<(), VectorStoreError> {
        let vectors_config = VectorsConfig {
            config: Some(qdrant_client::qdrant::vectors_config::Config::Params(
                VectorParams {
                    size: vector_size,
                    distance: Distance::Cosine.into(),
                    ..Default::default()
                },
            )),
        };

        let request = CreateCollection {
            collection_name: name.to_string(),
            vectors_config: Some(vectors_config),
            ..Default::default()
        };

        match self.client.create_collection(request).await {
            Ok(_) => Ok(()),
            Err(e) if e.to_string().contains("AlreadyExists") => {
                log::info!("Collection {} already exists, skipping creation", name);
                Ok(())
            }
            Err(e) => Err(VectorStoreError::Operation(e.to_string())),
        }
    }

    /// Upsert one point per chunk, paired with its embedding. Returns the
    /// generated point ids in chunk order.
    pub async fn store_chunks(
        &self,
        collection: &str,
        chunks: &[Chunk],
        vectors: Vec<Vec<f32>>,
    ) -> Result<Vec<String>, VectorStoreError> {
        if vectors.len() != chunks.len() {
            return Err(VectorStoreError::CountMismatch {
                vectors: vectors.len(),
                chunks: chunks.len(),
            });
        }

        let indexed_at = Utc::now().to_rfc3339();
        let mut ids = Vec::with_capacity(chunks.len());
        let mut points = Vec::with_capacity(chunks.len());

        for (chunk, vector) in chunks.iter().zip(vectors) {
            let point_id = Uuid::new_v4().to_string();
            ids.push(point_id.clone());

            let mut fields: HashMap<String, serde_json::Value> = HashMap::new();
            fields.insert("text".to_string(), serde_json::json!(chunk.text));
            fields.insert("ordinal".to_string(), serde_json::json!(chunk.ordinal));
            fields.insert("quality".to_string(), serde_json::json!(chunk.quality));
            fields.insert("indexed_at".to_string(), serde_json::json!(indexed_at));
            fields.insert("source".to_string(), serde_json::json!(chunk.source));
            let payload: HashMap<String, Value> = fields
                .into_iter()
                .map(|(k, v)| (k, Value::from(v)))
                .collect();

            points.push(PointStruct {
                id: Some(PointId {
                    point_id_options: Some(PointIdOptions::Uuid(point_id)),
                }),
                vectors: Some(vector.into()),
                payload,
            });
        }

        self.client
            .upsert_points(qdrant_client::qdrant::UpsertPoints {
                collection_name: collection.to_string(),
                points,
                ..Default::default()
            })
            .await
            .map_err(|e| VectorStoreError::Operation(e.to_string()))?;

        Ok(ids)
    }

    pub async fn search_chunks(
        &self,
        collection: &str,
        query_vector: Vec<f32>,
        limit: u64,
    ) -> Result<Vec<ChunkHit>, VectorStoreError> {
        let request = SearchPoints {
            collection_name: collection.to_string(),
            vector: query_vector,
            limit,
            with_payload: Some(WithPayloadSelector {
                selector_options: Some(SelectorOptions::Enable(true)),
            }),
            ..Default::default()
        };

        let results = self
            .client
            .search_points(request)
            .await
            .map_err(|e| VectorStoreError::Operation(e.to_string()))?;

        let hits = results
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(PointIdOptions::Uuid(uuid)) => uuid,
                    _ => String::new(),
                };
                let payload: HashMap<String, serde_json::Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| {
                        (
                            k,
                            serde_json::Value::try_from(v).unwrap_or(serde_json::Value::Null),
                        )
                    })
                    .collect();
                ChunkHit {
                    id,
                    score: point.score,
                    text: payload
                        .get("text")
                        .and_then(|v| v.as_str())
                        .unwrap_or_default()
                        .to_string(),
                    ordinal: payload
                        .get("ordinal")
                        .and_then(|v| v.as_u64())
                        .unwrap_or(0) as usize,
                    quality: payload
                        .get("quality")
                        .and_then(|v| v.as_f64())
                        .map(|q| q as f32),
                    source: payload
                        .get("source")
                        .and_then(|v| v.as_str())
                        .map(|s| s.to_string()),
                }
            })
            .collect();

        Ok(hits)
    }
}

async fn create_client(url: &str) -> Result<Qdrant, VectorStoreError> {
    let clean_url = if url.contains("://") {
        url.split("://").nth(1).unwrap_or(url).to_string()
    } else {
        url.to_string()
    };

    // Port 6333 is the REST port; the client speaks gRPC on 6334.
    let grpc_url = if clean_url.ends_with(":6333") {
        clean_url.replace(":6333", ":6334")
    } else {
        clean_url
    };

    let url_with_scheme = format!("http://{}", grpc_url);
    log::info!("Connecting to Qdrant at {}", url_with_scheme);

    let mut config = QdrantConfig::from_url(&url_with_scheme);
    config.check_compatibility = false;
    config.timeout = Duration::from_secs(30);
    config.connect_timeout = Duration::from_secs(10);

    let client =
        Qdrant::new(config).map_err(|e| VectorStoreError::Connection(e.to_string()))?;

    match client.list_collections().await {
        Ok(_) => {
            log::info!("Successfully connected to Qdrant");
            Ok(client)
        }
        Err(e) => {
            log::error!("Qdrant connection test failed: {}", e);
            Err(VectorStoreError::Connection(e.to_string()))
        }
    }
}
