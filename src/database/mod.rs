mod vector_db;

pub use vector_db::{ChunkHit, VectorStore, VectorStoreError};
