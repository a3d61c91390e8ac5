// LanceDB-backed vector store module
// Persists (id, chunk text, embedding vector) rows and answers
// nearest-neighbor queries

pub mod vector_store;

pub use vector_store::{SearchResult, VectorStore};

use serde::{Deserialize, Serialize};

/// A chunk row as stored in the vector table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChunkRecord {
    /// Unique row id, `{document_id}_{chunk_index}`
    pub id: String,
    /// Identifier of the source document, used to overwrite on re-ingest
    pub document_id: String,
    /// The chunk text
    pub content: String,
    /// Position of this chunk within its document
    pub chunk_index: u32,
    /// The embedding vector for the chunk text
    pub vector: Vec<f32>,
    /// Timestamp when this row was created
    pub created_at: String,
}
