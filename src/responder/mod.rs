
use std::path::Path;

use chrono::Utc;
use tracing::{debug, info};

use crate::chunking::chunk_text;
use crate::config::Config;
use crate::extractor::{document_id, extract_text};
use crate::ollama::OllamaClient;
use crate::store::{ChunkRecord, SearchResult, VectorStore};
use crate::{DocChatError, Result};

/// How many chunks are retrieved as context for a question
const TOP_K: usize = 3;

/// Context used when the store has nothing to retrieve
const EMPTY_STORE_CONTEXT: &str = "No data yet.";

/// Outcome of one document ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub document_id: String,
    pub chunk_count: usize,
}

/// The retrieval-augmented question-answering pipeline.
///
/// Owns the Ollama client and the vector store handle; construct once and
/// pass to every ingest/answer call.
pub struct Responder {
    config: Config,
    client: OllamaClient,
    store: VectorStore,
}

impl Responder {
    #[inline]
    pub async fn new(config: Config) -> Result<Self> {
        let client = OllamaClient::new(&config)
            .map_err(|e| DocChatError::Config(format!("Failed to create Ollama client: {}", e)))?;
        let store = VectorStore::open(&config).await?;

        Ok(Self {
            config,
            client,
            store,
        })
    }

    /// Ingest one PDF: extract text, chunk it, embed all chunks in one
    /// batched call, and replace the document's rows in the store.
    ///
    /// Nothing is persisted when extraction or embedding fails.
    #[inline]
    pub async fn ingest<P: AsRef<Path>>(&mut self, path: P) -> Result<IngestReport> {
        let path = path.as_ref();
        info!("Ingesting document: {}", path.display());

        let text = extract_text(path)?;
        let doc_id = document_id(path);

        let chunks = chunk_text(&text, self.config.chunk_size);
        if chunks.is_empty() {
            debug!("Document {} produced no text, clearing its rows", doc_id);
            self.store.replace_document(&doc_id, Vec::new()).await?;
            return Ok(IngestReport {
                document_id: doc_id,
                chunk_count: 0,
            });
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self
            .client
            .generate_embeddings_batch(&texts)
            .map_err(|e| DocChatError::Embedding(format!("{}", e)))?;

        let created_at = Utc::now().to_rfc3339();
        let records: Vec<ChunkRecord> = chunks
            .into_iter()
            .zip(vectors)
            .map(|(chunk, vector)| ChunkRecord {
                id: format!("{}_{}", doc_id, chunk.chunk_index),
                document_id: doc_id.clone(),
                content: chunk.content,
                chunk_index: chunk.chunk_index as u32,
                vector,
                created_at: created_at.clone(),
            })
            .collect();

        let chunk_count = records.len();
        self.store.replace_document(&doc_id, records).await?;

        info!("Ingested {} chunks from {}", chunk_count, path.display());
        Ok(IngestReport {
            document_id: doc_id,
            chunk_count,
        })
    }

    /// Answer a question from the ingested documents.
    ///
    /// Embeds the question, retrieves the top matches, and forwards them as
    /// context to the chat model; the model's text comes back verbatim. An
    /// empty store falls back to a fixed placeholder context rather than
    /// failing.
    #[inline]
    pub async fn answer(&self, question: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(DocChatError::InvalidQuery);
        }

        debug!("Answering question (length: {})", question.len());

        let question_batch = vec![question.to_string()];
        let mut vectors = self
            .client
            .generate_embeddings_batch(&question_batch)
            .map_err(|e| DocChatError::Embedding(format!("{}", e)))?;
        let query_vector = vectors
            .pop()
            .ok_or_else(|| DocChatError::Embedding("No embedding returned".to_string()))?;

        let results = self.store.search(&query_vector, TOP_K).await?;
        debug!("Retrieved {} context chunks", results.len());

        let context = assemble_context(&results);
        let prompt = build_prompt(&context, question);

        let answer = self
            .client
            .chat(&prompt)
            .map_err(|e| DocChatError::ModelUnavailable(format!("{}", e)))?;

        Ok(answer)
    }

    /// The store owned by this responder, for status reporting
    #[inline]
    pub fn store(&self) -> &VectorStore {
        &self.store
    }
}

/// Join retrieved chunk texts with single spaces, falling back to a fixed
/// placeholder when nothing was retrieved
fn assemble_context(results: &[SearchResult]) -> String {
    if results.is_empty() {
        return EMPTY_STORE_CONTEXT.to_string();
    }

    results
        .iter()
        .map(|r| r.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The fixed prompt template sent to the chat model
fn build_prompt(context: &str, question: &str) -> String {
    format!(
        "Answer the question based on the context below:\nContext: {}\nQuestion: {}\nAnswer:",
        context, question
    )
}
