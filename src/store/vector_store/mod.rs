
use super::ChunkRecord;
use crate::{DocChatError, config::Config};
use arrow::array::{
    Array, FixedSizeListArray, Float32Array, RecordBatchIterator, StringArray, UInt32Array,
};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use lancedb::{
    Connection,
    query::{ExecutableQuery, QueryBase, Select},
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

const TABLE_NAME: &str = "chunks";

/// Vector database store using LanceDB for similarity search
pub struct VectorStore {
    connection: Connection,
    table_name: String,
    vector_dimension: usize,
}

/// Search result from vector similarity search, best-first
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub id: String,
    pub document_id: String,
    pub content: String,
    pub chunk_index: u32,
    pub distance: f32,
    pub similarity_score: f32,
}

impl VectorStore {
    /// Open (or create) the store under the configured vectors directory.
    ///
    /// The table schema is created on first use with the configured
    /// embedding dimension; on later opens the dimension is read back from
    /// the existing table so stored vectors and queries stay comparable.
    #[inline]
    pub async fn open(config: &Config) -> Result<Self, DocChatError> {
        let db_path = config.vector_database_path();
        debug!("Initializing LanceDB at path: {:?}", db_path);

        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DocChatError::Store(format!("Failed to create vector database directory: {}", e))
            })?;
        }

        let uri = format!("file://{}", db_path.display());

        let connection = lancedb::connect(&uri)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to connect to LanceDB: {}", e)))?;

        let mut store = Self {
            connection,
            table_name: TABLE_NAME.to_string(),
            vector_dimension: config.ollama.embedding_dimension as usize,
        };

        store.initialize_table().await?;

        info!("Vector store initialized at {:?}", db_path);
        Ok(store)
    }

    /// Create the chunks table if missing, or adopt the dimension of the
    /// existing one
    async fn initialize_table(&mut self) -> Result<(), DocChatError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to list tables: {}", e)))?;

        if table_names.contains(&self.table_name) {
            match self.detect_existing_vector_dimension().await {
                Ok(dim) => {
                    debug!("Detected existing vector dimension: {}", dim);
                    self.vector_dimension = dim;
                }
                Err(e) => {
                    warn!(
                        "Could not detect vector dimension from existing table: {}",
                        e
                    );
                }
            }
            return Ok(());
        }

        let schema = self.create_schema(self.vector_dimension);

        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to create table: {}", e)))?;

        info!(
            "Chunks table created with {} dimensions",
            self.vector_dimension
        );
        Ok(())
    }

    async fn detect_existing_vector_dimension(&self) -> Result<usize, DocChatError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to open existing table: {}", e)))?;

        let schema = table
            .schema()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to get table schema: {}", e)))?;

        for field in schema.fields() {
            if field.name() == "vector" {
                if let DataType::FixedSizeList(_, size) = field.data_type() {
                    return Ok(*size as usize);
                }
            }
        }

        Err(DocChatError::Store(
            "Could not find vector column or determine dimension".to_string(),
        ))
    }

    fn create_schema(&self, vector_dim: usize) -> Arc<Schema> {
        Arc::new(Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new(
                "vector",
                DataType::FixedSizeList(
                    Arc::new(Field::new("item", DataType::Float32, false)),
                    vector_dim as i32,
                ),
                false,
            ),
            Field::new("document_id", DataType::Utf8, false),
            Field::new("content", DataType::Utf8, false),
            Field::new("chunk_index", DataType::UInt32, false),
            Field::new("created_at", DataType::Utf8, false),
        ]))
    }

    /// Replace all chunks of one document with a fresh batch.
    ///
    /// The document's previous rows are deleted first, so re-ingesting an
    /// identical document overwrites its entries instead of growing the
    /// store. Passing an empty batch just clears the document.
    #[inline]
    pub async fn replace_document(
        &mut self,
        document_id: &str,
        records: Vec<ChunkRecord>,
    ) -> Result<(), DocChatError> {
        debug!(
            "Replacing document {} with {} chunks",
            document_id,
            records.len()
        );

        // Adopt the dimension of the incoming vectors; a model change
        // invalidates everything already stored
        if let Some(first) = records.first() {
            let vector_dim = first.vector.len();
            if self.vector_dimension != vector_dim {
                info!(
                    "Vector dimension changed from {} to {}, recreating table",
                    self.vector_dimension, vector_dim
                );
                self.recreate_table_with_dimension(vector_dim).await?;
                self.vector_dimension = vector_dim;
            }
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to open table: {}", e)))?;

        let predicate = format!("document_id = '{}'", document_id);
        table
            .delete(&predicate)
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to delete previous chunks: {}", e)))?;

        if records.is_empty() {
            return Ok(());
        }

        let record_batch = self.create_record_batch(&records)?;
        let schema = record_batch.schema();
        let reader = RecordBatchIterator::new(std::iter::once(Ok(record_batch)), schema);

        table
            .add(reader)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to insert chunks: {}", e)))?;

        info!(
            "Stored {} chunks for document {}",
            records.len(),
            document_id
        );
        Ok(())
    }

    async fn recreate_table_with_dimension(&self, vector_dim: usize) -> Result<(), DocChatError> {
        self.drop_table_if_exists().await?;

        let schema = self.create_schema(vector_dim);
        self.connection
            .create_empty_table(&self.table_name, schema)
            .execute()
            .await
            .map_err(|e| {
                DocChatError::Store(format!("Failed to create table with new dimensions: {}", e))
            })?;

        Ok(())
    }

    fn create_record_batch(&self, records: &[ChunkRecord]) -> Result<RecordBatch, DocChatError> {
        let len = records.len();
        let vector_dim = self.vector_dimension;

        let mut ids = Vec::with_capacity(len);
        let mut document_ids = Vec::with_capacity(len);
        let mut contents = Vec::with_capacity(len);
        let mut chunk_indices = Vec::with_capacity(len);
        let mut created_ats = Vec::with_capacity(len);
        let mut flat_values = Vec::with_capacity(len * vector_dim);

        for record in records {
            if record.vector.len() != vector_dim {
                return Err(DocChatError::Store(format!(
                    "Vector dimension mismatch: expected {}, got {} for id {}",
                    vector_dim,
                    record.vector.len(),
                    record.id
                )));
            }

            ids.push(record.id.as_str());
            document_ids.push(record.document_id.as_str());
            contents.push(record.content.as_str());
            chunk_indices.push(record.chunk_index);
            created_ats.push(record.created_at.as_str());
            flat_values.extend_from_slice(&record.vector);
        }

        let schema = self.create_schema(vector_dim);

        let values_array = Float32Array::from(flat_values);
        let field = Arc::new(Field::new("item", DataType::Float32, false));
        let vector_array =
            FixedSizeListArray::try_new(field, vector_dim as i32, Arc::new(values_array), None)
                .map_err(|e| {
                    DocChatError::Store(format!("Failed to create vector array: {}", e))
                })?;

        let arrays: Vec<Arc<dyn arrow::array::Array>> = vec![
            Arc::new(StringArray::from(ids)),
            Arc::new(vector_array),
            Arc::new(StringArray::from(document_ids)),
            Arc::new(StringArray::from(contents)),
            Arc::new(UInt32Array::from(chunk_indices)),
            Arc::new(StringArray::from(created_ats)),
        ];

        RecordBatch::try_new(schema, arrays)
            .map_err(|e| DocChatError::Store(format!("Failed to create record batch: {}", e)))
    }

    /// Nearest-neighbor search, returning at most `limit` results ordered
    /// best-first. An empty store yields an empty vector, not an error.
    #[inline]
    pub async fn search(
        &self,
        query_vector: &[f32],
        limit: usize,
    ) -> Result<Vec<SearchResult>, DocChatError> {
        debug!("Searching for similar vectors with limit: {}", limit);

        if self.count().await? == 0 {
            debug!("Store is empty, returning no results");
            return Ok(Vec::new());
        }

        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to open table: {}", e)))?;

        let results = table
            .vector_search(query_vector)
            .map_err(|e| DocChatError::Store(format!("Failed to create vector search: {}", e)))?
            .column("vector")
            .limit(limit)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to execute search: {}", e)))?;

        self.parse_search_results_stream(results).await
    }

    async fn parse_search_results_stream(
        &self,
        mut results: lancedb::arrow::SendableRecordBatchStream,
    ) -> Result<Vec<SearchResult>, DocChatError> {
        let mut search_results = Vec::new();

        while let Some(batch_result) = results
            .try_next()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to read result stream: {}", e)))?
        {
            let parsed_batch = Self::parse_search_batch(&batch_result)?;
            search_results.extend(parsed_batch);
        }

        debug!("Parsed {} search results from stream", search_results.len());
        Ok(search_results)
    }

    fn parse_search_batch(batch: &RecordBatch) -> Result<Vec<SearchResult>, DocChatError> {
        let mut search_results = Vec::new();
        let num_rows = batch.num_rows();

        let ids = string_column(batch, "id")?;
        let document_ids = string_column(batch, "document_id")?;
        let contents = string_column(batch, "content")?;

        let chunk_indices = batch
            .column_by_name("chunk_index")
            .ok_or_else(|| DocChatError::Store("Missing chunk_index column".to_string()))?
            .as_any()
            .downcast_ref::<UInt32Array>()
            .ok_or_else(|| DocChatError::Store("Invalid chunk_index column type".to_string()))?;

        let distances = batch
            .column_by_name("_distance")
            .map(|col| col.as_any().downcast_ref::<Float32Array>());

        for row in 0..num_rows {
            let distance = distances
                .flatten()
                .map_or(0.0, |d| if d.is_null(row) { 0.0 } else { d.value(row) });

            // Convert distance to similarity score (higher is better)
            let similarity_score = 1.0 - distance;

            search_results.push(SearchResult {
                id: ids.value(row).to_string(),
                document_id: document_ids.value(row).to_string(),
                content: contents.value(row).to_string(),
                chunk_index: chunk_indices.value(row),
                distance,
                similarity_score,
            });
        }

        Ok(search_results)
    }

    /// Get the total number of stored chunks
    #[inline]
    pub async fn count(&self) -> Result<u64, DocChatError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to open table: {}", e)))?;

        let count = table
            .count_rows(None)
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to count rows: {}", e)))?;

        Ok(count as u64)
    }

    /// List the distinct document ids currently in the store
    #[inline]
    pub async fn document_ids(&self) -> Result<Vec<String>, DocChatError> {
        let table = self
            .connection
            .open_table(&self.table_name)
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to open table: {}", e)))?;

        let mut stream = table
            .query()
            .select(Select::columns(&["document_id"]))
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to scan table: {}", e)))?;

        let mut ids = BTreeSet::new();
        while let Some(batch) = stream
            .try_next()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to read scan stream: {}", e)))?
        {
            let column = string_column(&batch, "document_id")?;
            for row in 0..batch.num_rows() {
                ids.insert(column.value(row).to_string());
            }
        }

        Ok(ids.into_iter().collect())
    }

    /// Delete every stored chunk, keeping the table schema
    #[inline]
    pub async fn clear(&mut self) -> Result<(), DocChatError> {
        let dim = self.vector_dimension;
        self.recreate_table_with_dimension(dim).await?;

        info!("Vector store cleared");
        Ok(())
    }

    async fn drop_table_if_exists(&self) -> Result<(), DocChatError> {
        let table_names = self
            .connection
            .table_names()
            .execute()
            .await
            .map_err(|e| DocChatError::Store(format!("Failed to list tables for drop: {}", e)))?;

        if table_names.contains(&self.table_name) {
            self.connection
                .drop_table(&self.table_name)
                .await
                .map_err(|e| DocChatError::Store(format!("Failed to drop table: {}", e)))?;
        }

        Ok(())
    }
}

fn string_column<'a>(
    batch: &'a RecordBatch,
    name: &str,
) -> Result<&'a StringArray, DocChatError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| DocChatError::Store(format!("Missing {} column", name)))?
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| DocChatError::Store(format!("Invalid {} column type", name)))
}
