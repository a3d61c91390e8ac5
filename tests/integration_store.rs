#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests for the ingestion path below PDF extraction:
// chunking, record assembly, and the LanceDB store.

use docchat::chunking::chunk_text;
use docchat::config::{Config, OllamaConfig};
use docchat::store::{ChunkRecord, VectorStore};
use tempfile::TempDir;

const DIM: usize = 5;

fn test_config(temp_dir: &TempDir) -> Config {
    Config {
        ollama: OllamaConfig {
            embedding_dimension: DIM as u32,
            ..OllamaConfig::default()
        },
        chunk_size: 500,
        base_dir: temp_dir.path().to_path_buf(),
    }
}

/// Deterministic stand-in for the embedding model
fn fake_vector(seed: u32) -> Vec<f32> {
    (0..DIM)
        .map(|i| (seed as f32).mul_add(0.1, i as f32 * 0.01))
        .collect()
}

fn records_for(document_id: &str, text: &str, chunk_size: usize) -> Vec<ChunkRecord> {
    chunk_text(text, chunk_size)
        .into_iter()
        .map(|chunk| ChunkRecord {
            id: format!("{}_{}", document_id, chunk.chunk_index),
            document_id: document_id.to_string(),
            content: chunk.content,
            chunk_index: chunk.chunk_index as u32,
            vector: fake_vector(chunk.chunk_index as u32),
            created_at: "2026-01-01T00:00:00Z".to_string(),
        })
        .collect()
}

#[tokio::test]
async fn thousand_character_document_round_trip() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);
    let mut store = VectorStore::open(&config).await.expect("should open store");

    // A document whose extracted text is exactly 1000 characters splits
    // into exactly two 500-character chunks
    let text: String = "abcde".repeat(200);
    assert_eq!(text.chars().count(), 1000);

    let records = records_for("report", &text, config.chunk_size);
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].id, "report_0");
    assert_eq!(records[1].id, "report_1");
    assert_eq!(records[0].content.chars().count(), 500);
    assert_eq!(records[1].content.chars().count(), 500);

    store
        .replace_document("report", records.clone())
        .await
        .expect("should store chunks");
    assert_eq!(store.count().await.expect("should count"), 2);

    // A top-3 query against a two-entry store returns both entries
    let results = store
        .search(&fake_vector(0), 3)
        .await
        .expect("search should succeed");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].id, "report_0");

    // Retrieved texts reassemble the document when joined in chunk order
    let mut ordered = results.clone();
    ordered.sort_by_key(|r| r.chunk_index);
    let rebuilt: String = ordered.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(rebuilt, text);
}

#[tokio::test]
async fn reingestion_is_idempotent() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);
    let mut store = VectorStore::open(&config).await.expect("should open store");

    let text: String = "lorem ipsum dolor sit amet ".repeat(60);
    let records = records_for("thesis", &text, config.chunk_size);
    let expected = records.len() as u64;

    store
        .replace_document("thesis", records.clone())
        .await
        .expect("first ingest should succeed");
    store
        .replace_document("thesis", records)
        .await
        .expect("second ingest should succeed");

    assert_eq!(store.count().await.expect("should count"), expected);
}

#[tokio::test]
async fn documents_do_not_collide() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);
    let mut store = VectorStore::open(&config).await.expect("should open store");

    store
        .replace_document("alpha", records_for("alpha", &"a".repeat(600), 500))
        .await
        .expect("should store alpha");
    store
        .replace_document("beta", records_for("beta", &"b".repeat(600), 500))
        .await
        .expect("should store beta");

    // Chunk index 0 exists in both documents under distinct ids
    assert_eq!(store.count().await.expect("should count"), 4);

    let results = store
        .search(&fake_vector(0), 10)
        .await
        .expect("search should succeed");
    let mut ids: Vec<&str> = results.iter().map(|r| r.id.as_str()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec!["alpha_0", "alpha_1", "beta_0", "beta_1"]);
}

#[tokio::test]
async fn store_survives_reopen_from_same_config() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config = test_config(&temp_dir);

    {
        let mut store = VectorStore::open(&config).await.expect("should open store");
        store
            .replace_document("paper", records_for("paper", &"x".repeat(750), 500))
            .await
            .expect("should store chunks");
    }

    let store = VectorStore::open(&config).await.expect("should reopen store");
    assert_eq!(store.count().await.expect("should count"), 2);

    let results = store
        .search(&fake_vector(1), 3)
        .await
        .expect("search should succeed");
    assert_eq!(results.len(), 2);
}
