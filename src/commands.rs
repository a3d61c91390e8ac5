use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};

use crate::DocChatError;
use crate::config::Config;
use crate::ollama::OllamaClient;
use crate::responder::Responder;
use crate::store::VectorStore;

/// Ingest PDF files into the knowledge base, one atomic call per file
#[inline]
pub async fn ingest_documents(files: &[PathBuf]) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let mut responder = Responder::new(config)
        .await
        .context("Failed to initialize pipeline")?;

    let mut failures = 0;

    for file in files {
        let spinner = ingest_spinner(&format!("Ingesting {}", file.display()));

        match responder.ingest(file).await {
            Ok(report) => {
                spinner.finish_and_clear();
                if report.chunk_count == 0 {
                    println!(
                        "⚠ {} contained no extractable text (document '{}')",
                        file.display(),
                        report.document_id
                    );
                } else {
                    println!(
                        "✓ {} ingested: {} chunks stored as document '{}'",
                        file.display(),
                        report.chunk_count,
                        report.document_id
                    );
                }
            }
            Err(e) => {
                spinner.finish_and_clear();
                error!("Ingestion failed for {}: {}", file.display(), e);
                println!("✗ {} failed: {}", file.display(), e);
                failures += 1;
            }
        }
    }

    if failures > 0 {
        anyhow::bail!("{} of {} files failed to ingest", failures, files.len());
    }

    Ok(())
}

/// Answer a question from the ingested documents
#[inline]
pub async fn ask_question(question: &str) -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let responder = Responder::new(config)
        .await
        .context("Failed to initialize pipeline")?;

    match responder.answer(question).await {
        Ok(answer) => {
            println!("{}", answer);
            Ok(())
        }
        Err(DocChatError::InvalidQuery) => {
            println!("⚠ {}", DocChatError::InvalidQuery);
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Show Ollama connectivity and knowledge base statistics
#[inline]
pub async fn show_status() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;

    println!("📊 Docchat Status");
    println!("{}", "=".repeat(40));
    println!();

    println!("🤖 Ollama:");
    match OllamaClient::new(&config) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
                println!("   📋 Embedding model: {}", config.ollama.embedding_model);
                println!("   💬 Chat model: {}", config.ollama.chat_model);
            }
            Err(e) => {
                println!("   ⚠️  Reachable but unhealthy: {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Failed to create client: {}", e);
        }
    }

    println!();
    println!("🔍 Knowledge Base:");
    match VectorStore::open(&config).await {
        Ok(store) => {
            let count = store.count().await?;
            let documents = store.document_ids().await?;
            println!(
                "   📦 Store: {}",
                config.vector_database_path().display()
            );
            println!("   📄 Documents: {}", documents.len());
            println!("   🧩 Chunks: {}", count);
            for doc in &documents {
                println!("      • {}", doc);
            }
        }
        Err(e) => {
            println!("   ❌ Failed to open store: {}", e);
        }
    }

    println!();
    println!("💡 Next Steps:");
    println!("   • 'docchat ingest <pdf>' to add documents");
    println!("   • 'docchat ask \"<question>\"' to query them");

    Ok(())
}

/// Delete all ingested chunks from the knowledge base
#[inline]
pub async fn clear_store() -> Result<()> {
    let config = Config::load().context("Failed to load configuration")?;
    let mut store = VectorStore::open(&config)
        .await
        .context("Failed to open vector store")?;

    let count = store.count().await?;
    store.clear().await?;

    info!("Cleared {} chunks from the store", count);
    println!("✓ Knowledge base cleared ({} chunks removed)", count);

    Ok(())
}

fn ingest_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}
