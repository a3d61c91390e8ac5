use clap::{Parser, Subcommand};
use docchat::Result;
use docchat::commands::{ask_question, clear_store, ingest_documents, show_status};
use docchat::config::{run_interactive_config, show_config};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "docchat")]
#[command(about = "Build a local PDF knowledge base and ask questions about it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and model settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Ingest one or more PDF files into the knowledge base
    Ingest {
        /// Paths to PDF files
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Ask a question about the ingested documents
    Ask {
        /// The question to answer
        question: String,
    },
    /// Show Ollama connectivity and knowledge base statistics
    Status,
    /// Delete all ingested chunks from the knowledge base
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Ingest { files } => {
            ingest_documents(&files).await?;
        }
        Commands::Ask { question } => {
            ask_question(&question).await?;
        }
        Commands::Status => {
            show_status().await?;
        }
        Commands::Clear => {
            clear_store().await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    #[test]
    fn cli_parsing() {
        let cli = Cli::try_parse_from(["docchat", "status"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            matches!(parsed.command, Commands::Status);
        }
    }

    #[test]
    fn ingest_command_with_files() {
        let cli = Cli::try_parse_from(["docchat", "ingest", "paper.pdf", "notes.pdf"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ingest { files } = parsed.command {
                assert_eq!(files.len(), 2);
                assert_eq!(files[0], PathBuf::from("paper.pdf"));
            }
        }
    }

    #[test]
    fn ingest_command_requires_files() {
        let cli = Cli::try_parse_from(["docchat", "ingest"]);
        assert!(cli.is_err());
    }

    #[test]
    fn ask_command_with_question() {
        let cli = Cli::try_parse_from(["docchat", "ask", "What is this about?"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Ask { question } = parsed.command {
                assert_eq!(question, "What is this about?");
            }
        }
    }

    #[test]
    fn config_show_flag() {
        let cli = Cli::try_parse_from(["docchat", "config", "--show"]);
        assert!(cli.is_ok());

        if let Ok(parsed) = cli {
            if let Commands::Config { show } = parsed.command {
                assert!(show);
            }
        }
    }

    #[test]
    fn invalid_command() {
        let cli = Cli::try_parse_from(["docchat", "invalid"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::InvalidSubcommand);
        }
    }

    #[test]
    fn help_message() {
        let cli = Cli::try_parse_from(["docchat", "--help"]);
        assert!(cli.is_err());

        if let Err(err) = cli {
            assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        }
    }
}
