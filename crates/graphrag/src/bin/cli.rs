//! Command-line front end for the retrieval pipeline
//!
//! Ingestion reads pre-extracted chunks as JSON lines (one `SourceChunk` per
//! line), keeping the PDF/text extraction step outside this repository.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use graphrag::{RagConfig, RagPipeline, SourceChunk};

#[derive(Parser)]
#[command(name = "graphrag", about = "Retrieval-augmented generation over indexed documents")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest a JSONL file of extracted chunks
    Ingest {
        /// Path to a JSONL file, one chunk object per line
        file: PathBuf,
    },
    /// Ask a question against the indexed documents
    Query {
        /// The question to answer
        question: String,
        /// Number of chunks to retrieve (defaults from config)
        #[arg(long)]
        top_k: Option<usize>,
    },
    /// Show index statistics
    Info,
    /// Delete all chunks from one source document
    Delete {
        /// Exact source document name
        source: String,
    },
}

fn read_chunks(path: &PathBuf) -> anyhow::Result<Vec<SourceChunk>> {
    let file = File::open(path).with_context(|| format!("cannot open {}", path.display()))?;
    let mut chunks = Vec::new();
    for (lineno, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let chunk: SourceChunk = serde_json::from_str(&line)
            .with_context(|| format!("invalid chunk on line {}", lineno + 1))?;
        chunks.push(chunk);
    }
    Ok(chunks)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = RagConfig::from_env()?;
    let pipeline = RagPipeline::from_config(config)?;

    match cli.command {
        Command::Ingest { file } => {
            let chunks = read_chunks(&file)?;
            let report = pipeline.ingest(chunks).await?;
            println!("{}", report.message);
            if let Some(stats) = report.stats {
                println!(
                    "  chunks: {}  chars: {}  avg: {:.1}  min: {}  max: {}",
                    stats.total_chunks,
                    stats.total_chars,
                    stats.avg_chunk_size,
                    stats.min_chunk_size,
                    stats.max_chunk_size
                );
            }
        }
        Command::Query { question, top_k } => {
            let answer = pipeline.query(&question, top_k).await?;
            println!("{}\n", answer.text);
            if !answer.sources.is_empty() {
                println!("Sources:");
                for (i, source) in answer.sources.iter().enumerate() {
                    let preview: String = source.chunk.text.chars().take(200).collect();
                    println!(
                        "  {}. {} (chunk {}) similarity {:.4}\n     {}",
                        i + 1,
                        source.chunk.source,
                        source.chunk.position,
                        source.similarity,
                        preview
                    );
                }
            }
        }
        Command::Info => {
            let info = pipeline.info()?;
            println!(
                "{} chunks across {} documents",
                info.total_chunks, info.total_documents
            );
            for doc in info.documents {
                println!("  {doc}");
            }
        }
        Command::Delete { source } => {
            let removed = pipeline.delete_document(&source)?;
            println!("Deleted {removed} chunks from {source}");
        }
    }

    Ok(())
}
