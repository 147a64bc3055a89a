//! graphweave - build a knowledge graph from extracted text chunks.
//!
//! Reads the chunk file, extracts each chunk (gold standard in mock mode, an
//! LLM in live mode), merges the records into one graph and writes
//! `graph.json`, `graph.mmd` and `diagnostics.json` to the output directory.
//!
//! # Configuration
//!
//! Settings come from an optional config file, then environment variables
//! (a `.env` file is honored), then command-line flags:
//!
//! - `GRAPHWEAVE_MODE` - `mock` (default) or `live`
//! - `GRAPHWEAVE_PROVIDER` - `gemini` (default) or `openai`
//! - `GEMINI_API_KEY` / `OPENAI_API_KEY` - required in live mode
//! - `RUST_LOG` - log filter, defaults to `info,graphweave=debug`

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use graphweave_core::{load_chunks, Mode, Pipeline, PipelineConfig};
use graphweave_extractors::ExtractorFactory;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "graphweave")]
#[command(about = "Build a knowledge graph from extracted text chunks", long_about = None)]
struct Cli {
    /// Use the gold standard dataset
    #[arg(long)]
    mock: bool,

    /// Use the configured LLM provider (wins over --mock)
    #[arg(long)]
    live: bool,

    /// Config file (.toml, .json, .yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Input chunks file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Directory for graph.json, graph.mmd and diagnostics.json
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Skip the Mermaid export
    #[arg(long)]
    no_mermaid: bool,
}

impl Cli {
    fn mode(&self) -> Option<Mode> {
        if self.live {
            Some(Mode::Live)
        } else if self.mock {
            Some(Mode::Mock)
        } else {
            None
        }
    }

    fn load_config(&self) -> Result<PipelineConfig> {
        let config = match &self.config {
            Some(path) => PipelineConfig::from_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?,
            None => PipelineConfig::default(),
        };
        let mut config = config.apply_env()?;

        if let Some(mode) = self.mode() {
            config.mode = mode;
        }
        if let Some(input) = &self.input {
            config.input_chunks_path = input.clone();
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        if self.no_mermaid {
            config.write_mermaid = false;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,graphweave=debug"));
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = cli.load_config()?;
    tracing::info!(mode = ?config.mode, input = %config.input_chunks_path.display(), "Starting graphweave");

    let chunks = load_chunks(&config.input_chunks_path)
        .with_context(|| format!("loading chunks from {}", config.input_chunks_path.display()))?;
    let extractor = ExtractorFactory::from_config(&config)?;

    let mut pipeline = Pipeline::from_config(&config, extractor);
    let report = pipeline.run(&chunks).await?;
    let paths = pipeline
        .write_outputs(
            &report,
            &config.output_dir,
            config.write_mermaid,
            config.write_diagnostics,
        )
        .await?;

    tracing::info!(
        chunks = report.total_chunks,
        failed = report.failed_chunks,
        nodes = report.node_count,
        edges = report.edge_count,
        unresolved = report.unresolved_references.len(),
        type_conflicts = report.type_conflicts.len(),
        "Graph built"
    );
    for failure in &report.failures {
        tracing::warn!(chunk_id = %failure.chunk_id, code = failure.code, error = %failure.error, "Chunk skipped");
    }
    tracing::info!(path = %paths.json.display(), "Done");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_live_wins_over_mock() {
        let cli = Cli::parse_from(["graphweave", "--mock", "--live"]);
        assert_eq!(cli.mode(), Some(Mode::Live));
        assert_eq!(Cli::parse_from(["graphweave"]).mode(), None);
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "graphweave",
            "--mock",
            "--input",
            "chunks.json",
            "--output-dir",
            "out",
            "--no-mermaid",
        ]);
        let config = cli.load_config().unwrap();
        assert_eq!(config.mode, Mode::Mock);
        assert_eq!(config.input_chunks_path, PathBuf::from("chunks.json"));
        assert_eq!(config.output_dir, PathBuf::from("out"));
        assert!(!config.write_mermaid);
    }
}
