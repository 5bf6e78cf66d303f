//! CLI module for raglib
//!
//! Argument parsing for the `raglib` binary. Uses clap for argument parsing
//! and owo-colors for colored terminal output.

pub mod output;

use crate::rag::ChunkingStrategy;
use crate::utils::config::{ConfigError, RagConfig};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};

/// Config file looked up in the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "raglib.toml";

/// raglib - chunk documents and run similarity search over them
#[derive(Parser, Debug)]
#[command(
    name = "raglib",
    version,
    about = "Chunk documents and search them by embedding similarity",
    after_help = "EXAMPLES:\n    \
                  raglib chunk notes.md                      # Print the chunks of a document\n    \
                  raglib chunk notes.md --strategy fixed     # Use fixed-size windows\n    \
                  raglib search notes.md \"release process\"   # Ingest, then search\n    \
                  raglib --config my.toml config             # Show the effective configuration"
)]
pub struct Cli {
    /// Path to the configuration file (defaults to ./raglib.toml when present)
    #[arg(short, long, global = true, env = "RAGLIB_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// `--strategy` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StrategyArg {
    Fixed,
    Sentence,
}

impl From<StrategyArg> for ChunkingStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Fixed => ChunkingStrategy::Fixed,
            StrategyArg::Sentence => ChunkingStrategy::Sentence,
        }
    }
}

/// Chunker settings that override the `[chunker]` section.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct ChunkerArgs {
    /// Chunking strategy
    #[arg(long, value_enum)]
    pub strategy: Option<StrategyArg>,

    /// Target chunk size in characters
    #[arg(long)]
    pub chunk_size: Option<usize>,

    /// Characters carried over between sentence-aware chunks
    #[arg(long)]
    pub chunk_overlap: Option<usize>,

    /// Sentence-aware chunks shorter than this are dropped
    #[arg(long)]
    pub min_chunk_size: Option<usize>,
}

impl ChunkerArgs {
    pub fn apply(&self, config: &mut RagConfig) {
        if let Some(strategy) = self.strategy {
            config.chunker.strategy = strategy.into();
        }
        if let Some(size) = self.chunk_size {
            config.chunker.chunk_size = size;
        }
        if let Some(overlap) = self.chunk_overlap {
            config.chunker.chunk_overlap = overlap;
        }
        if let Some(min) = self.min_chunk_size {
            config.chunker.min_chunk_size = min;
        }
    }
}

/// Available CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Split a document into chunks and print them
    Chunk {
        /// Document to chunk
        file: PathBuf,

        #[command(flatten)]
        chunker: ChunkerArgs,

        /// Print chunks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Ingest a document, then print the chunks most similar to a query
    ///
    /// With the in-memory store the collection only lives for the duration
    /// of the command.
    Search {
        /// Document to ingest
        file: PathBuf,

        /// Query text
        query: String,

        /// Number of chunks to return
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Collection to ingest into and search
        #[arg(long, default_value = "documents")]
        collection: String,

        /// Only return chunks whose payload has this value (KEY=VALUE, repeatable)
        #[arg(long = "filter", value_parser = parse_filter)]
        filters: Vec<(String, String)>,

        #[command(flatten)]
        chunker: ChunkerArgs,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config {
        /// Only validate, print nothing on success
        #[arg(long)]
        validate: bool,
    },
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load the configuration named by `--config`.
    ///
    /// Without `--config`, `raglib.toml` in the working directory is used if
    /// it exists and built-in defaults otherwise.
    pub fn load_config(&self) -> Result<RagConfig, ConfigError> {
        match self.config {
            Some(ref path) => RagConfig::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => RagConfig::load(DEFAULT_CONFIG_FILE),
            None => Ok(RagConfig::default()),
        }
    }
}
