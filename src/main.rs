use anyhow::{Context, Result};
use raglib::cli::{output::Output, Cli, Commands};
use raglib::rag::RagEngineBuilder;
use raglib::types::{DocumentMetadata, RagQueryOptions};
use raglib::RagConfig;
use std::path::Path;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env before clap reads env-backed arguments
    dotenvy::dotenv().ok();

    let cli = Cli::parse_args();
    init_tracing(cli.verbose);

    let output = if cli.no_color {
        Output::no_color()
    } else {
        Output::new()
    };

    if let Err(e) = run(cli, &output).await {
        output.error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "raglib=debug" } else { "raglib=info" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli, output: &Output) -> Result<()> {
    let mut config = cli
        .load_config()
        .context("Failed to load configuration")?;

    match cli.command {
        Commands::Chunk {
            file,
            chunker,
            json,
        } => {
            chunker.apply(&mut config);
            config.validate()?;

            let text = read_document(&file)?;
            let chunker = config
                .chunker
                .strategy
                .create_chunker(config.chunker.options())?;
            let chunks = chunker.chunk(&text, Some(metadata_for(&file)));

            if json {
                println!("{}", serde_json::to_string_pretty(&chunks)?);
                return Ok(());
            }

            output.header(&format!("{} chunks of {}", chunker.name(), file.display()));
            output.kv("chunks", &chunks.len().to_string());
            for chunk in &chunks {
                output.chunk(chunk);
            }
            if chunks.is_empty() {
                output.warning("No chunks produced; the text may be shorter than min_chunk_size");
            }
        }

        Commands::Search {
            file,
            query,
            top_k,
            collection,
            filters,
            chunker,
            json,
        } => {
            chunker.apply(&mut config);
            if let Some(k) = top_k {
                config.query.top_k = k;
            }

            let engine = RagEngineBuilder::from_config(&config)?.build()?;
            let text = read_document(&file)?;
            let stored = engine
                .ingest(&collection, &text, Some(metadata_for(&file)))
                .await
                .with_context(|| format!("Failed to ingest {}", file.display()))?;

            let mut options = RagQueryOptions::top_k(config.query.top_k);
            for (key, value) in filters {
                options = options.filter(key, value);
            }
            let hits = engine
                .search(&collection, &query, Some(&options))
                .await
                .context("Search failed")?;

            if json {
                println!("{}", serde_json::to_string_pretty(&hits)?);
                return Ok(());
            }

            output.header(&format!("Results for \"{}\"", query));
            output.kv("collection", &collection);
            output.kv("chunks ingested", &stored.to_string());
            for (rank, hit) in hits.iter().enumerate() {
                output.hit(rank + 1, hit);
            }
            if hits.is_empty() {
                output.hint("No matches. Try a smaller --chunk-size or drop --filter.");
            }
        }

        Commands::Config { validate } => {
            config.validate()?;
            if validate {
                output.success("Configuration is valid");
                return Ok(());
            }
            print_config(&config, output)?;
        }
    }

    Ok(())
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn metadata_for(path: &Path) -> DocumentMetadata {
    let mut metadata = DocumentMetadata::new().file_path(path.display().to_string());
    if let Some(name) = path.file_name() {
        metadata = metadata.file_name(name.to_string_lossy());
    }
    metadata
}

fn print_config(config: &RagConfig, output: &Output) -> Result<()> {
    output.header("Configuration");
    for line in toml::to_string_pretty(config)?.lines() {
        println!("    {}", line);
    }
    Ok(())
}
