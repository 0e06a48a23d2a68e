//! Quiver binary - composition root.
//!
//! 1. Parse CLI arguments and load configuration from TOML
//! 2. Initialise tracing
//! 3. Open the flat-file store and build the index
//! 4. Run the requested command and print its result as JSON

mod cli;

use std::path::Path;

use clap::Parser;
use serde::Serialize;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{reload, EnvFilter};

use quiver_core::config::QuiverConfig;
use quiver_core::error::QuiverError;
use quiver_core::types::Document;
use quiver_vector::{FlatVectorStore, HashEmbedding, Index, SearchOptions, SearchResult};

use cli::{CliArgs, Command};

type QuiverIndex = Index<FlatVectorStore, HashEmbedding>;

/// One search hit as printed by `quiver query`.
#[derive(Serialize)]
struct QueryHit<'a> {
    id: &'a str,
    score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    metadata: &'a quiver_core::types::Metadata,
}

impl<'a> From<&'a SearchResult> for QueryHit<'a> {
    fn from(result: &'a SearchResult) -> Self {
        Self {
            id: result.id(),
            score: result.score,
            content: result.content(),
            metadata: result.metadata(),
        }
    }
}

async fn run_load(index: &mut QuiverIndex, file: &Path) -> Result<(), QuiverError> {
    let content = std::fs::read_to_string(file)?;
    let mut documents: Vec<Document> = serde_json::from_str(&content)?;
    tracing::info!(path = %file.display(), documents = documents.len(), "Loading documents");

    index.load_from_documents(&mut documents).await?;

    let ids: Vec<&str> = documents.iter().filter_map(Document::id).collect();
    println!("{}", serde_json::to_string_pretty(&ids)?);
    Ok(())
}

async fn run_query(
    index: &mut QuiverIndex,
    text: &str,
    top_k: usize,
    filters: Vec<(String, String)>,
) -> Result<(), QuiverError> {
    let mut options = SearchOptions::new().with_top_k(top_k);
    if !filters.is_empty() {
        options = options.with_predicate(move |result| {
            filters.iter().all(|(key, expected)| {
                result
                    .metadata()
                    .get(key)
                    .is_some_and(|value| cli::metadata_matches(value, expected))
            })
        });
    }

    let results = index.query(text, options).await?;
    tracing::debug!(results = results.len(), "Query complete");

    let hits: Vec<QueryHit<'_>> = results.iter().map(QueryHit::from).collect();
    println!("{}", serde_json::to_string_pretty(&hits)?);
    Ok(())
}

fn run_status(index: &mut QuiverIndex, store_path: &Path) -> Result<(), QuiverError> {
    let empty = index.is_empty()?;
    let records = index.store_mut().len()?;
    let status = serde_json::json!({
        "store": store_path.display().to_string(),
        "empty": empty,
        "records": records,
    });
    println!("{}", serde_json::to_string_pretty(&status)?);
    Ok(())
}

/// Write `config` to `path`, refusing to replace an existing file unless `force`.
fn run_init(config: &QuiverConfig, path: &Path, force: bool) -> Result<(), QuiverError> {
    if path.exists() && !force {
        return Err(QuiverError::Config(format!(
            "{} already exists (use --force to overwrite)",
            path.display()
        )));
    }
    config.save(path)?;
    println!("{}", path.display());
    Ok(())
}

fn env_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    // Tracing. The filter starts from the CLI flag and is swapped for the
    // config file's level once that is read; RUST_LOG wins over both.
    let initial_level = args.log_level.as_deref().unwrap_or("info");
    let (filter, filter_handle) = reload::Layer::new(env_filter(initial_level));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Config.
    let config_file = args.resolve_config_path();
    let mut config = QuiverConfig::load_or_default(&config_file);
    args.apply_overrides(&mut config);
    filter_handle.reload(env_filter(&args.resolve_log_level(&config)))?;
    config.validate()?;
    tracing::debug!(path = %config_file.display(), "Configuration resolved");

    if let Command::Init { force } = args.command {
        return Ok(run_init(&config, &config_file, force)?);
    }

    // Store and index.
    let store_path = args.resolve_store_path(&config);
    let store = FlatVectorStore::new(&store_path);
    let embedder = HashEmbedding::new(config.embedding.dimensions);
    let mut index = Index::from_config(store, embedder, &config.index);
    tracing::debug!(
        store = %store_path.display(),
        batch_insert_size = index.batch_insert_size(),
        include_content = index.include_content(),
        "Index ready"
    );

    let outcome = match args.command {
        Command::Load { file } => run_load(&mut index, &file).await,
        Command::Query {
            text,
            top_k,
            filters,
        } => {
            let top_k = top_k.unwrap_or(config.index.default_top_k);
            run_query(&mut index, &text, top_k, filters).await
        }
        Command::Status => run_status(&mut index, &store_path),
        Command::Init { .. } => Ok(()),
    };

    if let Err(ref e) = outcome {
        tracing::error!(error = %e, cause = %e.root_cause(), "Command failed");
    }
    outcome?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_writes_loadable_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quiver").join("config.toml");
        let mut config = QuiverConfig::default();
        config.index.include_content = true;

        run_init(&config, &path, false).unwrap();

        let loaded = QuiverConfig::load(&path).unwrap();
        assert!(loaded.index.include_content);
    }

    #[test]
    fn test_init_keeps_existing_file_without_force() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[general]\nlog_level = \"debug\"\n").unwrap();

        let err = run_init(&QuiverConfig::default(), &path, false).unwrap_err();
        assert!(matches!(err, QuiverError::Config(_)));
        assert_eq!(QuiverConfig::load(&path).unwrap().general.log_level, "debug");

        run_init(&QuiverConfig::default(), &path, true).unwrap();
        assert_eq!(QuiverConfig::load(&path).unwrap().general.log_level, "info");
    }
}
