//! CLI argument definitions for the `quiver` binary.
//!
//! Priority resolution: CLI args > env vars > config file > defaults.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use quiver_core::config::QuiverConfig;
use quiver_core::types::MetadataValue;

/// Quiver - a flat-file vector index for documents.
#[derive(Parser, Debug)]
#[command(name = "quiver", version, about)]
pub struct CliArgs {
    /// Path to the configuration file.
    #[arg(short = 'c', long = "config", global = true)]
    pub config: Option<PathBuf>,

    /// Path to the vector store file.
    #[arg(short = 's', long = "store", global = true)]
    pub store: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short = 'l', long = "log-level", global = true)]
    pub log_level: Option<String>,

    /// Documents embedded per provider call.
    #[arg(long = "batch-size", global = true)]
    pub batch_size: Option<usize>,

    /// Store document text alongside each vector. `--include-content=false`
    /// turns off a config file that enables it.
    #[arg(
        long = "include-content",
        global = true,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    pub include_content: Option<bool>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Index a JSON array of `{"content": ..., "metadata": {...}}` documents.
    Load {
        /// Path to the documents file.
        file: PathBuf,
    },
    /// Embed a query and print the closest records.
    Query {
        /// Query text.
        text: String,

        /// Maximum number of results.
        #[arg(short = 'k', long = "top-k")]
        top_k: Option<usize>,

        /// Keep only records whose metadata has `key=value`. Repeatable.
        #[arg(long = "where", value_parser = parse_key_value)]
        filters: Vec<(String, String)>,
    },
    /// Report whether the store holds any records.
    Status,
    /// Write the effective configuration to the config file path.
    Init {
        /// Replace an existing config file.
        #[arg(long)]
        force: bool,
    },
}

impl CliArgs {
    /// Resolve the configuration file path.
    ///
    /// Priority: --config flag > QUIVER_CONFIG env var > ~/.quiver/config.toml.
    pub fn resolve_config_path(&self) -> PathBuf {
        if let Some(ref p) = self.config {
            return p.clone();
        }
        if let Ok(p) = std::env::var("QUIVER_CONFIG") {
            return PathBuf::from(p);
        }
        default_config_path()
    }

    /// Resolve the store file path.
    ///
    /// Priority: --store flag > QUIVER_STORE env var > config file value.
    pub fn resolve_store_path(&self, config: &QuiverConfig) -> PathBuf {
        if let Some(ref p) = self.store {
            return p.clone();
        }
        if let Ok(p) = std::env::var("QUIVER_STORE") {
            return PathBuf::from(p);
        }
        PathBuf::from(&config.store.path)
    }

    /// Resolve the log level. Priority: --log-level flag > config file value.
    pub fn resolve_log_level(&self, config: &QuiverConfig) -> String {
        self.log_level
            .clone()
            .unwrap_or_else(|| config.general.log_level.clone())
    }

    /// Fold CLI overrides into the loaded configuration.
    pub fn apply_overrides(&self, config: &mut QuiverConfig) {
        if let Some(size) = self.batch_size {
            config.index.batch_insert_size = size;
        }
        if let Some(include) = self.include_content {
            config.index.include_content = include;
        }
    }
}

/// Parse a `key=value` pair.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", raw)),
    }
}

/// Whether a metadata value matches its textual form given on the command line.
pub fn metadata_matches(value: &MetadataValue, expected: &str) -> bool {
    match value {
        MetadataValue::String(s) => s == expected,
        MetadataValue::Bool(b) => expected.parse::<bool>().map_or(false, |e| e == *b),
        MetadataValue::Integer(i) => expected.parse::<i64>().map_or(false, |e| e == *i),
        MetadataValue::Float(f) => expected.parse::<f64>().map_or(false, |e| e == *f),
        MetadataValue::Null => expected == "null",
        MetadataValue::List(_) | MetadataValue::Map(_) => false,
    }
}

/// Default config file path for the current platform.
fn default_config_path() -> PathBuf {
    #[cfg(target_os = "windows")]
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".quiver").join("config.toml");
    }
    #[cfg(not(target_os = "windows"))]
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".quiver").join("config.toml");
    }
    PathBuf::from("config.toml")
}
