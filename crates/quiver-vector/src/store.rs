//! Vector storage backends.
//!
//! [`VectorStore`] is the seam the index talks to. [`FlatVectorStore`] keeps
//! every record in memory, scores queries by brute-force cosine similarity,
//! and snapshots the whole record list to a single JSON file on each insert.
//!
//! The flat store assumes one owner per file. It does no locking, and a
//! crash between the in-memory append and the file write leaves the two out
//! of step.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use quiver_core::error::{QuiverError, Result};

use crate::record::Record;
use crate::search::{SearchOptions, SearchResult, SearchResults};
use crate::similarity::cosine_similarity_batch;

/// Storage backend for embedding records.
///
/// Implementations must keep ids that are already set and assign one to
/// every record that arrives without.
pub trait VectorStore: Send {
    /// Append records, assigning ids where missing.
    fn insert(&mut self, records: Vec<Record>) -> Result<()>;

    /// Whether the store holds no records.
    fn is_empty(&mut self) -> Result<bool>;

    /// Score every record against `query` and return the best matches.
    fn search(&mut self, query: &[f64], options: &SearchOptions) -> Result<SearchResults>;
}

/// Brute-force vector store persisted as one JSON file.
#[derive(Debug)]
pub struct FlatVectorStore {
    records: Vec<Record>,
    path: PathBuf,
    loaded: bool,
}

impl FlatVectorStore {
    /// Create a store backed by `path`. Nothing is read until first use.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            records: Vec::new(),
            path: path.into(),
            loaded: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records, loading the file if needed.
    pub fn len(&mut self) -> Result<usize> {
        self.load()?;
        Ok(self.records.len())
    }

    /// All stored records in insertion order, loading the file if needed.
    pub fn records(&mut self) -> Result<&[Record]> {
        self.load()?;
        Ok(&self.records)
    }

    /// Read the backing file once. A missing file is created empty.
    fn load(&mut self) -> Result<()> {
        if self.loaded {
            return Ok(());
        }

        match std::fs::read(&self.path) {
            Ok(bytes) => {
                self.records = serde_json::from_slice(&bytes)
                    .map_err(|e| QuiverError::persistence(&self.path, e))?;
                info!(
                    path = %self.path.display(),
                    records = self.records.len(),
                    "Flat vector store loaded"
                );
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.records.clear();
                self.save()?;
                info!(path = %self.path.display(), "Created empty flat vector store");
            }
            Err(e) => return Err(QuiverError::persistence(&self.path, e)),
        }

        self.loaded = true;
        Ok(())
    }

    /// Overwrite the backing file with the full record list.
    fn save(&self) -> Result<()> {
        let bytes =
            serde_json::to_vec(&self.records).map_err(|e| QuiverError::persistence(&self.path, e))?;
        write_private(&self.path, &bytes).map_err(|e| QuiverError::persistence(&self.path, e))
    }
}

impl VectorStore for FlatVectorStore {
    fn insert(&mut self, records: Vec<Record>) -> Result<()> {
        self.load()?;

        // JSON has no NaN or infinity; serde_json would write them as null
        // and the file would no longer load.
        if let Some(pos) = records
            .iter()
            .position(|r| r.values.iter().any(|v| !v.is_finite()))
        {
            return Err(QuiverError::persistence(
                &self.path,
                format!("record {} has non-finite vector values", pos),
            ));
        }

        let count = records.len();
        self.records.extend(records.into_iter().map(|mut record| {
            record.ensure_id();
            record
        }));

        if let Err(e) = self.save() {
            warn!(
                path = %self.path.display(),
                error = %e,
                "Store write failed; in-memory records are ahead of disk"
            );
            return Err(e);
        }

        debug!(inserted = count, total = self.records.len(), "Records inserted");
        Ok(())
    }

    fn is_empty(&mut self) -> Result<bool> {
        self.load()?;
        Ok(self.records.is_empty())
    }

    fn search(&mut self, query: &[f64], options: &SearchOptions) -> Result<SearchResults> {
        self.load()?;

        let scores = cosine_similarity_batch(query, self.records.iter().map(|r| r.values.as_slice()))?;

        let mut results: Vec<SearchResult> = self
            .records
            .iter()
            .zip(scores)
            .map(|(record, score)| SearchResult {
                record: record.clone(),
                score,
            })
            .collect();

        if let Some(filter) = &options.filter {
            results = (**filter)(results);
        }

        // Equal scores keep no particular order.
        results.sort_unstable_by(|a, b| b.score.total_cmp(&a.score));
        results.truncate(options.top_k);

        debug!(
            scanned = self.records.len(),
            returned = results.len(),
            top_k = options.top_k,
            "Flat search complete"
        );

        Ok(SearchResults::from(results))
    }
}

/// Write `bytes` to `path`, truncating, with owner-only permissions on Unix.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.flush()
}
