use thiserror::Error;

/// Boxed error produced by an embedding provider.
pub type ProviderError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for Quiver.
///
/// Similarity, storage and provider failures surface as their own variants.
/// Index-level operations wrap whatever they hit in [`QuiverError::Internal`]
/// so callers can tell "the index failed" apart from lower layers while still
/// reaching the original cause through [`QuiverError::root_cause`].
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuiverError {
    #[error("vectors should not be null (all zeros)")]
    DegenerateVector,

    #[error("Persistence error at {path}: {reason}")]
    Persistence { path: String, reason: String },

    #[error("Embedding provider error: {0}")]
    Provider(#[source] ProviderError),

    #[error("Embedding provider returned {actual} vectors for {expected} texts")]
    EmbeddingCount { expected: usize, actual: usize },

    #[error("internal index error: {0}")]
    Internal(#[source] Box<QuiverError>),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl QuiverError {
    /// Wrap a provider failure without altering it.
    pub fn provider<E>(err: E) -> Self
    where
        E: Into<ProviderError>,
    {
        QuiverError::Provider(err.into())
    }

    /// Wrap an error raised below the index layer.
    ///
    /// Already-wrapped errors are returned unchanged so the chain never
    /// nests `Internal` twice.
    pub fn internal(err: QuiverError) -> Self {
        match err {
            QuiverError::Internal(_) => err,
            other => QuiverError::Internal(Box::new(other)),
        }
    }

    /// Build a persistence error for `path`.
    pub fn persistence(path: &std::path::Path, reason: impl std::fmt::Display) -> Self {
        QuiverError::Persistence {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }

    /// Strip every `Internal` layer and return the underlying cause.
    pub fn root_cause(&self) -> &QuiverError {
        let mut current = self;
        while let QuiverError::Internal(inner) = current {
            current = inner;
        }
        current
    }

    pub fn is_internal(&self) -> bool {
        matches!(self, QuiverError::Internal(_))
    }
}

impl From<toml::de::Error> for QuiverError {
    fn from(err: toml::de::Error) -> Self {
        QuiverError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for QuiverError {
    fn from(err: toml::ser::Error) -> Self {
        QuiverError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QuiverError {
    fn from(err: serde_json::Error) -> Self {
        QuiverError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Quiver operations.
pub type Result<T> = std::result::Result<T, QuiverError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = QuiverError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
        assert_eq!(
            QuiverError::DegenerateVector.to_string(),
            "vectors should not be null (all zeros)"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let quiver_err: QuiverError = io_err.into();
        assert!(matches!(quiver_err, QuiverError::Io(_)));
        assert!(quiver_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_internal_preserves_cause() {
        let err = QuiverError::internal(QuiverError::DegenerateVector);
        assert!(err.is_internal());
        assert!(err.to_string().starts_with("internal index error:"));
        assert!(matches!(err.root_cause(), QuiverError::DegenerateVector));
        let source = err.source().unwrap();
        assert_eq!(source.to_string(), "vectors should not be null (all zeros)");
    }

    #[test]
    fn test_internal_does_not_double_wrap() {
        let err = QuiverError::internal(QuiverError::internal(QuiverError::DegenerateVector));
        match &err {
            QuiverError::Internal(inner) => {
                assert!(matches!(**inner, QuiverError::DegenerateVector))
            }
            _ => panic!("Expected Internal variant"),
        }
    }

    #[test]
    fn test_provider_error_passes_through() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "rate limited");
        let err = QuiverError::provider(io_err);
        let source = err.source().unwrap();
        let io = source.downcast_ref::<std::io::Error>().unwrap();
        assert_eq!(io.kind(), std::io::ErrorKind::ConnectionRefused);
    }

    #[test]
    fn test_persistence_display() {
        let err = QuiverError::persistence(std::path::Path::new("/tmp/db.json"), "disk full");
        assert_eq!(err.to_string(), "Persistence error at /tmp/db.json: disk full");
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let quiver_err: QuiverError = err.unwrap_err().into();
        assert!(matches!(quiver_err, QuiverError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let quiver_err: QuiverError = err.unwrap_err().into();
        assert!(matches!(quiver_err, QuiverError::Serialization(_)));
    }

    #[test]
    fn test_root_cause_of_plain_error_is_itself() {
        let err = QuiverError::EmbeddingCount {
            expected: 1,
            actual: 0,
        };
        assert!(matches!(
            err.root_cause(),
            QuiverError::EmbeddingCount { expected: 1, actual: 0 }
        ));
    }
}
