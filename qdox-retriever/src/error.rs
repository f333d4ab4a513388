//! Error types for corpus loading, reindexing and querying

use qdox_lsi::PipelineError;
use std::path::PathBuf;

/// Result type for retriever operations.
pub type Result<T> = std::result::Result<T, RetrieverError>;

/// Errors raised while loading a corpus, building a snapshot or watching a folder.
///
/// # Error Categories
///
/// - **IO Errors**: walking or reading the document folder ([`Io`](Self::Io), [`Walk`](Self::Walk))
/// - **Pipeline Errors**: fitting the LSI model failed
/// - **Watch Errors**: the filesystem observation could not start, or failed while running
/// - **Configuration Errors**: bad path patterns or config files
#[derive(Debug, thiserror::Error)]
pub enum RetrieverError {
    /// Reading a document failed
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Enumerating the document folder failed
    #[error("Failed to walk directory: {source}")]
    Walk {
        #[from]
        source: ignore::Error,
    },

    /// Fitting or using the vector pipeline failed
    #[error("Pipeline error: {source}")]
    Pipeline {
        #[from]
        source: PipelineError,
    },

    /// The path filter pattern is not a valid regular expression
    #[error("Invalid path pattern: {source}")]
    InvalidPattern {
        #[from]
        source: regex::Error,
    },

    /// The filesystem observation could not be established
    #[error("Failed to watch {path}: {source}")]
    WatchSetup {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    /// A reindex cycle, or the watch mechanism itself, failed while running
    #[error("Watcher error: {message}")]
    WatchRuntime { message: String },

    /// A model was paired with a corpus it was not fitted on
    #[error("Model has {columns} document columns but the corpus has {documents} documents")]
    SnapshotMismatch { documents: usize, columns: usize },

    /// A blocking reload task panicked or was cancelled
    #[error("Background task failed: {source}")]
    Task {
        #[from]
        source: tokio::task::JoinError,
    },

    /// A configuration file could not be read or parsed
    #[error("Invalid configuration in {path}: {message}")]
    Config { path: PathBuf, message: String },
}

impl RetrieverError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn watch_runtime<S: Into<String>>(message: S) -> Self {
        Self::WatchRuntime {
            message: message.into(),
        }
    }
}

/// Why a query produced no ranking. Carried inside a `QueryResult`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    /// No model has been fitted or published yet
    #[error("Pipeline has not been fit")]
    PipelineNotFit,

    /// The query text could not be projected into the model space
    #[error("Failed to transform query: {message}")]
    Transform { message: String },
}

impl From<PipelineError> for QueryError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::NotFit => QueryError::PipelineNotFit,
            PipelineError::Transform { message } => QueryError::Transform { message },
            other => QueryError::Transform {
                message: other.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_error_from_pipeline_error() {
        assert_eq!(
            QueryError::from(PipelineError::NotFit),
            QueryError::PipelineNotFit
        );

        let err = QueryError::from(PipelineError::transform("text contains no terms"));
        assert_eq!(
            err,
            QueryError::Transform {
                message: "text contains no terms".to_string()
            }
        );
        assert_eq!(
            err.to_string(),
            "Failed to transform query: text contains no terms"
        );

        let err = QueryError::from(PipelineError::EmptyCorpus);
        assert!(matches!(err, QueryError::Transform { .. }));
    }
}
