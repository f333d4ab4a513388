//! File-based configuration for the `qdox` tool.
//!
//! Every field has a default, so an empty or missing `qdox.toml` is valid:
//!
//! ```toml
//! pattern = '\.txt$'
//! top_n = 5
//! threshold = 0.3
//! rank = 4
//! strategy = "monotonic-scan"
//! stop_words = "english"
//! poll_interval_ms = 1000
//! max_events = 10
//! debounce_ms = 250
//! ```

use crate::error::{Result, RetrieverError};
use crate::retrieval::corpus::{DEFAULT_PATTERN, PathPattern};
use crate::retrieval::query::AcceptanceStrategy;
use crate::retrieval::reindex::ReindexConfig;
use qdox_lsi::{DEFAULT_RANK, LsiConfig, StopWords};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Name of the config file looked up in the indexed folder
pub const CONFIG_FILE_NAME: &str = "qdox.toml";

/// Search and watch settings, as read from `qdox.toml`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QdoxConfig {
    /// Regular expression selecting which paths are documents
    pub pattern: String,
    /// Maximum number of results per query
    pub top_n: usize,
    /// Minimum cosine similarity for a result
    pub threshold: f64,
    /// Reduction rank of the LSI model
    pub rank: usize,
    pub strategy: AcceptanceStrategy,
    pub stop_words: StopWords,
    /// Rescan interval of the directory watcher
    pub poll_interval_ms: u64,
    /// Capacity of the pending change-event queue
    pub max_events: usize,
    /// Window over which change events are coalesced
    pub debounce_ms: u64,
}

impl Default for QdoxConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            top_n: 5,
            threshold: 0.3,
            rank: DEFAULT_RANK,
            strategy: AcceptanceStrategy::default(),
            stop_words: StopWords::default(),
            poll_interval_ms: 1000,
            max_events: 10,
            debounce_ms: 250,
        }
    }
}

impl QdoxConfig {
    /// Parse a config file.
    ///
    /// # Errors
    /// [`RetrieverError::Config`] when the file cannot be read or is not
    /// valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| RetrieverError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let config: Self = toml::from_str(&text).map_err(|e| RetrieverError::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Load `explicit` if given, otherwise `qdox.toml` inside `folder` if it
    /// exists, otherwise the defaults.
    pub fn discover(folder: &Path, explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        let candidate = folder.join(CONFIG_FILE_NAME);
        if candidate.is_file() {
            Self::load(&candidate)
        } else {
            Ok(Self::default())
        }
    }

    /// Compiled document path filter
    pub fn path_pattern(&self) -> Result<PathPattern> {
        PathPattern::new(&self.pattern)
    }

    pub fn lsi_config(&self) -> LsiConfig {
        LsiConfig::new()
            .with_rank(self.rank)
            .with_stop_words(self.stop_words.clone())
    }

    /// Coordinator settings for watching `root`
    pub fn reindex_config(&self, root: impl Into<PathBuf>) -> Result<ReindexConfig> {
        let filter = self.path_pattern()?.into_filter();
        Ok(ReindexConfig::new(root, filter)
            .with_poll_interval(Duration::from_millis(self.poll_interval_ms))
            .with_debounce(Duration::from_millis(self.debounce_ms))
            .with_max_pending_events(self.max_events)
            .with_lsi_config(self.lsi_config()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = QdoxConfig::default();
        assert_eq!(config.pattern, r"\.txt$");
        assert_eq!(config.top_n, 5);
        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.rank, 4);
        assert_eq!(config.max_events, 10);
        assert_eq!(config.strategy, AcceptanceStrategy::MonotonicScan);
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            "top_n = 2\nstrategy = \"threshold\"\npattern = '\\.md$'\n",
        )?;

        let config = QdoxConfig::load(&path)?;

        assert_eq!(config.top_n, 2);
        assert_eq!(config.strategy, AcceptanceStrategy::Threshold);
        assert!(config.path_pattern()?.matches(Path::new("notes/readme.md")));
        assert_eq!(config.threshold, 0.3);
        assert_eq!(config.poll_interval_ms, 1000);
        Ok(())
    }

    #[test]
    fn test_discover_prefers_explicit_then_folder_file() -> Result<()> {
        let dir = tempdir()?;
        assert_eq!(QdoxConfig::discover(dir.path(), None)?, QdoxConfig::default());

        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "rank = 2\n")?;
        assert_eq!(QdoxConfig::discover(dir.path(), None)?.rank, 2);

        let explicit = dir.path().join("other.toml");
        std::fs::write(&explicit, "rank = 3\n")?;
        assert_eq!(QdoxConfig::discover(dir.path(), Some(&explicit))?.rank, 3);
        Ok(())
    }

    #[test]
    fn test_invalid_file_is_a_config_error() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "top_n = \"lots\"\n")?;
        assert!(matches!(
            QdoxConfig::load(&path),
            Err(RetrieverError::Config { .. })
        ));
        assert!(matches!(
            QdoxConfig::load(&dir.path().join("missing.toml")),
            Err(RetrieverError::Config { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_reindex_config_carries_settings() -> Result<()> {
        let config = QdoxConfig {
            poll_interval_ms: 50,
            max_events: 3,
            rank: 2,
            ..QdoxConfig::default()
        };
        let reindex = config.reindex_config("/docs")?;
        assert_eq!(reindex.poll_interval, Duration::from_millis(50));
        assert_eq!(reindex.max_pending_events, 3);
        assert_eq!(reindex.lsi.rank, 2);
        assert!((reindex.filter)(Path::new("/docs/a.txt")));
        assert!(!(reindex.filter)(Path::new("/docs/a.md")));
        Ok(())
    }
}
