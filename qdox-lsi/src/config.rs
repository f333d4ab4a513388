//! Configuration for the LSI pipeline

use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// Default reduction rank for the truncated SVD
pub const DEFAULT_RANK: usize = 4;

/// Which stop words are removed before building the vocabulary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StopWords {
    /// The built-in English list
    #[default]
    English,
    /// Keep every token
    None,
    /// A caller-supplied list, matched against lower-cased tokens
    Custom(Vec<String>),
}

impl StopWords {
    /// Materialize the stop-word list as lower-cased owned strings
    pub fn words(&self) -> Vec<String> {
        match self {
            StopWords::English => crate::text::ENGLISH_STOP_WORDS
                .iter()
                .map(|w| w.to_string())
                .collect(),
            StopWords::None => Vec::new(),
            StopWords::Custom(words) => words.iter().map(|w| w.to_lowercase()).collect(),
        }
    }
}

impl std::fmt::Display for StopWords {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StopWords::English => write!(f, "english"),
            StopWords::None => write!(f, "none"),
            StopWords::Custom(words) => write!(f, "custom({})", words.len()),
        }
    }
}

/// Configuration for fitting an LSI model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LsiConfig {
    /// Number of latent dimensions kept by the truncated SVD
    pub rank: usize,
    /// Stop words removed before the vocabulary is built
    pub stop_words: StopWords,
}

impl Default for LsiConfig {
    fn default() -> Self {
        Self {
            rank: DEFAULT_RANK,
            stop_words: StopWords::default(),
        }
    }
}

impl LsiConfig {
    /// Create a configuration with the default rank and English stop words
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reduction rank (builder style)
    pub fn with_rank(self, rank: usize) -> Self {
        Self { rank, ..self }
    }

    /// Set the stop-word list (builder style)
    pub fn with_stop_words(self, stop_words: StopWords) -> Self {
        Self { stop_words, ..self }
    }

    /// Check values that can never produce a model, independent of the corpus
    pub fn validate(&self) -> Result<()> {
        if self.rank == 0 {
            return Err(PipelineError::invalid_config(
                "reduction rank must be at least 1",
            ));
        }
        Ok(())
    }
}
