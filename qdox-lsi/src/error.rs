//! Error types for the vector pipeline

/// Result type for pipeline operations.
///
/// Convenience alias using [`PipelineError`] as the error type.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Error type for fitting and transforming with the LSI pipeline.
///
/// # Error Categories
///
/// - **Fit Errors**: the training texts cannot support the requested model
/// - **Configuration Errors**: invalid rank or stop-word settings
/// - **Query Errors**: transform called before a fit, or on unusable text
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PipelineError {
    /// Fit was called with no texts at all
    #[error("Cannot fit a model on an empty corpus")]
    EmptyCorpus,

    /// Every token was a stop word, or no text contained a token
    #[error("No terms left after tokenization and stop-word removal")]
    EmptyVocabulary,

    /// The requested rank cannot be supported by the term-document matrix
    #[error(
        "Reduction rank {rank} exceeds available dimensions ({documents} documents, {terms} terms)"
    )]
    RankTooLarge {
        rank: usize,
        documents: usize,
        terms: usize,
    },

    /// Configuration values that can never produce a model
    #[error("Invalid pipeline configuration: {message}")]
    InvalidConfig { message: String },

    /// Transform attempted before a successful fit
    #[error("Pipeline has not been fit")]
    NotFit,

    /// Query text could not be turned into a term vector
    #[error("Failed to transform text: {message}")]
    Transform { message: String },
}

impl PipelineError {
    /// Create an invalid configuration error with a custom message.
    pub fn invalid_config<S: Into<String>>(message: S) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a transform error with a custom message.
    pub fn transform<S: Into<String>>(message: S) -> Self {
        Self::Transform {
            message: message.into(),
        }
    }
}
