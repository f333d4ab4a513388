//! The vector-space capability trait and the stateful LSI pipeline

use crate::config::LsiConfig;
use crate::error::{PipelineError, Result};
use crate::model::{LsiModel, cosine_similarity};
use ndarray::{Array1, Array2};
use std::sync::Arc;

/// A fitted space that queries can be projected into and compared against.
///
/// Ranking code is generic over this trait so any linear-algebra backend can
/// serve queries, and tests can substitute a space with known similarities.
pub trait VectorSpace: Send + Sync {
    /// Project `text` into the space
    fn transform(&self, text: &str) -> Result<Array1<f64>>;

    /// Number of indexed documents (columns of the reduced matrix)
    fn column_count(&self) -> usize;

    /// Cosine similarity between `query` and document `column`.
    ///
    /// # Panics
    /// May panic when `column >= self.column_count()`.
    fn column_similarity(&self, query: &Array1<f64>, column: usize) -> f64;
}

impl VectorSpace for LsiModel {
    fn transform(&self, text: &str) -> Result<Array1<f64>> {
        LsiModel::transform(self, text)
    }

    fn column_count(&self) -> usize {
        self.document_count()
    }

    fn column_similarity(&self, query: &Array1<f64>, column: usize) -> f64 {
        cosine_similarity(query.view(), self.reduced_matrix().column(column))
    }
}

impl<T: VectorSpace + ?Sized> VectorSpace for Arc<T> {
    fn transform(&self, text: &str) -> Result<Array1<f64>> {
        (**self).transform(text)
    }

    fn column_count(&self) -> usize {
        (**self).column_count()
    }

    fn column_similarity(&self, query: &Array1<f64>, column: usize) -> f64 {
        (**self).column_similarity(query, column)
    }
}

/// Count vectorizer, TF-IDF weighting and truncated SVD fitted as one unit.
///
/// A new pipeline is unfitted and rejects [`transform`](Self::transform) with
/// [`PipelineError::NotFit`]. Each successful [`fit`](Self::fit) swaps in a
/// freshly built [`LsiModel`]; a failed fit leaves the previous model in place.
#[derive(Debug, Clone, Default)]
pub struct LsiPipeline {
    config: LsiConfig,
    model: Option<Arc<LsiModel>>,
}

impl LsiPipeline {
    pub fn new(config: LsiConfig) -> Self {
        Self {
            config,
            model: None,
        }
    }

    /// Fit a new model on `texts` and make it current
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Arc<LsiModel>> {
        let model = Arc::new(LsiModel::fit(texts, &self.config)?);
        tracing::info!(
            "Pipeline fitted on {} documents ({} terms, rank {})",
            model.document_count(),
            model.vocabulary_len(),
            model.rank()
        );
        self.model = Some(Arc::clone(&model));
        Ok(model)
    }

    /// Fit on `texts` and return their reduced representation
    pub fn fit_transform<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Array2<f64>> {
        Ok(self.fit(texts)?.reduced_matrix().clone())
    }

    /// Project `text` through the current model
    pub fn transform(&self, text: &str) -> Result<Array1<f64>> {
        self.model()?.transform(text)
    }

    /// The current model, or [`PipelineError::NotFit`]
    pub fn model(&self) -> Result<&Arc<LsiModel>> {
        self.model.as_ref().ok_or(PipelineError::NotFit)
    }

    pub fn is_fit(&self) -> bool {
        self.model.is_some()
    }

    pub fn config(&self) -> &LsiConfig {
        &self.config
    }
}

impl VectorSpace for LsiPipeline {
    fn transform(&self, text: &str) -> Result<Array1<f64>> {
        LsiPipeline::transform(self, text)
    }

    fn column_count(&self) -> usize {
        self.model.as_ref().map_or(0, |m| m.document_count())
    }

    fn column_similarity(&self, query: &Array1<f64>, column: usize) -> f64 {
        self.model
            .as_ref()
            .map_or(0.0, |m| m.column_similarity(query, column))
    }
}
