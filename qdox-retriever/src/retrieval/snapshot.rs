//! Immutable corpus/model pairs and the context that publishes them.
//!
//! A [`ModelSnapshot`] is the unit of read consistency: the corpus paths and
//! the fitted model that indexes them, built together and never modified.
//! [`SearchContext`] holds the currently published snapshot. Publishing is a
//! single replacement of an `Arc` inside a `tokio::sync::watch` channel, so a
//! reader holding a snapshot keeps seeing exactly that snapshot until it lets
//! go, however many reindexes happen meanwhile.

use super::corpus::Corpus;
use super::query::{AcceptanceStrategy, QueryEngine, QueryResult};
use crate::error::{QueryError, Result, RetrieverError};
use chrono::{DateTime, Utc};
use qdox_lsi::{LsiConfig, LsiModel, LsiPipeline};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

/// A ranked document resolved to its path
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDocument {
    pub index: usize,
    pub path: PathBuf,
    pub similarity: f64,
}

/// A corpus and the model fitted on it, published as one unit
#[derive(Debug)]
pub struct ModelSnapshot {
    generation: u64,
    created_at: DateTime<Utc>,
    corpus: Corpus,
    model: Arc<LsiModel>,
}

impl ModelSnapshot {
    /// Pair a corpus with the model fitted on it.
    ///
    /// # Errors
    /// Fails when the model does not have exactly one column per document.
    pub fn new(generation: u64, corpus: Corpus, model: Arc<LsiModel>) -> Result<Self> {
        if model.document_count() != corpus.len() {
            return Err(RetrieverError::SnapshotMismatch {
                documents: corpus.len(),
                columns: model.document_count(),
            });
        }
        Ok(Self {
            generation,
            created_at: Utc::now(),
            corpus,
            model,
        })
    }

    /// Load `root`, fit a fresh pipeline on it and release the document contents.
    pub fn build<F>(root: &Path, filter: F, config: &LsiConfig, generation: u64) -> Result<Self>
    where
        F: Fn(&Path) -> bool,
    {
        let mut corpus = Corpus::load(root, filter)?;
        let model = LsiPipeline::new(config.clone()).fit(&corpus.contents())?;
        corpus.release();
        info!(
            "Built snapshot {} from {} ({} documents, {} terms)",
            generation,
            root.display(),
            corpus.len(),
            model.vocabulary_len()
        );
        Self::new(generation, corpus, model)
    }

    /// Query with the default acceptance strategy
    pub fn query(&self, text: &str, top_n: usize, min_similarity: f64) -> QueryResult {
        self.query_with(AcceptanceStrategy::default(), text, top_n, min_similarity)
    }

    pub fn query_with(
        &self,
        strategy: AcceptanceStrategy,
        text: &str,
        top_n: usize,
        min_similarity: f64,
    ) -> QueryResult {
        QueryEngine::new(self.model.as_ref())
            .with_strategy(strategy)
            .query(text, top_n, min_similarity)
    }

    /// Attach document paths to the matches of `result`
    pub fn resolve(&self, result: &QueryResult) -> Vec<RankedDocument> {
        result
            .matches
            .iter()
            .filter_map(|m| {
                self.corpus.path(m.index).map(|path| RankedDocument {
                    index: m.index,
                    path: path.to_path_buf(),
                    similarity: m.similarity,
                })
            })
            .collect()
    }

    /// Monotonically increasing build number, 0 for the first snapshot
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn model(&self) -> &Arc<LsiModel> {
        &self.model
    }

    pub fn document_count(&self) -> usize {
        self.corpus.len()
    }
}

/// The published snapshot shared between the reindex loop and query callers.
///
/// Cloning a context yields another handle to the same published snapshot.
#[derive(Debug, Clone)]
pub struct SearchContext {
    current: Arc<watch::Sender<Option<Arc<ModelSnapshot>>>>,
    strategy: AcceptanceStrategy,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchContext {
    /// A context with nothing published yet
    pub fn new() -> Self {
        let (current, _) = watch::channel(None);
        Self {
            current: Arc::new(current),
            strategy: AcceptanceStrategy::default(),
        }
    }

    /// A context with `snapshot` already published
    pub fn with_snapshot(snapshot: ModelSnapshot) -> Self {
        let context = Self::new();
        context.publish(Arc::new(snapshot));
        context
    }

    pub fn with_strategy(self, strategy: AcceptanceStrategy) -> Self {
        Self { strategy, ..self }
    }

    /// Atomically replace the published snapshot
    pub fn publish(&self, snapshot: Arc<ModelSnapshot>) {
        let generation = snapshot.generation();
        let documents = snapshot.document_count();
        self.current.send_replace(Some(snapshot));
        info!(
            "Published snapshot {} ({} documents)",
            generation, documents
        );
    }

    /// The snapshot queries should run against right now
    pub fn current(&self) -> Option<Arc<ModelSnapshot>> {
        self.current.borrow().clone()
    }

    /// Receiver notified on every publish
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<ModelSnapshot>>> {
        self.current.subscribe()
    }

    /// Callback suitable for [`ReindexCoordinator::start`](super::reindex::ReindexCoordinator::start)
    pub fn publisher(&self) -> impl Fn(Arc<ModelSnapshot>) + Send + Sync + 'static {
        let context = self.clone();
        move |snapshot| context.publish(snapshot)
    }

    /// Run a query against the current snapshot.
    ///
    /// Reports [`QueryError::PipelineNotFit`] when nothing has been published.
    pub fn query(&self, text: &str, top_n: usize, min_similarity: f64) -> QueryResult {
        match self.current() {
            Some(snapshot) => snapshot.query_with(self.strategy, text, top_n, min_similarity),
            None => QueryResult::failed(text, QueryError::PipelineNotFit),
        }
    }
}
