//! Ranking documents against a free-text query.
//!
//! The engine scores a query against every document of a [`VectorSpace`] in
//! corpus order, filters candidates with an [`AcceptanceStrategy`], sorts the
//! survivors by similarity (descending, ties by ascending document index) and
//! truncates to the requested count.

use crate::error::QueryError;
use qdox_lsi::VectorSpace;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How candidates are admitted while scanning documents in corpus order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AcceptanceStrategy {
    /// Accept a document only if it clears the threshold and is at least as
    /// similar as every document accepted before it. A later document that
    /// clears the threshold is dropped when an earlier one scored higher.
    #[default]
    MonotonicScan,
    /// Accept every document that clears the threshold
    Threshold,
}

impl std::fmt::Display for AcceptanceStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AcceptanceStrategy::MonotonicScan => write!(f, "monotonic-scan"),
            AcceptanceStrategy::Threshold => write!(f, "threshold"),
        }
    }
}

impl std::str::FromStr for AcceptanceStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "monotonic-scan" | "monotonic_scan" | "monotonic" => {
                Ok(AcceptanceStrategy::MonotonicScan)
            }
            "threshold" => Ok(AcceptanceStrategy::Threshold),
            _ => Err(format!("Invalid acceptance strategy: {s}")),
        }
    }
}

/// One ranked document
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Match {
    /// Position of the document in the corpus
    pub index: usize,
    /// Cosine similarity to the query, in `[-1, 1]`
    pub similarity: f64,
}

/// Outcome of a single query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query: String,
    pub matches: Vec<Match>,
    pub error: Option<QueryError>,
}

impl QueryResult {
    pub fn new(query: impl Into<String>, matches: Vec<Match>) -> Self {
        Self {
            query: query.into(),
            matches,
            error: None,
        }
    }

    /// A result carrying `error` and no matches
    pub fn failed(query: impl Into<String>, error: QueryError) -> Self {
        Self {
            query: query.into(),
            matches: Vec::new(),
            error: Some(error),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Document indices in ranked order
    pub fn indices(&self) -> Vec<usize> {
        self.matches.iter().map(|m| m.index).collect()
    }
}

/// Read-only query execution over a fitted vector space
pub struct QueryEngine<'a, V: VectorSpace + ?Sized> {
    space: &'a V,
    strategy: AcceptanceStrategy,
}

impl<'a, V: VectorSpace + ?Sized> QueryEngine<'a, V> {
    pub fn new(space: &'a V) -> Self {
        Self {
            space,
            strategy: AcceptanceStrategy::default(),
        }
    }

    pub fn with_strategy(self, strategy: AcceptanceStrategy) -> Self {
        Self { strategy, ..self }
    }

    /// Rank every document against `text`.
    ///
    /// At most `top_n` matches with similarity `>= min_similarity` are
    /// returned; `top_n == 0` always yields no matches. Projection failures
    /// are reported in [`QueryResult::error`].
    pub fn query(&self, text: &str, top_n: usize, min_similarity: f64) -> QueryResult {
        let vector = match self.space.transform(text) {
            Ok(vector) => vector,
            Err(e) => {
                debug!("Query {:?} failed: {}", text, e);
                return QueryResult::failed(text, QueryError::from(e));
            }
        };

        let similarities =
            (0..self.space.column_count()).map(|i| self.space.column_similarity(&vector, i));
        let matches = rank(similarities, top_n, min_similarity, self.strategy);

        debug!(
            "Query {:?}: {} matches (top_n={}, min_similarity={:.2}, strategy={})",
            text,
            matches.len(),
            top_n,
            min_similarity,
            self.strategy
        );
        QueryResult::new(text, matches)
    }
}

/// Filter, sort and truncate per-document similarities given in corpus order
pub fn rank<I>(
    similarities: I,
    top_n: usize,
    min_similarity: f64,
    strategy: AcceptanceStrategy,
) -> Vec<Match>
where
    I: IntoIterator<Item = f64>,
{
    if top_n == 0 {
        return Vec::new();
    }

    let mut running_max = -1.0_f64;
    let mut matches: Vec<Match> = Vec::new();
    for (index, similarity) in similarities.into_iter().enumerate() {
        if similarity < min_similarity {
            continue;
        }
        if strategy == AcceptanceStrategy::MonotonicScan {
            if similarity < running_max {
                continue;
            }
            running_max = similarity;
        }
        matches.push(Match { index, similarity });
    }

    matches.sort_by(|a, b| {
        b.similarity
            .total_cmp(&a.similarity)
            .then(a.index.cmp(&b.index))
    });
    matches.truncate(top_n);
    matches
}
