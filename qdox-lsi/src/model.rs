//! The fitted latent-semantic model

use crate::config::LsiConfig;
use crate::error::{PipelineError, Result};
use crate::svd::truncated_svd;
use crate::text::Tokenizer;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use std::collections::HashMap;

/// A vocabulary, idf weights and truncated-SVD basis fitted on one corpus,
/// together with that corpus projected into the reduced space.
///
/// The model is immutable: refitting builds a new `LsiModel`. Column `i` of
/// [`reduced_matrix`](Self::reduced_matrix) is document `i` of the texts the
/// model was fitted on.
#[derive(Debug, Clone)]
pub struct LsiModel {
    config: LsiConfig,
    tokenizer: Tokenizer,
    vocabulary: HashMap<String, usize>,
    idf: Array1<f64>,
    basis: Array2<f64>,
    singular_values: Array1<f64>,
    reduced: Array2<f64>,
}

impl LsiModel {
    /// Fit a model on `texts`.
    ///
    /// Builds the vocabulary in first-seen term order, weights raw term counts
    /// by smoothed idf `ln((1 + n) / (1 + df)) + 1`, and reduces the
    /// term-document matrix to `config.rank` dimensions.
    ///
    /// # Errors
    /// - [`PipelineError::InvalidConfig`] for a zero rank
    /// - [`PipelineError::EmptyCorpus`] when `texts` is empty
    /// - [`PipelineError::EmptyVocabulary`] when no term survives stop-word removal
    /// - [`PipelineError::RankTooLarge`] when the rank exceeds documents or terms
    pub fn fit<S: AsRef<str>>(texts: &[S], config: &LsiConfig) -> Result<Self> {
        config.validate()?;
        if texts.is_empty() {
            return Err(PipelineError::EmptyCorpus);
        }

        let tokenizer = Tokenizer::new(&config.stop_words);
        let mut vocabulary: HashMap<String, usize> = HashMap::new();
        let documents: Vec<Vec<usize>> = texts
            .iter()
            .map(|text| {
                tokenizer
                    .terms(text.as_ref())
                    .map(|term| {
                        let next = vocabulary.len();
                        *vocabulary.entry(term).or_insert(next)
                    })
                    .collect()
            })
            .collect();

        let terms = vocabulary.len();
        let n_docs = documents.len();
        if terms == 0 {
            return Err(PipelineError::EmptyVocabulary);
        }
        if config.rank > n_docs.min(terms) {
            return Err(PipelineError::RankTooLarge {
                rank: config.rank,
                documents: n_docs,
                terms,
            });
        }

        let mut weighted = Array2::<f64>::zeros((terms, n_docs));
        for (doc, ids) in documents.iter().enumerate() {
            for &id in ids {
                weighted[[id, doc]] += 1.0;
            }
        }

        let idf: Array1<f64> = weighted
            .axis_iter(Axis(0))
            .map(|row| {
                let df = row.iter().filter(|&&count| count > 0.0).count() as f64;
                ((1.0 + n_docs as f64) / (1.0 + df)).ln() + 1.0
            })
            .collect();
        weighted *= &idf.view().insert_axis(Axis(1));

        let svd = truncated_svd(weighted.view(), config.rank);
        let reduced = svd.basis.t().dot(&weighted);

        tracing::debug!(
            "Fitted LSI model: {} documents, {} terms, rank {}, singular values {:?}",
            n_docs,
            terms,
            config.rank,
            svd.singular_values.as_slice()
        );

        Ok(Self {
            config: config.clone(),
            tokenizer,
            vocabulary,
            idf,
            basis: svd.basis,
            singular_values: svd.singular_values,
            reduced,
        })
    }

    /// TF-IDF weighted term vector of `text` over the fitted vocabulary.
    ///
    /// Unknown terms are dropped. Text without a single token is rejected.
    pub fn term_vector(&self, text: &str) -> Result<Array1<f64>> {
        let mut counts = Array1::<f64>::zeros(self.vocabulary.len());
        let mut tokens = 0usize;
        for token in self.tokenizer.raw_tokens(text) {
            tokens += 1;
            if let Some(&column) = self.vocabulary.get(&token) {
                counts[column] += 1.0;
            }
        }
        if tokens == 0 {
            return Err(PipelineError::transform("text contains no terms"));
        }
        Ok(counts * &self.idf)
    }

    /// Project `text` into the reduced space
    pub fn transform(&self, text: &str) -> Result<Array1<f64>> {
        let weighted = self.term_vector(text)?;
        Ok(self.basis.t().dot(&weighted))
    }

    /// Number of documents the model was fitted on
    pub fn document_count(&self) -> usize {
        self.reduced.ncols()
    }

    pub fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column index of `term` in the fitted vocabulary
    pub fn term_index(&self, term: &str) -> Option<usize> {
        self.vocabulary.get(term).copied()
    }

    /// Idf weight of `term`, if it is in the vocabulary
    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index(term).map(|i| self.idf[i])
    }

    pub fn rank(&self) -> usize {
        self.config.rank
    }

    pub fn config(&self) -> &LsiConfig {
        &self.config
    }

    pub fn singular_values(&self) -> &Array1<f64> {
        &self.singular_values
    }

    /// Reduced document matrix, one column per fitted document (rank × documents)
    pub fn reduced_matrix(&self) -> &Array2<f64> {
        &self.reduced
    }

    /// Reduced vector of document `index`
    pub fn document(&self, index: usize) -> Option<ArrayView1<'_, f64>> {
        (index < self.document_count()).then(|| self.reduced.column(index))
    }
}

/// Cosine similarity of two vectors, 0 when either has zero magnitude
pub fn cosine_similarity(a: ArrayView1<'_, f64>, b: ArrayView1<'_, f64>) -> f64 {
    let norm_a = a.dot(&a).sqrt();
    let norm_b = b.dot(&b).sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    (a.dot(&b) / (norm_a * norm_b)).clamp(-1.0, 1.0)
}
