//! # qdox-lsi
//!
//! Latent semantic indexing for small document collections: a count
//! vectorizer with stop-word removal, TF-IDF weighting and a truncated SVD,
//! fitted once on a corpus and then reused to project queries into the same
//! reduced space.
//!
//! ## Quick Start
//!
//! ```
//! use qdox_lsi::{LsiConfig, LsiPipeline, VectorSpace};
//!
//! # fn example() -> qdox_lsi::Result<()> {
//! let texts = [
//!     "wild weekend in the mountains",
//!     "wild animals of the mountains",
//!     "weekend brunch recipes",
//!     "quarterly revenue report",
//!     "revenue growth over the weekend",
//! ];
//!
//! let mut pipeline = LsiPipeline::new(LsiConfig::default().with_rank(2));
//! pipeline.fit(&texts)?;
//!
//! let query = pipeline.transform("wild weekend")?;
//! for doc in 0..pipeline.column_count() {
//!     println!("{doc}: {:.2}", pipeline.column_similarity(&query, doc));
//! }
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```
//!
//! ## Architecture
//!
//! - [`text`]: tokenizer and the built-in English stop words
//! - [`svd`]: truncated singular value decomposition over `ndarray`
//! - [`model`]: the immutable fitted [`LsiModel`]
//! - [`pipeline`]: the [`VectorSpace`] trait and the stateful [`LsiPipeline`]
//! - [`config`]: rank and stop-word configuration
//! - [`error`]: [`PipelineError`] and the crate [`Result`]

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod svd;
pub mod text;

pub use config::{DEFAULT_RANK, LsiConfig, StopWords};
pub use error::{PipelineError, Result};
pub use model::{LsiModel, cosine_similarity};
pub use pipeline::{LsiPipeline, VectorSpace};
pub use text::Tokenizer;
