//! qdox-retriever: semantic search over a folder of text documents
//!
//! This crate loads every matching file under a folder, fits an LSI model
//! (see [`qdox_lsi`]) on the contents and answers free-text queries with the
//! most similar documents. A background coordinator watches the folder and
//! republishes a freshly fitted model whenever files change, while queries
//! keep running against whichever snapshot was current when they started.
//!
//! ## Key Modules
//!
//! - **[`retrieval`]**: corpus loading, query ranking, snapshots and live reindexing
//! - **[`config`]**: `qdox.toml` settings
//! - **[`error`]**: [`RetrieverError`] and [`QueryError`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use qdox_retriever::retrieval::{
//!     corpus::PathPattern,
//!     reindex::{ReindexConfig, ReindexCoordinator},
//!     snapshot::{ModelSnapshot, SearchContext},
//! };
//! use qdox_lsi::LsiConfig;
//! use std::path::Path;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let root = Path::new("./notes");
//! let pattern = PathPattern::new(r"\.txt$")?;
//! let first = ModelSnapshot::build(root, |p| pattern.matches(p), &LsiConfig::default(), 0)?;
//! let context = SearchContext::with_snapshot(first);
//!
//! let config = ReindexConfig::new(root, pattern.into_filter()).with_first_generation(1);
//! let mut coordinator = ReindexCoordinator::start(config, context.publisher()).await?;
//!
//! let result = context.query("wild weekend", 5, 0.3);
//! println!("{:?}", result.matches);
//!
//! coordinator.stop().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Folder → Corpus → LsiPipeline::fit → ModelSnapshot → SearchContext → QueryEngine
//!   ↑                                                      ↑
//! PollWatcher → ReindexCoordinator ─────── publish ────────┘
//! ```

pub mod config;
pub mod error;
pub mod retrieval;

pub use config::QdoxConfig;
pub use error::{QueryError, Result, RetrieverError};
