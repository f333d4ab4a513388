pub mod corpus;
pub mod query;
pub mod reindex;
pub mod snapshot;
