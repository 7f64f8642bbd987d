//! Retrieval module.
//!
//! This module provides:
//! - `CorpusStore`: abstract vector-store boundary with named collections
//! - `SqliteCorpusStore`: in-process SQLite implementation
//! - `FusionRetriever`: multi-query fusion search with score deduplication
//! - query expansion and PRD-intent detection helpers

pub mod expansion;
pub mod fusion;
pub mod intent;
pub mod sqlite;
pub mod store;

pub use expansion::expand_query;
pub use fusion::FusionRetriever;
pub use intent::is_prd_prompt;
pub use sqlite::SqliteCorpusStore;
pub use store::{CorpusStore, RetrievedChunk, ScoredHit, StoredChunk};
