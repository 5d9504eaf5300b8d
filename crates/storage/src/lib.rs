//! # Storage
//!
//! SQLite persistence for the memex corpus: the `memories` table (one row per
//! saved page, deduped per user by canonical URL) and the `recent_searches`
//! cache table (one row per (user, normalized query) with a snapshot marker
//! for implicit invalidation).
//!
//! Repositories implement the `memex-core` store traits over a shared sqlx
//! pool. Embeddings are stored as little-endian f32 BLOBs.

mod codec;
mod memory_repo;
mod search_cache_repo;
mod sqlite_pool;

pub use codec::{bytes_to_embedding, embedding_to_bytes};
pub use memory_repo::MemoryRepository;
pub use search_cache_repo::SearchCacheRepository;
pub use sqlite_pool::SqlitePoolManager;
