//! Storage layer for sohub
//!
//! User profiles persist in SQLite; the corpus and vector index are
//! read-only files loaded elsewhere.

pub mod profile;
pub mod sqlite;

pub use profile::{
    MemoryProfileStore, ProfileService, ProfileStore, SqliteProfileStore, UserProfile,
};
pub use sqlite::Database;
