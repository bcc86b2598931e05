//! Log store: where mood entries live.
//!
//! Handlers only see [`LogStore`]. Production uses [`PgLogStore`]; the
//! in-process [`MemoryLogStore`] backs local runs without `DATABASE_URL` and
//! the test suite.

use async_trait::async_trait;
use uuid::Uuid;

use crate::models::mood_entry::{MoodEntry, NewMoodEntry};

mod memory;
mod pool;
mod postgres;

pub use memory::MemoryLogStore;
pub use pool::create_pool;
pub use postgres::PgLogStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("log store unavailable")]
    Unavailable,
}

#[async_trait]
pub trait LogStore: Send + Sync {
    async fn insert(&self, entry: NewMoodEntry) -> Result<MoodEntry, StoreError>;

    /// Entries for one user, newest first.
    async fn list_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<MoodEntry>, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}
