use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LogStore, StoreError};
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};

/// Process-local store. Entries are lost on restart.
#[derive(Default)]
pub struct MemoryLogStore {
    entries: RwLock<Vec<MoodEntry>>,
    offline: AtomicBool,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with [`StoreError::Unavailable`].
    #[cfg(test)]
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable);
        }
        Ok(())
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, entry: NewMoodEntry) -> Result<MoodEntry, StoreError> {
        self.check_online()?;
        let entry = entry.into_entry(Uuid::new_v4());
        self.entries.write().await.push(entry.clone());
        Ok(entry)
    }

    async fn list_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<MoodEntry>, StoreError> {
        self.check_online()?;
        let entries = self.entries.read().await;

        // Newest insert first, then a stable sort keeps that order on equal timestamps.
        let mut found: Vec<MoodEntry> = entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        found.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(found)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
