use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{create_pool, LogStore, StoreError};
use crate::models::mood_entry::{MoodEntry, NewMoodEntry};

pub struct PgLogStore {
    pool: PgPool,
}

impl PgLogStore {
    /// Connects and brings the schema up to date.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = create_pool(database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        Ok(Self { pool })
    }
}

#[async_trait]
impl LogStore for PgLogStore {
    async fn insert(&self, entry: NewMoodEntry) -> Result<MoodEntry, StoreError> {
        let row = sqlx::query_as::<_, MoodEntry>(
            r#"
            INSERT INTO mood_entries (id, user_id, mood, mood_rating, recommendation, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(entry.user_id)
        .bind(&entry.mood)
        .bind(entry.mood_rating)
        .bind(&entry.recommendation)
        .bind(entry.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    async fn list_by_user(&self, user_id: Uuid, limit: i64) -> Result<Vec<MoodEntry>, StoreError> {
        let rows = sqlx::query_as::<_, MoodEntry>(
            r#"
            SELECT * FROM mood_entries
            WHERE user_id = $1
            ORDER BY created_at DESC, seq DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    fn entry(user_id: Uuid, mood: &str, created_at: chrono::DateTime<Utc>) -> NewMoodEntry {
        NewMoodEntry {
            user_id,
            mood: mood.into(),
            mood_rating: 3,
            recommendation: "X".into(),
            created_at,
        }
    }

    #[tokio::test]
    #[ignore = "needs a Postgres DATABASE_URL"]
    async fn test_equal_timestamps_list_latest_insert_first() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL");
        let store = PgLogStore::connect(&url).await.unwrap();
        let user = Uuid::new_v4();
        let at = Utc::now();

        store.insert(entry(user, "first", at)).await.unwrap();
        store.insert(entry(user, "second", at)).await.unwrap();
        store.insert(entry(user, "third", at)).await.unwrap();

        let moods: Vec<String> = store
            .list_by_user(user, 10)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.mood)
            .collect();
        assert_eq!(moods, ["third", "second", "first"]);

        store.close().await;
    }
}
