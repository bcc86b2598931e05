use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::formatter::{format_recommendation, Block};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MoodEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub mood: String,
    pub mood_rating: Option<i32>,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

/// A fully-formed entry ready to be written. Only built once the webhook has
/// returned a real recommendation.
#[derive(Debug, Clone)]
pub struct NewMoodEntry {
    pub user_id: Uuid,
    pub mood: String,
    pub mood_rating: i32,
    pub recommendation: String,
    pub created_at: DateTime<Utc>,
}

impl NewMoodEntry {
    pub fn into_entry(self, id: Uuid) -> MoodEntry {
        MoodEntry {
            id,
            user_id: self.user_id,
            mood: self.mood,
            mood_rating: Some(self.mood_rating),
            recommendation: self.recommendation,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct SubmitMoodRequest {
    #[validate(
        length(min = 1, max = 2000, message = "Mood must be 1-2000 characters"),
        custom = "not_blank"
    )]
    pub mood: String,

    #[serde(alias = "mood_rating")]
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub rating: i32,
}

fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some("Mood must not be blank".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct SubmitMoodResponse {
    pub recommendation: String,
    pub formatted: Vec<Block>,
}

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub user_id: Option<Uuid>,
    pub limit: Option<i64>,
}

/// Dashboard row. Field names follow what the frontend already renders.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MoodEntryView {
    pub id: Uuid,
    pub mood: String,
    pub recommendation: String,
    pub date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mood_rating: Option<i32>,
    pub user_id: Uuid,
    pub formatted: Vec<Block>,
}

impl From<MoodEntry> for MoodEntryView {
    fn from(e: MoodEntry) -> Self {
        let formatted = format_recommendation(&e.recommendation);
        Self {
            id: e.id,
            mood: e.mood,
            recommendation: e.recommendation,
            date: e.created_at,
            mood_rating: e.mood_rating,
            user_id: e.user_id,
            formatted,
        }
    }
}
