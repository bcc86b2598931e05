use axum::{extract::State, Extension, Json};
use chrono::Utc;
use validator::Validate;

use crate::auth::middleware::AuthUser;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::formatter::format_recommendation;
use crate::models::mood_entry::{NewMoodEntry, SubmitMoodRequest, SubmitMoodResponse};
use crate::services::recommendation::{RecommendationRequest, NO_RECOMMENDATION};
use crate::AppState;

pub async fn submit_mood(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppJson(body): AppJson<SubmitMoodRequest>,
) -> AppResult<Json<SubmitMoodResponse>> {
    body.validate()?;

    let request = RecommendationRequest {
        mood: body.mood.trim().to_string(),
        user_id: auth_user.id,
        email: auth_user.email.clone(),
        rating: body.rating,
        timestamp: Utc::now(),
    };

    let recommendation = state.recommender.recommend(&request).await?;

    let recommendation = match recommendation {
        Some(text) => {
            let entry = NewMoodEntry {
                user_id: request.user_id,
                mood: request.mood,
                mood_rating: request.rating,
                recommendation: text.clone(),
                created_at: request.timestamp,
            };
            // Best effort: the user already has their recommendation.
            match state.store.insert(entry).await {
                Ok(saved) => {
                    tracing::info!(user_id = %auth_user.id, entry_id = %saved.id, "Mood entry saved");
                }
                Err(e) => {
                    tracing::error!(user_id = %auth_user.id, error = %e, "Failed to persist mood entry");
                }
            }
            text
        }
        None => {
            tracing::warn!(user_id = %auth_user.id, "Webhook returned no recommendation; nothing persisted");
            NO_RECOMMENDATION.to_string()
        }
    };

    let formatted = format_recommendation(&recommendation);
    Ok(Json(SubmitMoodResponse {
        recommendation,
        formatted,
    }))
}
