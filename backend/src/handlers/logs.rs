use axum::{extract::State, Extension, Json};

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::extract::AppQuery;
use crate::models::mood_entry::{LogQuery, MoodEntryView};
use crate::AppState;

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

pub async fn list_logs(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
    AppQuery(query): AppQuery<LogQuery>,
) -> AppResult<Json<Vec<MoodEntryView>>> {
    if let Some(requested) = query.user_id {
        if requested != auth_user.id {
            return Err(AppError::Forbidden);
        }
    }

    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let entries = state.store.list_by_user(auth_user.id, limit).await?;

    Ok(Json(entries.into_iter().map(MoodEntryView::from).collect()))
}
