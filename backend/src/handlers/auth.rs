use axum::{extract::State, Extension, Json};
use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::middleware::AuthUser;
use crate::error::{AppError, AppResult};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: Option<String>,
}

pub async fn me(Extension(auth_user): Extension<AuthUser>) -> Json<CurrentUser> {
    Json(CurrentUser {
        id: auth_user.id,
        email: auth_user.email,
    })
}

/// Ends the session at the auth provider. Without `AUTH_URL` there is nothing
/// to revoke server-side and the client just drops its token.
pub async fn logout(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AppResult<Json<Value>> {
    if let Some(auth_url) = &state.config.auth_url {
        let mut request = state
            .http
            .post(format!("{auth_url}/auth/v1/logout"))
            .bearer_auth(&auth_user.access_token);
        if let Some(key) = &state.config.auth_anon_key {
            request = request.header("apikey", key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AppError::AuthProvider(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AppError::AuthProvider(format!(
                "logout returned {}",
                response.status()
            )));
        }
    }

    tracing::info!(user_id = %auth_user.id, "User signed out");
    Ok(Json(json!({ "message": "Logged out successfully" })))
}
