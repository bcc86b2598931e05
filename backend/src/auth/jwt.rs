use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{AppError, AppResult};

/// Access-token claims issued by the auth provider. Only the fields this
/// service reads are listed.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iat: Option<i64>,
    pub aud: String,
    #[serde(default)]
    pub role: Option<String>,
}

pub fn verify_token(token: &str, config: &Config) -> AppResult<TokenData<Claims>> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    validation.set_audience(&[config.jwt_audience.as_str()]);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        tracing::debug!(error = %e, "Rejected access token");
        AppError::Unauthorized
    })
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::*;
    use crate::test_support::{access_token, test_config};

    fn config() -> Config {
        test_config("http://127.0.0.1:9/webhook")
    }

    #[test]
    fn test_valid_token_yields_claims() {
        let config = config();
        let user_id = Uuid::new_v4();
        let token = access_token(user_id, Some("u1@example.com"), &config);

        let data = verify_token(&token, &config).unwrap();
        assert_eq!(data.claims.sub, user_id);
        assert_eq!(data.claims.email.as_deref(), Some("u1@example.com"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let config = config();
        let mut other = config.clone();
        other.jwt_secret = "someone-else".into();
        let token = access_token(Uuid::new_v4(), None, &other);

        assert!(matches!(
            verify_token(&token, &config),
            Err(AppError::Unauthorized)
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let config = config();
        let claims = Claims {
            sub: Uuid::new_v4(),
            email: None,
            exp: (Utc::now() - Duration::hours(1)).timestamp(),
            iat: None,
            aud: config.jwt_audience.clone(),
            role: Some("authenticated".into()),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let config = config();
        let mut anon = config.clone();
        anon.jwt_audience = "anon".into();
        let token = access_token(Uuid::new_v4(), None, &anon);

        assert!(verify_token(&token, &config).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(verify_token("not-a-jwt", &config()).is_err());
    }
}
