//! Bearer-token authentication.
//!
//! Tokens are HS256 JWTs carrying the user id and role. Handlers opt in by
//! taking an [`AuthUser`] (any active account) or [`AdminUser`] (admin role)
//! extractor argument; both reload the account from the database so revoked
//! or deactivated users are cut off even with a live token.
use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::header::AUTHORIZATION, http::request::Parts};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    error::AppError,
    state::AppState,
    user::{Role, User},
};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i32,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

pub fn generate_token(config: &Config, user_id: i32, role: Role) -> Result<String, AppError> {
    let now = Utc::now();

    let claims = Claims {
        sub: user_id,
        role,
        iat: now.timestamp(),
        exp: (now + Duration::days(config.jwt_expires_in_days)).timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to sign token: {e}")))
}

pub fn decode_token(secret: &str, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => {
            AppError::Unauthorized("Token expired - please login again".to_string())
        }
        _ => AppError::Unauthorized("Invalid token".to_string()),
    })
}

/// Authenticated account, loaded fresh from the database.
pub struct AuthUser(pub User);

/// Authenticated account that also passed the admin role check.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "));

        let Some(token) = token else {
            return Err(AppError::Unauthorized(
                "Access token is required".to_string(),
            ));
        };

        let claims = decode_token(&state.config.jwt_secret, token)?;

        let user = User::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

        if !user.is_active {
            return Err(AppError::Unauthorized("Account is deactivated".to_string()));
        }

        Ok(AuthUser(user))
    }
}

#[async_trait]
impl FromRequestParts<Arc<AppState>> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            return Err(AppError::Forbidden("Admin access required".to_string()));
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use jsonwebtoken::{encode, EncodingKey, Header};

    use super::{decode_token, generate_token, Claims};
    use crate::{config::Config, error::AppError, user::Role};

    fn test_config() -> Config {
        let mut config = Config::load();
        config.jwt_secret = "test-secret".to_string();
        config.jwt_expires_in_days = 3;
        config
    }

    #[test]
    fn test_token_roundtrip() {
        let config = test_config();

        let token = generate_token(&config, 42, Role::Admin).unwrap();
        let claims = decode_token(&config.jwt_secret, &token).unwrap();

        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token() {
        let config = test_config();
        let now = chrono::Utc::now().timestamp();

        let claims = Claims {
            sub: 7,
            role: Role::User,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
        )
        .unwrap();

        match decode_token(&config.jwt_secret, &token) {
            Err(AppError::Unauthorized(message)) => {
                assert_eq!(message, "Token expired - please login again");
            }
            other => panic!("expected expired-token rejection, got {other:?}"),
        }
    }

    #[test]
    fn test_wrong_secret() {
        let config = test_config();

        let token = generate_token(&config, 1, Role::User).unwrap();

        match decode_token("another-secret", &token) {
            Err(AppError::Unauthorized(message)) => assert_eq!(message, "Invalid token"),
            other => panic!("expected invalid-token rejection, got {other:?}"),
        }
    }
}
