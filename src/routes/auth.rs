use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tracing::info;

use crate::{
    auth::{generate_token, AuthUser},
    error::AppError,
    state::AppState,
    user::{hash_password, verify_password, LoginRequest, NewUser, RegisterRequest, Role, User},
    validate::{validate_login, validate_register},
};

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/profile", get(profile_handler))
        .route("/logout", post(logout_handler))
}

async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_register(&payload)?;

    let email = payload
        .email
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();
    let username = payload.username.as_deref().unwrap_or_default().trim();

    if User::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    if User::find_by_username(&state.pool, username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(
            "This username is already taken".to_string(),
        ));
    }

    let password_hash = hash_password(payload.password.as_deref().unwrap_or_default())?;

    let user = User::create(
        &state.pool,
        NewUser {
            first_name: payload
                .first_name
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            last_name: payload
                .last_name
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_string(),
            username: username.to_string(),
            email,
            password_hash,
            gender: payload.gender.clone().unwrap_or_default(),
            role: Role::User,
        },
    )
    .await?;

    info!("Registered user {} ({})", user.id, user.username);

    let token = generate_token(&state.config, user.id, user.role)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Account created successfully",
            "data": {
                "user": user,
                "token": token,
            },
        })),
    ))
}

async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_login(&payload)?;

    let email = payload
        .email
        .as_deref()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    let Some(user) = User::find_by_email(&state.pool, &email).await? else {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    };

    if !user.is_active {
        return Err(AppError::Unauthorized(
            "Your account has been deactivated. Please contact support.".to_string(),
        ));
    }

    if !verify_password(payload.password.as_deref().unwrap_or_default(), &user.password) {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    User::touch_last_login(&state.pool, user.id).await?;

    info!("User {} logged in", user.id);

    let token = generate_token(&state.config, user.id, user.role)?;

    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "data": {
            "user": user,
            "token": token,
        },
    })))
}

async fn profile_handler(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    Ok(Json(json!({
        "success": true,
        "message": "Profile retrieved successfully",
        "data": { "user": user },
    })))
}

async fn logout_handler(AuthUser(user): AuthUser) -> Result<impl IntoResponse, AppError> {
    info!("User {} logged out", user.id);

    Ok(Json(json!({
        "success": true,
        "message": "Logged out successfully",
    })))
}
