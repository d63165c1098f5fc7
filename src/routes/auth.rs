use axum::{extract::State, http::HeaderMap, Json};
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::identity::bearer_token;
use crate::models::{LoginRequest, TokenResponse, User};
use crate::security;
use crate::AppState;

/// Exchange username/password for a signed access token.
///
/// Unknown users, wrong passwords and deactivated accounts all collapse
/// into the same `invalid_credentials` response.
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>> {
    state.audit.record("anonymous", "auth_login_attempt", None);

    let (Some(username), Some(password)) = (payload.username.as_deref(), payload.password.as_deref())
    else {
        return Err(AppError::MissingCredentials);
    };
    if username.is_empty() || password.is_empty() {
        return Err(AppError::MissingCredentials);
    }

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(&state.pool)
        .await?;

    let Some(user) = user else {
        return Err(AppError::InvalidCredentials);
    };
    if !user.is_active || !security::verify_password(password, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = security::issue_token(&user, &state.config)?;
    tracing::info!("Issued access token for {}", user.username);

    Ok(Json(TokenResponse::bearer(token)))
}

/// Re-issue a token for the holder of a still-valid one.
///
/// The account is re-checked against the database so deactivated or deleted
/// users cannot keep refreshing.
pub async fn refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>> {
    let token = bearer_token(&headers).ok_or(AppError::Unauthorized)?;
    let claims = security::verify_token(token, &state.config)?;
    let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AppError::Unauthorized)?;

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(&state.pool)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::Unauthorized);
    }

    let token = security::issue_token(&user, &state.config)?;
    Ok(Json(TokenResponse::bearer(token)))
}
