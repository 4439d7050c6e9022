// handlers/public/auth.rs - POST /auth/login and POST /auth/signup

use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiJson;
use crate::database::models::User;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, SESSION_COOKIE};
use crate::services::{NewUser, ServiceError};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub organization_id: Uuid,
    #[serde(flatten)]
    pub user: NewUser,
}

/**
 * POST /auth/login - Exchange email and password for a session token
 *
 * The token is returned in the body and also set as an HttpOnly cookie so
 * browser clients need no header handling. Unknown emails and wrong
 * passwords produce the same 401.
 */
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<LoginResponse>), ApiError> {
    let user = state.users.authenticate(&body.email, &body.password).await?;
    let issued = state
        .tokens
        .issue(user.id, user.organization_id)
        .map_err(ServiceError::from)?;

    let cookie = Cookie::build((SESSION_COOKIE, issued.token.clone()))
        .http_only(true)
        .secure(state.cookie_secure)
        .same_site(SameSite::Lax)
        .path("/");

    tracing::info!("User {} logged in", user.id);
    Ok((
        jar.add(cookie),
        ApiResponse::success(LoginResponse {
            token: issued.token,
            expires_at: issued.expires_at,
            user,
        }),
    ))
}

/// POST /auth/signup - Join an organization; its first user becomes admin
pub async fn signup(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<SignupRequest>,
) -> Result<ApiResponse<User>, ApiError> {
    let user = state.users.signup(body.organization_id, body.user).await?;
    Ok(ApiResponse::created(user).with_message("User created"))
}
