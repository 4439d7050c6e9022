// handlers/protected/auth.rs - GET /auth/whoami and POST /auth/logout

use axum::extract::State;
use axum_extra::extract::cookie::{Cookie, CookieJar};
use serde::Serialize;

use crate::database::models::{Organization, User};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session, SESSION_COOKIE};
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct WhoAmI {
    pub user: User,
    pub organization: Option<Organization>,
}

pub async fn whoami(State(state): State<AppState>, session: Session) -> ApiResult<WhoAmI> {
    let user = state.users.actor(session.user_id).await?;
    let organization = state.store.organizations.find_by_id(user.organization_id).await?;
    Ok(ApiResponse::success(WhoAmI { user, organization }))
}

/// Tokens are stateless; logging out only drops the cookie
pub async fn logout(jar: CookieJar, session: Session) -> Result<(CookieJar, ApiResponse<()>), ApiError> {
    tracing::info!("User {} logged out", session.user_id);
    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        ApiResponse::message_only("Logged out"),
    ))
}
