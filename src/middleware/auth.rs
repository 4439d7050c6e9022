use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use uuid::Uuid;

use crate::auth::AuthError;
use crate::error::ApiError;
use crate::AppState;

/// Name of the cookie login sets; also read when no header is sent
pub const SESSION_COOKIE: &str = "Authorization";

/// Identity of the caller: a verified token whose user still exists
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub organization_id: Uuid,
}

/// Session middleware for private routes. Rejects the request with 401
/// before any handler runs unless a valid token is presented and its user
/// still exists; a deleted user's token is dead even before it expires.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = token_from_headers(request.headers())
        .and_then(|token| state.tokens.verify(&token))
        .map_err(|e| reject(e, &request))?;

    let user = state.store.users.find_by_id(claims.user_id).await?.ok_or_else(|| {
        tracing::warn!("Session user {} no longer exists", claims.user_id);
        ApiError::from(AuthError::Invalid)
    })?;

    tracing::debug!("Session for user {} in {}", user.id, user.organization_id);
    request.extensions_mut().insert(Session {
        user_id: user.id,
        organization_id: user.organization_id,
    });

    Ok(next.run(request).await)
}

/// The one place a rejected token is logged; expired vs invalid shows here
/// and nowhere in the response
fn reject(err: AuthError, request: &Request) -> ApiError {
    tracing::warn!("{} on {} {}", err, request.method(), request.uri().path());
    ApiError::from(err)
}

/// Bearer token from the Authorization header, falling back to the session
/// cookie when the header is absent
pub fn token_from_headers(headers: &HeaderMap) -> Result<String, AuthError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let value = value.to_str().map_err(|_| AuthError::Malformed)?;
        return match value.strip_prefix("Bearer ") {
            Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
            _ => Err(AuthError::Malformed),
        };
    }

    let jar = CookieJar::from_headers(headers);
    match jar.get(SESSION_COOKIE) {
        Some(cookie) => {
            let value = cookie.value();
            let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
            if token.is_empty() {
                Err(AuthError::Malformed)
            } else {
                Ok(token.to_string())
            }
        }
        None => Err(AuthError::Missing),
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Session>()
            .copied()
            .ok_or_else(|| ApiError::from(AuthError::Missing))
    }
}
