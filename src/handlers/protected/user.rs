// handlers/protected/user.rs - /users routes
//
// GET    /users           members of the caller's organization
// GET    /users/:userId   one member
// POST   /users           admin adds a user
// PUT    /users           caller edits their own profile
// PUT    /users/promote   admin sets a role (last-admin guarded)
// DELETE /users/:userId   self, or admin deleting others (last-admin guarded)

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::{ApiJson, ApiPath};
use crate::database::models::User;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::{NewUser, ProfileUpdate};
use crate::types::Role;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    #[serde(flatten)]
    pub user: NewUser,
    #[serde(default)]
    pub role: Option<Role>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromoteUser {
    pub user_id: Uuid,
    pub role: Role,
}

pub async fn list(State(state): State<AppState>, session: Session) -> ApiResult<Vec<User>> {
    let actor = state.users.actor(session.user_id).await?;
    Ok(ApiResponse::success(state.users.list(&actor).await?))
}

pub async fn get(
    State(state): State<AppState>,
    session: Session,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<User> {
    let actor = state.users.actor(session.user_id).await?;
    Ok(ApiResponse::success(state.users.member(&actor, user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CreateUser>,
) -> ApiResult<User> {
    let actor = state.users.actor(session.user_id).await?;
    let user = state
        .users
        .create_in_organization(&actor, body.user, body.role.unwrap_or(Role::Member))
        .await?;
    Ok(ApiResponse::created(user).with_message("User created"))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<ProfileUpdate>,
) -> ApiResult<User> {
    let actor = state.users.actor(session.user_id).await?;
    let user = state.users.update_profile(&actor, body).await?;
    Ok(ApiResponse::success(user).with_message("User updated"))
}

pub async fn promote(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<PromoteUser>,
) -> ApiResult<User> {
    let actor = state.users.actor(session.user_id).await?;
    let user = state.users.change_role(&actor, body.user_id, body.role).await?;
    Ok(ApiResponse::success(user).with_message("Role updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    ApiPath(user_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    let actor = state.users.actor(session.user_id).await?;
    state.users.delete(&actor, user_id).await?;
    Ok(ApiResponse::message_only("User deleted"))
}
