// handlers/protected/organization.rs - GET|PUT|DELETE /organization
//
// Always the caller's own organization; changes take an admin.

use axum::extract::State;
use chrono::Utc;
use serde::Deserialize;
use uuid::Uuid;

use crate::api::ApiJson;
use crate::database::models::Organization;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::validation::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct UpdateOrganization {
    pub name: String,
}

async fn current(state: &AppState, session: &Session) -> Result<Organization, ApiError> {
    state
        .store
        .organizations
        .find_by_id(session.organization_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Organization not found"))
}

async fn require_admin(state: &AppState, session: &Session) -> Result<(), ApiError> {
    let actor = state.users.actor(session.user_id).await?;
    if !actor.role.is_admin() {
        return Err(ApiError::forbidden("Admin role required"));
    }
    Ok(())
}

pub async fn get(State(state): State<AppState>, session: Session) -> ApiResult<Organization> {
    Ok(ApiResponse::success(current(&state, &session).await?))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<UpdateOrganization>,
) -> ApiResult<Organization> {
    require_admin(&state, &session).await?;

    let mut errors = FieldErrors::new();
    errors.name("name", &body.name);
    errors.into_result()?;

    let mut organization = current(&state, &session).await?;
    organization.name = body.name.trim().to_string();
    organization.updated_at = Utc::now();
    state.store.organizations.update(&organization).await?;

    Ok(ApiResponse::success(organization).with_message("Organization updated"))
}

/// Deletes the organization with its users, things, presets and operators,
/// then the sensors of its things from the document store
pub async fn delete(State(state): State<AppState>, session: Session) -> ApiResult<()> {
    require_admin(&state, &session).await?;

    let thing_ids: Vec<Uuid> = state
        .store
        .things
        .find_by_organization(session.organization_id)
        .await?
        .into_iter()
        .map(|thing| thing.id)
        .collect();

    state.store.organizations.delete(session.organization_id).await?;

    // The relational delete is committed; leftover sensors are orphans, not a failed request
    match state.store.sensors.delete_by_things(&thing_ids).await {
        Ok(removed) => tracing::info!(
            "Deleted organization {} and {} sensors",
            session.organization_id,
            removed
        ),
        Err(e) => tracing::error!(
            "Deleted organization {} but its sensors remain: {}",
            session.organization_id,
            e
        ),
    }

    Ok(ApiResponse::message_only("Organization deleted"))
}
