// handlers/public/organization.rs - GET/POST /organizations
//
// Listing and creating organizations needs no session: a new tenant is
// created here, then its first user signs up and becomes its admin.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiJson;
use crate::database::models::Organization;
use crate::middleware::{ApiResponse, ApiResult};
use crate::services::validation::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateOrganization {
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct CreatedOrganization {
    pub id: Uuid,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Vec<Organization>> {
    let organizations = state.store.organizations.find_all().await?;
    Ok(ApiResponse::success(organizations))
}

pub async fn create(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<CreateOrganization>,
) -> ApiResult<CreatedOrganization> {
    let mut errors = FieldErrors::new();
    errors.name("name", &body.name);
    errors.into_result()?;

    let organization = Organization::new(body.name.trim());
    state.store.organizations.insert(&organization).await?;

    tracing::info!("Created organization {} ({})", organization.id, organization.name);
    Ok(ApiResponse::created(CreatedOrganization { id: organization.id })
        .with_message("Organization created"))
}
