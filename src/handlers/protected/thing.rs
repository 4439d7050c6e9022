// handlers/protected/thing.rs - /things routes

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use super::owned_thing;
use crate::api::{ApiJson, ApiPath};
use crate::database::models::{Thing, ThingChanges};
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::validation::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateThing {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CreateThing>,
) -> ApiResult<Thing> {
    let mut errors = FieldErrors::new();
    errors.name("name", &body.name);
    errors.into_result()?;

    let thing = Thing::new(session.organization_id, body.name.trim(), body.description);
    state.store.things.insert(&thing).await?;

    tracing::info!("Created thing {} in {}", thing.id, thing.organization_id);
    Ok(ApiResponse::created(thing).with_message("Thing created"))
}

pub async fn list(State(state): State<AppState>, session: Session) -> ApiResult<Vec<Thing>> {
    let things = state.store.things.find_by_organization(session.organization_id).await?;
    Ok(ApiResponse::success(things))
}

pub async fn get(
    State(state): State<AppState>,
    session: Session,
    ApiPath(thing_id): ApiPath<Uuid>,
) -> ApiResult<Thing> {
    Ok(ApiResponse::success(owned_thing(&state, &session, thing_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiPath(thing_id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<ThingChanges>,
) -> ApiResult<Thing> {
    if let Some(name) = &changes.name {
        let mut errors = FieldErrors::new();
        errors.name("name", name);
        errors.into_result()?;
    }

    let mut thing = owned_thing(&state, &session, thing_id).await?;
    thing.apply(changes);
    state.store.things.update(&thing).await?;

    Ok(ApiResponse::success(thing).with_message("Thing updated"))
}

/// Presets go with the thing in the relational store; sensors are removed
/// from the document store afterwards
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    ApiPath(thing_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_thing(&state, &session, thing_id).await?;
    state.store.things.delete(thing_id).await?;

    match state.store.sensors.delete_by_things(&[thing_id]).await {
        Ok(removed) => tracing::info!("Deleted thing {} and {} sensors", thing_id, removed),
        Err(e) => tracing::error!("Deleted thing {} but its sensors remain: {}", thing_id, e),
    }

    Ok(ApiResponse::message_only("Thing deleted"))
}
