// handlers/protected/operator.rs - /operators routes

use axum::extract::State;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::api::{ApiJson, ApiPath};
use crate::database::models::{Operator, OperatorChanges};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::validation::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOperator {
    pub name: String,
    #[serde(default)]
    pub thing_ids: Vec<Uuid>,
}

/// Every referenced thing must belong to the caller's organization
async fn check_things(state: &AppState, session: &Session, thing_ids: &[Uuid]) -> Result<(), ApiError> {
    if thing_ids.is_empty() {
        return Ok(());
    }
    let owned: HashSet<Uuid> = state
        .store
        .things
        .find_by_organization(session.organization_id)
        .await?
        .into_iter()
        .map(|thing| thing.id)
        .collect();

    if let Some(unknown) = thing_ids.iter().find(|id| !owned.contains(*id)) {
        let mut errors = FieldErrors::new();
        errors.add("thingIds", format!("Unknown thing {}", unknown));
        errors.into_result()?;
    }
    Ok(())
}

async fn owned_operator(state: &AppState, session: &Session, operator_id: Uuid) -> Result<Operator, ApiError> {
    match state.store.operators.find_by_id(operator_id).await? {
        Some(operator) if operator.organization_id == session.organization_id => Ok(operator),
        _ => Err(ApiError::not_found("Operator not found")),
    }
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CreateOperator>,
) -> ApiResult<Operator> {
    let mut errors = FieldErrors::new();
    errors.name("name", &body.name);
    errors.into_result()?;
    check_things(&state, &session, &body.thing_ids).await?;

    let operator = Operator::new(session.organization_id, body.name.trim(), body.thing_ids);
    state.store.operators.insert(&operator).await?;

    tracing::info!("Created operator {} in {}", operator.id, operator.organization_id);
    Ok(ApiResponse::created(operator).with_message("Operator created"))
}

pub async fn list(State(state): State<AppState>, session: Session) -> ApiResult<Vec<Operator>> {
    let operators = state.store.operators.find_by_organization(session.organization_id).await?;
    Ok(ApiResponse::success(operators))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiPath(operator_id): ApiPath<Uuid>,
    ApiJson(mut changes): ApiJson<OperatorChanges>,
) -> ApiResult<Operator> {
    if let Some(name) = &changes.name {
        let mut errors = FieldErrors::new();
        errors.name("name", name);
        errors.into_result()?;
    }
    changes.name = changes.name.map(|name| name.trim().to_string());
    if let Some(thing_ids) = &changes.thing_ids {
        check_things(&state, &session, thing_ids).await?;
    }

    let mut operator = owned_operator(&state, &session, operator_id).await?;
    operator.apply(changes);
    state.store.operators.update(&operator).await?;

    Ok(ApiResponse::success(operator).with_message("Operator updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    ApiPath(operator_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_operator(&state, &session, operator_id).await?;
    state.store.operators.delete(operator_id).await?;
    Ok(ApiResponse::message_only("Operator deleted"))
}
