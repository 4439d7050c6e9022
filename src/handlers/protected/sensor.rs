// handlers/protected/sensor.rs - /sensors routes
//
// Sensors live in the document store; ownership is proven through the thing
// they hang off. Every write stamps a fresh `lastUpdate` so pollers can ask
// for changes since their last read.

use axum::extract::State;
use serde::Deserialize;
use uuid::Uuid;

use super::owned_thing;
use crate::api::{ApiJson, ApiPath};
use crate::database::models::{Sensor, SensorFields};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::types::next_update_timestamp;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSensor {
    pub thing_id: Uuid,
    #[serde(flatten)]
    pub fields: SensorFields,
}

async fn owned_sensor(state: &AppState, session: &Session, sensor_id: Uuid) -> Result<Sensor, ApiError> {
    let sensor = state
        .store
        .sensors
        .find_by_id(sensor_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sensor not found"))?;

    owned_thing(state, session, sensor.thing_id)
        .await
        .map_err(|_| ApiError::not_found("Sensor not found"))?;
    Ok(sensor)
}

pub async fn create(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CreateSensor>,
) -> ApiResult<Sensor> {
    owned_thing(&state, &session, body.thing_id).await?;

    let sensor = Sensor::new(body.thing_id, body.fields, next_update_timestamp());
    state.store.sensors.insert(&sensor).await?;

    tracing::info!("Created sensor {} on thing {}", sensor.id, sensor.thing_id);
    Ok(ApiResponse::created(sensor).with_message("Sensor created"))
}

pub async fn get(
    State(state): State<AppState>,
    session: Session,
    ApiPath(sensor_id): ApiPath<Uuid>,
) -> ApiResult<Sensor> {
    Ok(ApiResponse::success(owned_sensor(&state, &session, sensor_id).await?))
}

pub async fn list_by_thing(
    State(state): State<AppState>,
    session: Session,
    ApiPath(thing_id): ApiPath<Uuid>,
) -> ApiResult<Vec<Sensor>> {
    owned_thing(&state, &session, thing_id).await?;
    Ok(ApiResponse::success(state.store.sensors.find_by_thing(thing_id).await?))
}

/// Sensors of a thing written strictly after `lastUpdate` (epoch ms)
pub async fn list_updated_since(
    State(state): State<AppState>,
    session: Session,
    ApiPath((thing_id, last_update)): ApiPath<(Uuid, i64)>,
) -> ApiResult<Vec<Sensor>> {
    owned_thing(&state, &session, thing_id).await?;
    let sensors = state
        .store
        .sensors
        .find_updated_since(thing_id, last_update)
        .await?;
    Ok(ApiResponse::success(sensors))
}

pub async fn update(
    State(state): State<AppState>,
    session: Session,
    ApiPath(sensor_id): ApiPath<Uuid>,
    ApiJson(changes): ApiJson<SensorFields>,
) -> ApiResult<Sensor> {
    owned_sensor(&state, &session, sensor_id).await?;
    let sensor = state
        .store
        .sensors
        .update(sensor_id, &changes, next_update_timestamp())
        .await?;
    Ok(ApiResponse::success(sensor).with_message("Sensor updated"))
}

pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    ApiPath(sensor_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_sensor(&state, &session, sensor_id).await?;
    state.store.sensors.delete(sensor_id).await?;
    Ok(ApiResponse::message_only("Sensor deleted"))
}
