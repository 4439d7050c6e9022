// handlers/protected/preset.rs - /chartpresets and /rawdatapresets routes
//
// Presets belong to a thing; names are unique per thing and a clash is a 409.
// Sensor ids a preset points at must be sensors of that same thing.

use axum::extract::State;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

use super::owned_thing;
use crate::api::{ApiJson, ApiPath};
use crate::database::models::{
    Chart, ChartPreset, ChartPresetChanges, RawDataPreset, RawDataPresetChanges,
};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Session};
use crate::services::validation::FieldErrors;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChartPreset {
    pub thing_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub charts: Vec<Chart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRawDataPreset {
    pub thing_id: Uuid,
    pub name: String,
    #[serde(default)]
    pub sensor_ids: Vec<Uuid>,
}

fn check_name(name: Option<&str>) -> Result<(), ApiError> {
    if let Some(name) = name {
        let mut errors = FieldErrors::new();
        errors.name("name", name);
        errors.into_result()?;
    }
    Ok(())
}

fn chart_sensor_ids(charts: &[Chart]) -> Vec<Uuid> {
    charts.iter().flat_map(|chart| chart.sensor_ids.iter().copied()).collect()
}

/// Every requested sensor id not already held in `kept` must be a sensor of
/// `thing_id`. Held ids pass unchecked: sensors are deleted in the document
/// store without touching presets, and a preset must still save as read.
async fn check_sensors(
    state: &AppState,
    thing_id: Uuid,
    field: &str,
    requested: &[Uuid],
    kept: &[Uuid],
) -> Result<(), ApiError> {
    let added: Vec<&Uuid> = requested.iter().filter(|id| !kept.contains(*id)).collect();
    if added.is_empty() {
        return Ok(());
    }

    let known: HashSet<Uuid> = state
        .store
        .sensors
        .find_by_thing(thing_id)
        .await?
        .into_iter()
        .map(|sensor| sensor.id)
        .collect();

    if let Some(unknown) = added.into_iter().find(|id| !known.contains(*id)) {
        let mut errors = FieldErrors::new();
        errors.add(field, format!("Unknown sensor {}", unknown));
        errors.into_result()?;
    }
    Ok(())
}

async fn owned_chart_preset(state: &AppState, session: &Session, preset_id: Uuid) -> Result<ChartPreset, ApiError> {
    let preset = state
        .store
        .chart_presets
        .find_by_id(preset_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Chart preset not found"))?;

    owned_thing(state, session, preset.thing_id)
        .await
        .map_err(|_| ApiError::not_found("Chart preset not found"))?;
    Ok(preset)
}

async fn owned_raw_data_preset(
    state: &AppState,
    session: &Session,
    preset_id: Uuid,
) -> Result<RawDataPreset, ApiError> {
    let preset = state
        .store
        .raw_data_presets
        .find_by_id(preset_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Raw data preset not found"))?;

    owned_thing(state, session, preset.thing_id)
        .await
        .map_err(|_| ApiError::not_found("Raw data preset not found"))?;
    Ok(preset)
}

pub async fn create_chart(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CreateChartPreset>,
) -> ApiResult<ChartPreset> {
    check_name(Some(&body.name))?;
    owned_thing(&state, &session, body.thing_id).await?;
    check_sensors(&state, body.thing_id, "charts", &chart_sensor_ids(&body.charts), &[]).await?;

    let preset = ChartPreset::new(body.thing_id, body.name.trim(), body.charts);
    state.store.chart_presets.insert(&preset).await?;
    Ok(ApiResponse::created(preset).with_message("Chart preset created"))
}

pub async fn list_charts(
    State(state): State<AppState>,
    session: Session,
    ApiPath(thing_id): ApiPath<Uuid>,
) -> ApiResult<Vec<ChartPreset>> {
    owned_thing(&state, &session, thing_id).await?;
    Ok(ApiResponse::success(state.store.chart_presets.find_by_thing(thing_id).await?))
}

pub async fn update_chart(
    State(state): State<AppState>,
    session: Session,
    ApiPath(preset_id): ApiPath<Uuid>,
    ApiJson(mut changes): ApiJson<ChartPresetChanges>,
) -> ApiResult<ChartPreset> {
    check_name(changes.name.as_deref())?;
    changes.name = changes.name.map(|name| name.trim().to_string());

    let mut preset = owned_chart_preset(&state, &session, preset_id).await?;
    if let Some(charts) = &changes.charts {
        let kept = chart_sensor_ids(&preset.charts);
        check_sensors(&state, preset.thing_id, "charts", &chart_sensor_ids(charts), &kept).await?;
    }
    preset.apply(changes);
    state.store.chart_presets.update(&preset).await?;
    Ok(ApiResponse::success(preset).with_message("Chart preset updated"))
}

pub async fn delete_chart(
    State(state): State<AppState>,
    session: Session,
    ApiPath(preset_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_chart_preset(&state, &session, preset_id).await?;
    state.store.chart_presets.delete(preset_id).await?;
    Ok(ApiResponse::message_only("Chart preset deleted"))
}

pub async fn create_raw(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CreateRawDataPreset>,
) -> ApiResult<RawDataPreset> {
    check_name(Some(&body.name))?;
    owned_thing(&state, &session, body.thing_id).await?;
    check_sensors(&state, body.thing_id, "sensorIds", &body.sensor_ids, &[]).await?;

    let preset = RawDataPreset::new(body.thing_id, body.name.trim(), body.sensor_ids);
    state.store.raw_data_presets.insert(&preset).await?;
    Ok(ApiResponse::created(preset).with_message("Raw data preset created"))
}

pub async fn list_raw(
    State(state): State<AppState>,
    session: Session,
    ApiPath(thing_id): ApiPath<Uuid>,
) -> ApiResult<Vec<RawDataPreset>> {
    owned_thing(&state, &session, thing_id).await?;
    Ok(ApiResponse::success(state.store.raw_data_presets.find_by_thing(thing_id).await?))
}

pub async fn update_raw(
    State(state): State<AppState>,
    session: Session,
    ApiPath(preset_id): ApiPath<Uuid>,
    ApiJson(mut changes): ApiJson<RawDataPresetChanges>,
) -> ApiResult<RawDataPreset> {
    check_name(changes.name.as_deref())?;
    changes.name = changes.name.map(|name| name.trim().to_string());

    let mut preset = owned_raw_data_preset(&state, &session, preset_id).await?;
    if let Some(sensor_ids) = &changes.sensor_ids {
        check_sensors(&state, preset.thing_id, "sensorIds", sensor_ids, &preset.sensor_ids).await?;
    }
    preset.apply(changes);
    state.store.raw_data_presets.update(&preset).await?;
    Ok(ApiResponse::success(preset).with_message("Raw data preset updated"))
}

pub async fn delete_raw(
    State(state): State<AppState>,
    session: Session,
    ApiPath(preset_id): ApiPath<Uuid>,
) -> ApiResult<()> {
    owned_raw_data_preset(&state, &session, preset_id).await?;
    state.store.raw_data_presets.delete(preset_id).await?;
    Ok(ApiResponse::message_only("Raw data preset deleted"))
}
