use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One chart within a chart preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chart {
    pub name: String,
    pub chart_type: String,
    #[serde(default)]
    pub sensor_ids: Vec<Uuid>,
}

/// Saved dashboard layout for a thing; names are unique per thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPreset {
    pub id: Uuid,
    pub thing_id: Uuid,
    pub name: String,
    pub charts: Vec<Chart>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ChartPreset {
    pub fn new(thing_id: Uuid, name: impl Into<String>, charts: Vec<Chart>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            thing_id,
            name: name.into(),
            charts,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: ChartPresetChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(charts) = changes.charts {
            self.charts = charts;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPresetChanges {
    pub name: Option<String>,
    pub charts: Option<Vec<Chart>>,
}

/// Saved selection of sensors for raw data export; names are unique per thing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct RawDataPreset {
    pub id: Uuid,
    pub thing_id: Uuid,
    pub name: String,
    pub sensor_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RawDataPreset {
    pub fn new(thing_id: Uuid, name: impl Into<String>, sensor_ids: Vec<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            thing_id,
            name: name.into(),
            sensor_ids,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: RawDataPresetChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(sensor_ids) = changes.sensor_ids {
            self.sensor_ids = sensor_ids;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawDataPresetChanges {
    pub name: Option<String>,
    pub sensor_ids: Option<Vec<Uuid>>,
}
