use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A measurement source attached to a thing; lives in the document store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sensor {
    pub id: Uuid,
    pub thing_id: Uuid,
    /// Epoch milliseconds of the last write, used for incremental polling
    pub last_update: i64,
    #[serde(flatten)]
    pub fields: SensorFields,
}

impl Sensor {
    pub fn new(thing_id: Uuid, fields: SensorFields, last_update: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            thing_id,
            last_update,
            fields,
        }
    }
}

/// Descriptive and threshold fields of a sensor. Every field is optional so
/// the same shape serves as a partial update; absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SensorFields {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub small_id: Option<i32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub sensor_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub can_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disabled: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_calibration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_calibration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conversion_multiplier: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_warning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_warning: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper_danger: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lower_danger: Option<f64>,
}

impl SensorFields {
    /// Overwrite every field that is set in `changes`
    pub fn merge(&mut self, changes: &SensorFields) {
        fn take<T: Clone>(target: &mut Option<T>, source: &Option<T>) {
            if source.is_some() {
                target.clone_from(source);
            }
        }

        take(&mut self.small_id, &changes.small_id);
        take(&mut self.sensor_type, &changes.sensor_type);
        take(&mut self.category, &changes.category);
        take(&mut self.name, &changes.name);
        take(&mut self.frequency, &changes.frequency);
        take(&mut self.unit, &changes.unit);
        take(&mut self.can_id, &changes.can_id);
        take(&mut self.disabled, &changes.disabled);
        take(&mut self.upper_calibration, &changes.upper_calibration);
        take(&mut self.lower_calibration, &changes.lower_calibration);
        take(&mut self.conversion_multiplier, &changes.conversion_multiplier);
        take(&mut self.upper_warning, &changes.upper_warning);
        take(&mut self.lower_warning, &changes.lower_warning);
        take(&mut self.upper_danger, &changes.upper_danger);
        take(&mut self.lower_danger, &changes.lower_danger);
    }
}
