use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A person or crew operating things; names are unique per organization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub thing_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Operator {
    pub fn new(organization_id: Uuid, name: impl Into<String>, thing_ids: Vec<Uuid>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            organization_id,
            name: name.into(),
            thing_ids,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn apply(&mut self, changes: OperatorChanges) {
        if let Some(name) = changes.name {
            self.name = name;
        }
        if let Some(thing_ids) = changes.thing_ids {
            self.thing_ids = thing_ids;
        }
        self.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorChanges {
    pub name: Option<String>,
    pub thing_ids: Option<Vec<Uuid>>,
}
