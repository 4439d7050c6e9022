// database/mongo.rs - Sensor repository over MongoDB
//
// Sensors are the only document-store entity. Ids are stored as strings
// so the collection stays readable from the mongo shell.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::{
    bson::{doc, to_document, Document},
    options::{FindOneAndUpdateOptions, FindOptions, IndexOptions, ReturnDocument},
    Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::database::models::{Sensor, SensorFields};
use crate::database::repository::{DbResult, SensorRepository};
use crate::database::DatabaseError;

const COLLECTION: &str = "sensors";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SensorDocument {
    #[serde(rename = "_id")]
    id: String,
    thing_id: String,
    last_update: i64,
    #[serde(flatten)]
    fields: SensorFields,
}

impl From<&Sensor> for SensorDocument {
    fn from(sensor: &Sensor) -> Self {
        Self {
            id: sensor.id.to_string(),
            thing_id: sensor.thing_id.to_string(),
            last_update: sensor.last_update,
            fields: sensor.fields.clone(),
        }
    }
}

impl TryFrom<SensorDocument> for Sensor {
    type Error = DatabaseError;

    fn try_from(document: SensorDocument) -> Result<Self, Self::Error> {
        let parse = |raw: &str| {
            Uuid::parse_str(raw)
                .map_err(|_| DatabaseError::QueryError(format!("Malformed id in sensors: {}", raw)))
        };
        Ok(Sensor {
            id: parse(&document.id)?,
            thing_id: parse(&document.thing_id)?,
            last_update: document.last_update,
            fields: document.fields,
        })
    }
}

pub struct MongoSensorRepository {
    collection: Collection<SensorDocument>,
}

impl MongoSensorRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(COLLECTION),
        }
    }

    /// Index the polling paths: all sensors of a thing, and those of a thing
    /// changed after a timestamp
    pub async fn ensure_indexes(&self) -> Result<(), DatabaseError> {
        let by_thing = IndexModel::builder()
            .keys(doc! { "thingId": 1 })
            .options(IndexOptions::builder().name("thing_lookup".to_string()).build())
            .build();
        self.collection.create_index(by_thing, None).await?;

        let by_update = IndexModel::builder()
            .keys(doc! { "thingId": 1, "lastUpdate": 1 })
            .options(IndexOptions::builder().name("thing_last_update".to_string()).build())
            .build();
        self.collection.create_index(by_update, None).await?;

        info!("Created indexes on sensors.(thingId) and sensors.(thingId, lastUpdate)");
        Ok(())
    }

    async fn find_many(&self, filter: Document) -> DbResult<Vec<Sensor>> {
        let options = FindOptions::builder().sort(doc! { "lastUpdate": 1 }).build();
        let documents: Vec<SensorDocument> = self
            .collection
            .find(filter, options)
            .await?
            .try_collect()
            .await?;
        documents.into_iter().map(Sensor::try_from).collect()
    }
}

#[async_trait]
impl SensorRepository for MongoSensorRepository {
    async fn insert(&self, sensor: &Sensor) -> DbResult<()> {
        self.collection
            .insert_one(SensorDocument::from(sensor), None)
            .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Sensor>> {
        self.collection
            .find_one(doc! { "_id": id.to_string() }, None)
            .await?
            .map(Sensor::try_from)
            .transpose()
    }

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<Sensor>> {
        self.find_many(doc! { "thingId": thing_id.to_string() }).await
    }

    async fn find_updated_since(&self, thing_id: Uuid, last_update: i64) -> DbResult<Vec<Sensor>> {
        self.find_many(doc! {
            "thingId": thing_id.to_string(),
            "lastUpdate": { "$gt": last_update },
        })
        .await
    }

    async fn update(&self, id: Uuid, changes: &SensorFields, last_update: i64) -> DbResult<Sensor> {
        let mut set = to_document(changes)?;
        set.insert("lastUpdate", last_update);

        let options = FindOneAndUpdateOptions::builder()
            .return_document(ReturnDocument::After)
            .build();
        let updated = self
            .collection
            .find_one_and_update(doc! { "_id": id.to_string() }, doc! { "$set": set }, options)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Sensor {} not found", id)))?;

        updated.try_into()
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = self
            .collection
            .delete_one(doc! { "_id": id.to_string() }, None)
            .await?;

        if result.deleted_count == 0 {
            return Err(DatabaseError::NotFound(format!("Sensor {} not found", id)));
        }
        Ok(())
    }

    async fn delete_by_things(&self, thing_ids: &[Uuid]) -> DbResult<u64> {
        if thing_ids.is_empty() {
            return Ok(0);
        }
        let ids: Vec<String> = thing_ids.iter().map(Uuid::to_string).collect();
        let result = self
            .collection
            .delete_many(doc! { "thingId": { "$in": ids } }, None)
            .await?;
        Ok(result.deleted_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_uses_string_ids_and_flat_fields() {
        let sensor = Sensor::new(
            Uuid::new_v4(),
            SensorFields {
                name: Some("oil pressure".into()),
                can_id: Some(0x18F),
                ..Default::default()
            },
            7,
        );

        let document = to_document(&SensorDocument::from(&sensor)).unwrap();

        assert_eq!(document.get_str("_id").unwrap(), sensor.id.to_string());
        assert_eq!(document.get_str("thingId").unwrap(), sensor.thing_id.to_string());
        assert_eq!(document.get_str("name").unwrap(), "oil pressure");
        assert_eq!(document.get_i64("lastUpdate").unwrap(), 7);
        assert!(!document.contains_key("unit"));
    }

    #[test]
    fn rejects_malformed_ids() {
        let document = SensorDocument {
            id: "not-a-uuid".to_string(),
            thing_id: Uuid::new_v4().to_string(),
            last_update: 0,
            fields: SensorFields::default(),
        };

        assert!(matches!(Sensor::try_from(document), Err(DatabaseError::QueryError(_))));
    }
}
