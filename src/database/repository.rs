use async_trait::async_trait;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::{
    ChartPreset, Operator, Organization, RawDataPreset, Sensor, SensorFields, Thing, User,
};
use crate::types::Role;

pub type DbResult<T> = Result<T, DatabaseError>;

#[async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn insert(&self, organization: &Organization) -> DbResult<()>;

    async fn find_all(&self) -> DbResult<Vec<Organization>>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Organization>>;

    async fn update(&self, organization: &Organization) -> DbResult<()>;

    /// Delete an organization; users, things, presets and operators go with it
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a user. Email and per-organization display name collisions
    /// surface as `DatabaseError::Conflict` regardless of prior checks.
    async fn insert(&self, user: &User) -> DbResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<User>>;

    /// Look up the owner of an email across all organizations
    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>>;

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<User>>;

    /// Persist email, display name and password hash of an existing user
    async fn update_profile(&self, user: &User) -> DbResult<()>;

    /// Change a user's role. Refuses with `DatabaseError::LastAdmin` when the
    /// change would leave the organization without an admin.
    async fn update_role(&self, id: Uuid, role: Role) -> DbResult<User>;

    /// Delete a user. Refuses with `DatabaseError::LastAdmin` when the user is
    /// the organization's only admin.
    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait ThingRepository: Send + Sync {
    async fn insert(&self, thing: &Thing) -> DbResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Thing>>;

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<Thing>>;

    async fn update(&self, thing: &Thing) -> DbResult<()>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait SensorRepository: Send + Sync {
    async fn insert(&self, sensor: &Sensor) -> DbResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Sensor>>;

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<Sensor>>;

    /// Sensors of a thing written strictly after `last_update` (epoch ms)
    async fn find_updated_since(&self, thing_id: Uuid, last_update: i64) -> DbResult<Vec<Sensor>>;

    /// Apply the set fields of `changes` and stamp `last_update`
    async fn update(&self, id: Uuid, changes: &SensorFields, last_update: i64) -> DbResult<Sensor>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;

    /// Remove every sensor of the given things; returns how many went
    async fn delete_by_things(&self, thing_ids: &[Uuid]) -> DbResult<u64>;
}

#[async_trait]
pub trait ChartPresetRepository: Send + Sync {
    async fn insert(&self, preset: &ChartPreset) -> DbResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ChartPreset>>;

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<ChartPreset>>;

    async fn update(&self, preset: &ChartPreset) -> DbResult<()>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait RawDataPresetRepository: Send + Sync {
    async fn insert(&self, preset: &RawDataPreset) -> DbResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RawDataPreset>>;

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<RawDataPreset>>;

    async fn update(&self, preset: &RawDataPreset) -> DbResult<()>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;
}

#[async_trait]
pub trait OperatorRepository: Send + Sync {
    async fn insert(&self, operator: &Operator) -> DbResult<()>;

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Operator>>;

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<Operator>>;

    async fn update(&self, operator: &Operator) -> DbResult<()>;

    async fn delete(&self, id: Uuid) -> DbResult<()>;
}
