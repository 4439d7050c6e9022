// database/memory.rs - Process-local store implementing every repository
//
// Mirrors the constraints of the external stores: unique keys, foreign keys,
// cascades and the last-admin guard. One lock covers all tables so each
// operation is atomic the way a single-statement or transactional write is.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::models::{
    ChartPreset, Operator, Organization, RawDataPreset, Sensor, SensorFields, Thing, User,
};
use crate::database::repository::{
    ChartPresetRepository, DbResult, OperatorRepository, OrganizationRepository,
    RawDataPresetRepository, SensorRepository, ThingRepository, UserRepository,
};
use crate::database::DatabaseError;
use crate::types::Role;

#[derive(Debug, Default)]
struct Tables {
    organizations: HashMap<Uuid, Organization>,
    users: HashMap<Uuid, User>,
    things: HashMap<Uuid, Thing>,
    sensors: HashMap<Uuid, Sensor>,
    chart_presets: HashMap<Uuid, ChartPreset>,
    raw_data_presets: HashMap<Uuid, RawDataPreset>,
    operators: HashMap<Uuid, Operator>,
}

impl Tables {
    fn require_organization(&self, id: Uuid) -> DbResult<()> {
        if self.organizations.contains_key(&id) {
            Ok(())
        } else {
            Err(DatabaseError::NotFound("Referenced record not found".to_string()))
        }
    }

    fn require_thing(&self, id: Uuid) -> DbResult<()> {
        if self.things.contains_key(&id) {
            Ok(())
        } else {
            Err(DatabaseError::NotFound("Referenced record not found".to_string()))
        }
    }

    fn check_user_keys(&self, user: &User) -> DbResult<()> {
        let others = || self.users.values().filter(|u| u.id != user.id);

        if others().any(|u| u.email == user.email) {
            return Err(DatabaseError::Conflict("email"));
        }
        if others().any(|u| u.organization_id == user.organization_id && u.display_name == user.display_name) {
            return Err(DatabaseError::Conflict("displayName"));
        }
        Ok(())
    }

    fn has_other_admin(&self, user: &User) -> bool {
        self.users.values().any(|u| {
            u.organization_id == user.organization_id && u.id != user.id && u.role.is_admin()
        })
    }

    fn drop_things(&mut self, thing_ids: &[Uuid]) {
        for id in thing_ids {
            self.things.remove(id);
        }
        self.chart_presets.retain(|_, p| !thing_ids.contains(&p.thing_id));
        self.raw_data_presets.retain(|_, p| !thing_ids.contains(&p.thing_id));
        for operator in self.operators.values_mut() {
            operator.thing_ids.retain(|id| !thing_ids.contains(id));
        }
    }
}

fn sorted_by<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrganizationRepository for MemoryStore {
    async fn insert(&self, organization: &Organization) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.organizations.insert(organization.id, organization.clone());
        Ok(())
    }

    async fn find_all(&self) -> DbResult<Vec<Organization>> {
        let tables = self.tables.read().await;
        let rows = tables.organizations.values().cloned().collect();
        Ok(sorted_by(rows, |o: &Organization| o.created_at))
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Organization>> {
        Ok(self.tables.read().await.organizations.get(&id).cloned())
    }

    async fn update(&self, organization: &Organization) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.organizations.get_mut(&organization.id) {
            Some(existing) => {
                *existing = organization.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("Organization {} not found", organization.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if tables.organizations.remove(&id).is_none() {
            return Err(DatabaseError::NotFound(format!("Organization {} not found", id)));
        }

        tables.users.retain(|_, u| u.organization_id != id);
        tables.operators.retain(|_, o| o.organization_id != id);
        let thing_ids: Vec<Uuid> = tables
            .things
            .values()
            .filter(|t| t.organization_id == id)
            .map(|t| t.id)
            .collect();
        tables.drop_things(&thing_ids);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_organization(user.organization_id)?;
        tables.check_user_keys(user)?;
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<User>> {
        let tables = self.tables.read().await;
        let rows = tables
            .users
            .values()
            .filter(|u| u.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |u: &User| u.created_at))
    }

    async fn update_profile(&self, user: &User) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        let existing = tables
            .users
            .get(&user.id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", user.id)))?;

        let updated = User {
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            password_hash: user.password_hash.clone(),
            updated_at: user.updated_at,
            ..existing
        };
        tables.check_user_keys(&updated)?;
        tables.users.insert(updated.id, updated);
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> DbResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;

        if user.role.is_admin() && !role.is_admin() && !tables.has_other_admin(&user) {
            return Err(DatabaseError::LastAdmin(user.organization_id));
        }

        let updated = User {
            role,
            updated_at: chrono::Utc::now(),
            ..user
        };
        tables.users.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("User {} not found", id)))?;

        if user.role.is_admin() && !tables.has_other_admin(user) {
            return Err(DatabaseError::LastAdmin(user.organization_id));
        }

        tables.users.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl ThingRepository for MemoryStore {
    async fn insert(&self, thing: &Thing) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_organization(thing.organization_id)?;
        tables.things.insert(thing.id, thing.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Thing>> {
        Ok(self.tables.read().await.things.get(&id).cloned())
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<Thing>> {
        let tables = self.tables.read().await;
        let rows = tables
            .things
            .values()
            .filter(|t| t.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |t: &Thing| t.created_at))
    }

    async fn update(&self, thing: &Thing) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.things.get_mut(&thing.id) {
            Some(existing) => {
                *existing = thing.clone();
                Ok(())
            }
            None => Err(DatabaseError::NotFound(format!("Thing {} not found", thing.id))),
        }
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.things.contains_key(&id) {
            return Err(DatabaseError::NotFound(format!("Thing {} not found", id)));
        }
        tables.drop_things(&[id]);
        Ok(())
    }
}

// Sensors sit in the document store, which has no foreign keys; callers own
// the cleanup when a thing goes away.
#[async_trait]
impl SensorRepository for MemoryStore {
    async fn insert(&self, sensor: &Sensor) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.sensors.insert(sensor.id, sensor.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Sensor>> {
        Ok(self.tables.read().await.sensors.get(&id).cloned())
    }

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<Sensor>> {
        self.find_updated_since(thing_id, i64::MIN).await
    }

    async fn find_updated_since(&self, thing_id: Uuid, last_update: i64) -> DbResult<Vec<Sensor>> {
        let tables = self.tables.read().await;
        let rows = tables
            .sensors
            .values()
            .filter(|s| s.thing_id == thing_id && s.last_update > last_update)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |s: &Sensor| s.last_update))
    }

    async fn update(&self, id: Uuid, changes: &SensorFields, last_update: i64) -> DbResult<Sensor> {
        let mut tables = self.tables.write().await;
        let sensor = tables
            .sensors
            .get_mut(&id)
            .ok_or_else(|| DatabaseError::NotFound(format!("Sensor {} not found", id)))?;

        sensor.fields.merge(changes);
        sensor.last_update = last_update;
        Ok(sensor.clone())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.sensors.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("Sensor {} not found", id))),
        }
    }

    async fn delete_by_things(&self, thing_ids: &[Uuid]) -> DbResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sensors.len();
        tables.sensors.retain(|_, s| !thing_ids.contains(&s.thing_id));
        Ok((before - tables.sensors.len()) as u64)
    }
}

#[async_trait]
impl ChartPresetRepository for MemoryStore {
    async fn insert(&self, preset: &ChartPreset) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_thing(preset.thing_id)?;
        if tables
            .chart_presets
            .values()
            .any(|p| p.thing_id == preset.thing_id && p.name == preset.name)
        {
            return Err(DatabaseError::Conflict("name"));
        }
        tables.chart_presets.insert(preset.id, preset.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ChartPreset>> {
        Ok(self.tables.read().await.chart_presets.get(&id).cloned())
    }

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<ChartPreset>> {
        let tables = self.tables.read().await;
        let rows = tables
            .chart_presets
            .values()
            .filter(|p| p.thing_id == thing_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |p: &ChartPreset| p.name.clone()))
    }

    async fn update(&self, preset: &ChartPreset) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.chart_presets.contains_key(&preset.id) {
            return Err(DatabaseError::NotFound(format!("Chart preset {} not found", preset.id)));
        }
        if tables
            .chart_presets
            .values()
            .any(|p| p.id != preset.id && p.thing_id == preset.thing_id && p.name == preset.name)
        {
            return Err(DatabaseError::Conflict("name"));
        }
        tables.chart_presets.insert(preset.id, preset.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.chart_presets.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("Chart preset {} not found", id))),
        }
    }
}

#[async_trait]
impl RawDataPresetRepository for MemoryStore {
    async fn insert(&self, preset: &RawDataPreset) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_thing(preset.thing_id)?;
        if tables
            .raw_data_presets
            .values()
            .any(|p| p.thing_id == preset.thing_id && p.name == preset.name)
        {
            return Err(DatabaseError::Conflict("name"));
        }
        tables.raw_data_presets.insert(preset.id, preset.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RawDataPreset>> {
        Ok(self.tables.read().await.raw_data_presets.get(&id).cloned())
    }

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<RawDataPreset>> {
        let tables = self.tables.read().await;
        let rows = tables
            .raw_data_presets
            .values()
            .filter(|p| p.thing_id == thing_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |p: &RawDataPreset| p.name.clone()))
    }

    async fn update(&self, preset: &RawDataPreset) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.raw_data_presets.contains_key(&preset.id) {
            return Err(DatabaseError::NotFound(format!("Raw data preset {} not found", preset.id)));
        }
        if tables
            .raw_data_presets
            .values()
            .any(|p| p.id != preset.id && p.thing_id == preset.thing_id && p.name == preset.name)
        {
            return Err(DatabaseError::Conflict("name"));
        }
        tables.raw_data_presets.insert(preset.id, preset.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.raw_data_presets.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("Raw data preset {} not found", id))),
        }
    }
}

#[async_trait]
impl OperatorRepository for MemoryStore {
    async fn insert(&self, operator: &Operator) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        tables.require_organization(operator.organization_id)?;
        if tables
            .operators
            .values()
            .any(|o| o.organization_id == operator.organization_id && o.name == operator.name)
        {
            return Err(DatabaseError::Conflict("name"));
        }
        tables.operators.insert(operator.id, operator.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Operator>> {
        Ok(self.tables.read().await.operators.get(&id).cloned())
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<Operator>> {
        let tables = self.tables.read().await;
        let rows = tables
            .operators
            .values()
            .filter(|o| o.organization_id == organization_id)
            .cloned()
            .collect();
        Ok(sorted_by(rows, |o: &Operator| o.name.clone()))
    }

    async fn update(&self, operator: &Operator) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.operators.contains_key(&operator.id) {
            return Err(DatabaseError::NotFound(format!("Operator {} not found", operator.id)));
        }
        if tables.operators.values().any(|o| {
            o.id != operator.id && o.organization_id == operator.organization_id && o.name == operator.name
        }) {
            return Err(DatabaseError::Conflict("name"));
        }
        tables.operators.insert(operator.id, operator.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tables = self.tables.write().await;
        match tables.operators.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DatabaseError::NotFound(format!("Operator {} not found", id))),
        }
    }
}
