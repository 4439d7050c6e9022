pub mod manager;
pub mod memory;
pub mod models;
pub mod mongo;
pub mod postgres;
pub mod repository;

use std::sync::Arc;

pub use manager::{DatabaseError, DatabaseManager};
pub use memory::MemoryStore;
pub use repository::{
    ChartPresetRepository, DbResult, OperatorRepository, OrganizationRepository,
    RawDataPresetRepository, SensorRepository, ThingRepository, UserRepository,
};

use crate::config::{DatabaseConfig, StoreBackend};

/// Every repository the handlers talk to, behind trait objects so the
/// backing store is picked once at startup
#[derive(Clone)]
pub struct Store {
    pub organizations: Arc<dyn OrganizationRepository>,
    pub users: Arc<dyn UserRepository>,
    pub things: Arc<dyn ThingRepository>,
    pub sensors: Arc<dyn SensorRepository>,
    pub chart_presets: Arc<dyn ChartPresetRepository>,
    pub raw_data_presets: Arc<dyn RawDataPresetRepository>,
    pub operators: Arc<dyn OperatorRepository>,
    manager: Option<DatabaseManager>,
}

impl Store {
    /// Connect to the configured backend and make sure its schema exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        match config.backend {
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory store; data is lost on restart");
                Ok(Self::in_memory())
            }
            StoreBackend::External => {
                let manager = DatabaseManager::connect(config).await?;
                postgres::ensure_schema(manager.pg()).await?;
                let sensors = mongo::MongoSensorRepository::new(manager.mongo());
                sensors.ensure_indexes().await?;
                Ok(Self::external(manager, sensors))
            }
        }
    }

    fn external(manager: DatabaseManager, sensors: mongo::MongoSensorRepository) -> Self {
        let pool = manager.pg().clone();
        Self {
            organizations: Arc::new(postgres::PgOrganizationRepository::new(pool.clone())),
            users: Arc::new(postgres::PgUserRepository::new(pool.clone())),
            things: Arc::new(postgres::PgThingRepository::new(pool.clone())),
            sensors: Arc::new(sensors),
            chart_presets: Arc::new(postgres::PgChartPresetRepository::new(pool.clone())),
            raw_data_presets: Arc::new(postgres::PgRawDataPresetRepository::new(pool.clone())),
            operators: Arc::new(postgres::PgOperatorRepository::new(pool)),
            manager: Some(manager),
        }
    }

    pub fn in_memory() -> Self {
        let memory = Arc::new(MemoryStore::new());
        Self {
            organizations: memory.clone(),
            users: memory.clone(),
            things: memory.clone(),
            sensors: memory.clone(),
            chart_presets: memory.clone(),
            raw_data_presets: memory.clone(),
            operators: memory,
            manager: None,
        }
    }

    /// Name of the backend, for the health report
    pub fn backend(&self) -> &'static str {
        if self.manager.is_some() {
            "postgres+mongodb"
        } else {
            "memory"
        }
    }

    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        match &self.manager {
            Some(manager) => manager.health_check().await,
            None => Ok(()),
        }
    }

    pub async fn close(&self) {
        if let Some(manager) = &self.manager {
            manager.close().await;
        }
    }
}
