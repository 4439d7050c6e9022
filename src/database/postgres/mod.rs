// database/postgres/mod.rs - PostgreSQL-backed repositories for relational entities

pub mod operator;
pub mod organization;
pub mod preset;
pub mod schema;
pub mod thing;
pub mod user;

pub use operator::PgOperatorRepository;
pub use organization::PgOrganizationRepository;
pub use preset::{PgChartPresetRepository, PgRawDataPresetRepository};
pub use schema::ensure_schema;
pub use thing::PgThingRepository;
pub use user::PgUserRepository;
