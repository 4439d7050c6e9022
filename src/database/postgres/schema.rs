use sqlx::PgPool;
use tracing::info;

use crate::database::manager::DatabaseError;

// Constraint names are matched by `conflict_field` when a unique violation surfaces
const STATEMENTS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS organizations (
        id UUID PRIMARY KEY,
        name TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id UUID PRIMARY KEY,
        organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        email TEXT NOT NULL,
        display_name TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role TEXT NOT NULL CHECK (role IN ('Admin', 'Member')),
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT users_email_key UNIQUE (email),
        CONSTRAINT users_organization_display_name_key UNIQUE (organization_id, display_name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS things (
        id UUID PRIMARY KEY,
        organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        description TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS things_organization_idx ON things (organization_id)",
    r#"
    CREATE TABLE IF NOT EXISTS chart_presets (
        id UUID PRIMARY KEY,
        thing_id UUID NOT NULL REFERENCES things(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        charts JSONB NOT NULL DEFAULT '[]'::jsonb,
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT chart_presets_thing_name_key UNIQUE (thing_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS raw_data_presets (
        id UUID PRIMARY KEY,
        thing_id UUID NOT NULL REFERENCES things(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        sensor_ids UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT raw_data_presets_thing_name_key UNIQUE (thing_id, name)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS operators (
        id UUID PRIMARY KEY,
        organization_id UUID NOT NULL REFERENCES organizations(id) ON DELETE CASCADE,
        name TEXT NOT NULL,
        thing_ids UUID[] NOT NULL DEFAULT '{}',
        created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
        CONSTRAINT operators_organization_name_key UNIQUE (organization_id, name)
    )
    "#,
];

/// Create tables, constraints and indexes that do not exist yet.
/// Statements run one at a time; the extended protocol rejects batches.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
    for statement in STATEMENTS {
        sqlx::query(statement).execute(pool).await?;
    }
    info!("PostgreSQL schema ready ({} statements)", STATEMENTS.len());
    Ok(())
}
