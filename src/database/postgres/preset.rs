use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use crate::database::models::{Chart, ChartPreset, RawDataPreset};
use crate::database::repository::{ChartPresetRepository, DbResult, RawDataPresetRepository};
use crate::database::DatabaseError;

const CHART_COLUMNS: &str = "id, thing_id, name, charts, created_at, updated_at";
const RAW_COLUMNS: &str = "id, thing_id, name, sensor_ids, created_at, updated_at";

// charts live in a JSONB column
#[derive(Debug, FromRow)]
struct ChartPresetRow {
    id: Uuid,
    thing_id: Uuid,
    name: String,
    charts: Json<Vec<Chart>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ChartPresetRow> for ChartPreset {
    fn from(row: ChartPresetRow) -> Self {
        ChartPreset {
            id: row.id,
            thing_id: row.thing_id,
            name: row.name,
            charts: row.charts.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub struct PgChartPresetRepository {
    pool: PgPool,
}

impl PgChartPresetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChartPresetRepository for PgChartPresetRepository {
    async fn insert(&self, preset: &ChartPreset) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO chart_presets (id, thing_id, name, charts, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(preset.id)
        .bind(preset.thing_id)
        .bind(&preset.name)
        .bind(Json(&preset.charts))
        .bind(preset.created_at)
        .bind(preset.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<ChartPreset>> {
        let sql = format!("SELECT {} FROM chart_presets WHERE id = $1", CHART_COLUMNS);
        let row: Option<ChartPresetRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        Ok(row.map(ChartPreset::from))
    }

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<ChartPreset>> {
        let sql = format!(
            "SELECT {} FROM chart_presets WHERE thing_id = $1 ORDER BY name",
            CHART_COLUMNS
        );
        let rows: Vec<ChartPresetRow> = sqlx::query_as(&sql).bind(thing_id).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(ChartPreset::from).collect())
    }

    async fn update(&self, preset: &ChartPreset) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE chart_presets SET name = $2, charts = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(preset.id)
        .bind(&preset.name)
        .bind(Json(&preset.charts))
        .bind(preset.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Chart preset {} not found", preset.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM chart_presets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Chart preset {} not found", id)));
        }
        Ok(())
    }
}

pub struct PgRawDataPresetRepository {
    pool: PgPool,
}

impl PgRawDataPresetRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RawDataPresetRepository for PgRawDataPresetRepository {
    async fn insert(&self, preset: &RawDataPreset) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO raw_data_presets (id, thing_id, name, sensor_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(preset.id)
        .bind(preset.thing_id)
        .bind(&preset.name)
        .bind(&preset.sensor_ids)
        .bind(preset.created_at)
        .bind(preset.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<RawDataPreset>> {
        let sql = format!("SELECT {} FROM raw_data_presets WHERE id = $1", RAW_COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_by_thing(&self, thing_id: Uuid) -> DbResult<Vec<RawDataPreset>> {
        let sql = format!(
            "SELECT {} FROM raw_data_presets WHERE thing_id = $1 ORDER BY name",
            RAW_COLUMNS
        );
        Ok(sqlx::query_as(&sql).bind(thing_id).fetch_all(&self.pool).await?)
    }

    async fn update(&self, preset: &RawDataPreset) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE raw_data_presets SET name = $2, sensor_ids = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(preset.id)
        .bind(&preset.name)
        .bind(&preset.sensor_ids)
        .bind(preset.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Raw data preset {} not found", preset.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM raw_data_presets WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Raw data preset {} not found", id)));
        }
        Ok(())
    }
}
