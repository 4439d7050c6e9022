use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Thing;
use crate::database::repository::{DbResult, ThingRepository};
use crate::database::DatabaseError;

const COLUMNS: &str = "id, organization_id, name, description, created_at, updated_at";

pub struct PgThingRepository {
    pool: PgPool,
}

impl PgThingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ThingRepository for PgThingRepository {
    async fn insert(&self, thing: &Thing) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO things (id, organization_id, name, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(thing.id)
        .bind(thing.organization_id)
        .bind(&thing.name)
        .bind(&thing.description)
        .bind(thing.created_at)
        .bind(thing.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Thing>> {
        let sql = format!("SELECT {} FROM things WHERE id = $1", COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<Thing>> {
        let sql = format!(
            "SELECT {} FROM things WHERE organization_id = $1 ORDER BY created_at",
            COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, thing: &Thing) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE things SET name = $2, description = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(thing.id)
        .bind(&thing.name)
        .bind(&thing.description)
        .bind(thing.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Thing {} not found", thing.id)));
        }
        Ok(())
    }

    /// Presets go by foreign-key cascade; operator links live in an array
    /// column and are stripped in the same transaction
    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("DELETE FROM things WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Thing {} not found", id)));
        }

        sqlx::query(
            r#"
            UPDATE operators
            SET thing_ids = array_remove(thing_ids, $1), updated_at = now()
            WHERE $1 = ANY(thing_ids)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }
}
