use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Operator;
use crate::database::repository::{DbResult, OperatorRepository};
use crate::database::DatabaseError;

const COLUMNS: &str = "id, organization_id, name, thing_ids, created_at, updated_at";

pub struct PgOperatorRepository {
    pool: PgPool,
}

impl PgOperatorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperatorRepository for PgOperatorRepository {
    async fn insert(&self, operator: &Operator) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO operators (id, organization_id, name, thing_ids, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(operator.id)
        .bind(operator.organization_id)
        .bind(&operator.name)
        .bind(&operator.thing_ids)
        .bind(operator.created_at)
        .bind(operator.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Operator>> {
        let sql = format!("SELECT {} FROM operators WHERE id = $1", COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<Operator>> {
        let sql = format!(
            "SELECT {} FROM operators WHERE organization_id = $1 ORDER BY name",
            COLUMNS
        );
        Ok(sqlx::query_as(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn update(&self, operator: &Operator) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE operators SET name = $2, thing_ids = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(operator.id)
        .bind(&operator.name)
        .bind(&operator.thing_ids)
        .bind(operator.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Operator {} not found", operator.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM operators WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Operator {} not found", id)));
        }
        Ok(())
    }
}
