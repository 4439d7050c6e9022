use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::models::Organization;
use crate::database::repository::{DbResult, OrganizationRepository};
use crate::database::DatabaseError;

const COLUMNS: &str = "id, name, created_at, updated_at";

pub struct PgOrganizationRepository {
    pool: PgPool,
}

impl PgOrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrganizationRepository for PgOrganizationRepository {
    async fn insert(&self, organization: &Organization) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO organizations (id, name, created_at, updated_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(organization.id)
        .bind(&organization.name)
        .bind(organization.created_at)
        .bind(organization.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_all(&self) -> DbResult<Vec<Organization>> {
        let sql = format!("SELECT {} FROM organizations ORDER BY created_at", COLUMNS);
        Ok(sqlx::query_as(&sql).fetch_all(&self.pool).await?)
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<Organization>> {
        let sql = format!("SELECT {} FROM organizations WHERE id = $1", COLUMNS);
        Ok(sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?)
    }

    async fn update(&self, organization: &Organization) -> DbResult<()> {
        let result = sqlx::query("UPDATE organizations SET name = $2, updated_at = $3 WHERE id = $1")
            .bind(organization.id)
            .bind(&organization.name)
            .bind(organization.updated_at)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Organization {} not found", organization.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("Organization {} not found", id)));
        }
        Ok(())
    }
}
