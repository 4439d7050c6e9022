use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;

use crate::database::models::User;
use crate::database::repository::{DbResult, UserRepository};
use crate::database::DatabaseError;
use crate::types::Role;

const COLUMNS: &str =
    "id, organization_id, email, display_name, password_hash, role, created_at, updated_at";

/// Row shape of `users`; role is stored as text and checked on the way out
#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    organization_id: Uuid,
    email: String,
    display_name: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = DatabaseError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = row.role.parse::<Role>().map_err(DatabaseError::QueryError)?;
        Ok(User {
            id: row.id,
            email: row.email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            role,
            organization_id: row.organization_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Lock the organization row owning `user_id` and load the user under that
/// lock. Every role change and user delete goes through here, so the admin
/// count read afterwards cannot be raced by another writer.
async fn lock_owner(conn: &mut PgConnection, user_id: Uuid) -> DbResult<User> {
    let locked: Option<(Uuid,)> = sqlx::query_as(
        r#"
        SELECT o.id FROM organizations o
        JOIN users u ON u.organization_id = o.id
        WHERE u.id = $1
        FOR UPDATE OF o
        "#,
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?;

    if locked.is_none() {
        return Err(DatabaseError::NotFound(format!("User {} not found", user_id)));
    }

    let sql = format!("SELECT {} FROM users WHERE id = $1", COLUMNS);
    let row: UserRow = sqlx::query_as(&sql).bind(user_id).fetch_one(&mut *conn).await?;
    row.try_into()
}

async fn other_admins(conn: &mut PgConnection, user: &User) -> DbResult<i64> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM users WHERE organization_id = $1 AND role = 'Admin' AND id <> $2",
    )
    .bind(user.organization_id)
    .bind(user.id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(count)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (id, organization_id, email, display_name, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(user.organization_id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_email(&self, email: &str) -> DbResult<Option<User>> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&sql).bind(email).fetch_optional(&self.pool).await?;
        row.map(User::try_from).transpose()
    }

    async fn find_by_organization(&self, organization_id: Uuid) -> DbResult<Vec<User>> {
        let sql = format!(
            "SELECT {} FROM users WHERE organization_id = $1 ORDER BY created_at",
            COLUMNS
        );
        let rows: Vec<UserRow> = sqlx::query_as(&sql)
            .bind(organization_id)
            .fetch_all(&self.pool)
            .await?;
        rows.into_iter().map(User::try_from).collect()
    }

    async fn update_profile(&self, user: &User) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET email = $2, display_name = $3, password_hash = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&user.password_hash)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DatabaseError::NotFound(format!("User {} not found", user.id)));
        }
        Ok(())
    }

    async fn update_role(&self, id: Uuid, role: Role) -> DbResult<User> {
        let mut tx = self.pool.begin().await?;
        let user = lock_owner(&mut tx, id).await?;

        if user.role.is_admin() && !role.is_admin() && other_admins(&mut tx, &user).await? == 0 {
            return Err(DatabaseError::LastAdmin(user.organization_id));
        }

        let sql = format!(
            "UPDATE users SET role = $2, updated_at = now() WHERE id = $1 RETURNING {}",
            COLUMNS
        );
        let row: UserRow = sqlx::query_as(&sql)
            .bind(id)
            .bind(role.as_str())
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        row.try_into()
    }

    async fn delete(&self, id: Uuid) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;
        let user = lock_owner(&mut tx, id).await?;

        if user.role.is_admin() && other_admins(&mut tx, &user).await? == 0 {
            return Err(DatabaseError::LastAdmin(user.organization_id));
        }

        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(())
    }
}
