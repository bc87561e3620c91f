//! Postgres implementation of the identity store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use souk_core::Role;
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::models::User;
use crate::store::{IdentityStore, StoreError, StoreResult};

/// Row shape for `identity_records`.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    provider_id: String,
    username: String,
    email: String,
    first_name: String,
    last_name: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl UserRow {
    fn into_user(self) -> User {
        // An unknown role value in the mirror degrades to the default, the
        // same floor the resolver uses.
        let role = self.role.parse().unwrap_or_else(|_| {
            warn!(id = %self.id, role = %self.role, "Unknown role in mirror, defaulting");
            Role::Customer
        });
        User {
            id: self.id,
            provider_id: self.provider_id,
            username: self.username,
            email: self.email,
            first_name: self.first_name,
            last_name: self.last_name,
            role,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = "id, provider_id, username, email, first_name, last_name, \
                              role, created_at, updated_at";

/// Postgres-backed identity store.
#[derive(Debug, Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    /// Create a new store over a connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn map_error(e: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                let field = match db_err.constraint() {
                    Some(c) if c.contains("username") => "username",
                    Some(c) if c.contains("email") => "email",
                    Some(c) if c.contains("provider") => "provider_id",
                    _ => "unknown",
                };
                return StoreError::Conflict {
                    field: field.to_string(),
                };
            }
        }
        StoreError::Database(e.to_string())
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn find_by_provider_id(&self, provider_id: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM identity_records WHERE provider_id = $1"
        ))
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_error)?;
        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM identity_records WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_error)?;
        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM identity_records WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(Self::map_error)?;
        Ok(row.map(UserRow::into_user))
    }

    async fn find_all(&self) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM identity_records ORDER BY created_at"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_error)?;
        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<User>> {
        let rows: Vec<UserRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM identity_records WHERE role = $1 ORDER BY created_at"
        ))
        .bind(role.provider_name())
        .fetch_all(&self.pool)
        .await
        .map_err(Self::map_error)?;
        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn save(&self, user: &User) -> StoreResult<()> {
        sqlx::query(
            r"
            INSERT INTO identity_records
                (id, provider_id, username, email, first_name, last_name, role,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW())
            ON CONFLICT (id) DO UPDATE SET
                username = EXCLUDED.username,
                email = EXCLUDED.email,
                first_name = EXCLUDED.first_name,
                last_name = EXCLUDED.last_name,
                role = EXCLUDED.role,
                updated_at = NOW()
            ",
        )
        .bind(user.id)
        .bind(&user.provider_id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(user.role.provider_name())
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(Self::map_error)?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM identity_records WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Self::map_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM identity_records WHERE username = $1)")
                .bind(username)
                .fetch_one(&self.pool)
                .await
                .map_err(Self::map_error)?;
        Ok(exists.0)
    }

    async fn exists_by_email(&self, email: &str) -> StoreResult<bool> {
        let exists: (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM identity_records WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await
                .map_err(Self::map_error)?;
        Ok(exists.0)
    }
}
