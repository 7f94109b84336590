use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use super::{StoreResult, ensure_affected};
use crate::models::{NewUser, User, UserUpdate};

/// Account persistence. Every read joins the role so callers get its name.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create(&self, user: NewUser) -> StoreResult<User>;
    async fn get_by_id(&self, id: i64) -> StoreResult<User>;
    async fn get_by_email(&self, email: &str) -> StoreResult<User>;
    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>>;
    /// Overwrites name and email.
    async fn update(&self, id: i64, user: UserUpdate) -> StoreResult<User>;
    /// Soft delete.
    async fn delete(&self, id: i64) -> StoreResult<()>;
    /// Stamps `last_login` with the current time and returns the refreshed record.
    async fn touch_last_login(&self, id: i64) -> StoreResult<User>;
}

pub type UserStoreState = Arc<dyn UserStore>;

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Select list over a `users` row source aliased `u`, joined to its role.
fn user_select(source: &str) -> String {
    format!(
        r#"
        SELECT u.id, u.name, u.email, u.password_hash, u.is_admin, u.role_id,
               r.name AS role, u.last_login, u.created_at, u.updated_at, u.deleted_at
        FROM {source} u
        JOIN roles r ON r.id = u.role_id
        "#
    )
}

#[async_trait]
impl UserStore for PgUserStore {
    /// Insert and read-back happen in one statement; the role is resolved by name.
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            WITH written AS (
                INSERT INTO users (name, email, password_hash, role_id)
                VALUES ($1, $2, $3, (SELECT id FROM roles WHERE name = $4 AND deleted_at IS NULL))
                RETURNING *
            )
            {}
            "#,
            user_select("written")
        );

        let created = sqlx::query_as::<_, User>(&sql)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(&user.role)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> StoreResult<User> {
        let sql = format!("{} WHERE u.id = $1 AND u.deleted_at IS NULL", user_select("users"));
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        let sql = format!("{} WHERE u.email = $1 AND u.deleted_at IS NULL", user_select("users"));
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }

    #[instrument(skip(self))]
    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        let sql = format!(
            "{} WHERE u.deleted_at IS NULL ORDER BY u.id LIMIT $1 OFFSET $2",
            user_select("users")
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(users)
    }

    #[instrument(skip(self, user))]
    async fn update(&self, id: i64, user: UserUpdate) -> StoreResult<User> {
        let sql = format!(
            r#"
            WITH written AS (
                UPDATE users SET name = $2, email = $3, updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
            )
            {}
            "#,
            user_select("written")
        );
        let updated = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&user.name)
            .bind(&user.email)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE users SET deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result)
    }

    #[instrument(skip(self))]
    async fn touch_last_login(&self, id: i64) -> StoreResult<User> {
        let sql = format!(
            r#"
            WITH written AS (
                UPDATE users SET last_login = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
            )
            {}
            "#,
            user_select("written")
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(user)
    }
}
