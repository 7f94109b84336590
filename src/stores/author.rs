use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use super::{StoreResult, ensure_affected};
use crate::{
    models::{Author, AuthorCreate, AuthorUpdate},
    slug::slugify,
};

#[async_trait]
pub trait AuthorStore: Send + Sync {
    /// Creates a profile owned by `user_id`; the slug is derived from the name.
    async fn create(&self, author: AuthorCreate, user_id: i64) -> StoreResult<Author>;
    async fn get_by_id(&self, id: i64) -> StoreResult<Author>;
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Author>;
    /// The user's profile. Nothing prevents several; the oldest live one wins.
    async fn get_by_user_id(&self, user_id: i64) -> StoreResult<Author>;
    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<Author>>;
    /// Overwrites name and bio. The slug is kept.
    async fn update(&self, id: i64, author: AuthorUpdate) -> StoreResult<Author>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

pub type AuthorStoreState = Arc<dyn AuthorStore>;

pub struct PgAuthorStore {
    pool: PgPool,
}

impl PgAuthorStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const AUTHOR_COLUMNS: &str = "id, name, slug, bio, user_id, created_at, updated_at, deleted_at";

#[async_trait]
impl AuthorStore for PgAuthorStore {
    #[instrument(skip(self, author))]
    async fn create(&self, author: AuthorCreate, user_id: i64) -> StoreResult<Author> {
        let sql = format!(
            "INSERT INTO authors (name, slug, bio, user_id) VALUES ($1, $2, $3, $4) RETURNING {AUTHOR_COLUMNS}"
        );
        let created = sqlx::query_as::<_, Author>(&sql)
            .bind(&author.name)
            .bind(slugify(&author.name))
            .bind(&author.bio)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> StoreResult<Author> {
        let sql = format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE id = $1 AND deleted_at IS NULL");
        let author = sqlx::query_as::<_, Author>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(author)
    }

    #[instrument(skip(self))]
    async fn get_by_slug(&self, slug: &str) -> StoreResult<Author> {
        let sql =
            format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE slug = $1 AND deleted_at IS NULL");
        let author = sqlx::query_as::<_, Author>(&sql)
            .bind(slug)
            .fetch_one(&self.pool)
            .await?;
        Ok(author)
    }

    #[instrument(skip(self))]
    async fn get_by_user_id(&self, user_id: i64) -> StoreResult<Author> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE user_id = $1 AND deleted_at IS NULL ORDER BY id LIMIT 1"
        );
        let author = sqlx::query_as::<_, Author>(&sql)
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(author)
    }

    #[instrument(skip(self))]
    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<Author>> {
        let sql = format!(
            "SELECT {AUTHOR_COLUMNS} FROM authors WHERE deleted_at IS NULL ORDER BY id LIMIT $1 OFFSET $2"
        );
        let authors = sqlx::query_as::<_, Author>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(authors)
    }

    #[instrument(skip(self, author))]
    async fn update(&self, id: i64, author: AuthorUpdate) -> StoreResult<Author> {
        let sql = format!(
            r#"
            UPDATE authors SET name = $2, bio = $3, updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            RETURNING {AUTHOR_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Author>(&sql)
            .bind(id)
            .bind(&author.name)
            .bind(&author.bio)
            .fetch_one(&self.pool)
            .await?;
        Ok(updated)
    }

    /// Soft delete. A second call re-stamps `deleted_at`.
    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE authors SET deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result)
    }
}
