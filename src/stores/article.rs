use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use super::{StoreResult, ensure_affected};
use crate::{
    models::{Article, ArticleCreate, ArticleRow, ArticleUpdate},
    slug::slugify,
};

/// Article persistence. Reads embed the owning author.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Creates an article for `author_id`; the slug is derived from the title.
    async fn create(&self, article: ArticleCreate, author_id: i64) -> StoreResult<Article>;
    async fn get_by_id(&self, id: i64) -> StoreResult<Article>;
    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<Article>>;
    /// Overwrites title, short description, content, status and publication time.
    async fn update(&self, id: i64, article: ArticleUpdate) -> StoreResult<Article>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
}

pub type ArticleStoreState = Arc<dyn ArticleStore>;

pub struct PgArticleStore {
    pool: PgPool,
}

impl PgArticleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub const DEFAULT_STATUS: &str = "draft";

/// Select list over an `articles` row source aliased `a`, joined to its author.
/// Author columns carry an `author_` prefix so `ArticleRow` maps them by name.
fn article_select(source: &str) -> String {
    format!(
        r#"
        SELECT a.id, a.title, a.slug, a.short_description, a.content, a.status,
               a.author_id, a.published_at, a.created_at, a.updated_at, a.deleted_at,
               au.name AS author_name, au.slug AS author_slug, au.bio AS author_bio,
               au.user_id AS author_user_id, au.created_at AS author_created_at,
               au.updated_at AS author_updated_at, au.deleted_at AS author_deleted_at
        FROM {source} a
        JOIN authors au ON au.id = a.author_id
        "#
    )
}

#[async_trait]
impl ArticleStore for PgArticleStore {
    #[instrument(skip(self, article))]
    async fn create(&self, article: ArticleCreate, author_id: i64) -> StoreResult<Article> {
        let status = if article.status.trim().is_empty() {
            DEFAULT_STATUS.to_string()
        } else {
            article.status
        };

        let sql = format!(
            r#"
            WITH written AS (
                INSERT INTO articles (title, slug, short_description, content, status, author_id)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *
            )
            {}
            "#,
            article_select("written")
        );

        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(&article.title)
            .bind(slugify(&article.title))
            .bind(&article.short_description)
            .bind(&article.content)
            .bind(&status)
            .bind(author_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> StoreResult<Article> {
        let sql = format!(
            "{} WHERE a.id = $1 AND a.deleted_at IS NULL",
            article_select("articles")
        );
        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    #[instrument(skip(self))]
    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<Article>> {
        let sql = format!(
            "{} WHERE a.deleted_at IS NULL ORDER BY a.id LIMIT $1 OFFSET $2",
            article_select("articles")
        );
        let rows = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Article::from).collect())
    }

    #[instrument(skip(self, article))]
    async fn update(&self, id: i64, article: ArticleUpdate) -> StoreResult<Article> {
        let sql = format!(
            r#"
            WITH written AS (
                UPDATE articles
                SET title = $2, short_description = $3, content = $4, status = $5,
                    published_at = $6, updated_at = NOW()
                WHERE id = $1 AND deleted_at IS NULL
                RETURNING *
            )
            {}
            "#,
            article_select("written")
        );

        let row = sqlx::query_as::<_, ArticleRow>(&sql)
            .bind(id)
            .bind(&article.title)
            .bind(&article.short_description)
            .bind(&article.content)
            .bind(&article.status)
            .bind(article.published_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    /// Soft delete. The row stays with `deleted_at` set.
    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE articles SET deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result)
    }
}
