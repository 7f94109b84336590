use async_trait::async_trait;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::instrument;

use super::{StoreResult, ensure_affected};
use crate::models::{Image, ImageCreate};

#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn create(&self, image: ImageCreate) -> StoreResult<Image>;
    async fn get_by_id(&self, id: i64) -> StoreResult<Image>;
    async fn delete(&self, id: i64) -> StoreResult<()>;
    /// Links an image to an article. Linking twice is a no-op.
    async fn attach_to_article(&self, article_id: i64, image_id: i64) -> StoreResult<()>;
    /// Live images linked to an article, oldest first.
    async fn get_for_article(&self, article_id: i64) -> StoreResult<Vec<Image>>;
}

pub type ImageStoreState = Arc<dyn ImageStore>;

pub struct PgImageStore {
    pool: PgPool,
}

impl PgImageStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ImageStore for PgImageStore {
    #[instrument(skip(self))]
    async fn create(&self, image: ImageCreate) -> StoreResult<Image> {
        let created = sqlx::query_as::<_, Image>(
            "INSERT INTO images (url) VALUES ($1) RETURNING id, url, created_at, deleted_at",
        )
        .bind(&image.url)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: i64) -> StoreResult<Image> {
        let image = sqlx::query_as::<_, Image>(
            "SELECT id, url, created_at, deleted_at FROM images WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(image)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: i64) -> StoreResult<()> {
        let result = sqlx::query("UPDATE images SET deleted_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        ensure_affected(result)
    }

    #[instrument(skip(self))]
    async fn attach_to_article(&self, article_id: i64, image_id: i64) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO article_images (article_id, image_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(article_id)
        .bind(image_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn get_for_article(&self, article_id: i64) -> StoreResult<Vec<Image>> {
        let images = sqlx::query_as::<_, Image>(
            r#"
            SELECT i.id, i.url, i.created_at, i.deleted_at
            FROM images i
            JOIN article_images ai ON ai.image_id = i.id
            WHERE ai.article_id = $1 AND i.deleted_at IS NULL
            ORDER BY i.id
            "#,
        )
        .bind(article_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(images)
    }
}
