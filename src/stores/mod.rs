//! Per-entity persistence.
//!
//! Each store is a trait with a Postgres implementation, shared through the
//! application state as `Arc<dyn ...>` so handlers never see the concrete backend.
//! Default reads skip soft-deleted rows (`deleted_at IS NULL`).

use thiserror::Error;

pub mod article;
pub mod author;
pub mod image;
pub mod user;

pub use article::{ArticleStore, ArticleStoreState, PgArticleStore};
pub use author::{AuthorStore, AuthorStoreState, PgAuthorStore};
pub use image::{ImageStore, ImageStoreState, PgImageStore};
pub use user::{PgUserStore, UserStore, UserStoreState};

/// StoreError
///
/// Failure at the persistence boundary. "Not found" and unique violations are
/// classified here, so callers never inspect driver errors.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    /// Carries the name of the violated constraint or index.
    #[error("unique constraint violated: {0}")]
    Conflict(String),
    #[error(transparent)]
    Database(sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return StoreError::NotFound;
        }
        if let Some(db_err) = err.as_database_error() {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                return StoreError::Conflict(constraint);
            }
        }
        StoreError::Database(err)
    }
}

/// Maps a soft-delete `UPDATE` result: zero affected rows means the id never existed.
pub(crate) fn ensure_affected(result: sqlx::postgres::PgQueryResult) -> StoreResult<()> {
    if result.rows_affected() == 0 {
        Err(StoreError::NotFound)
    } else {
        Ok(())
    }
}
