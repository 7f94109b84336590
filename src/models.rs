use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Records (Mapped to Database) ---

/// User
///
/// A registered account from the `users` table, joined with its role name.
/// Not `Serialize`: it carries the password hash, so every response
/// goes through `UserResponse` instead.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub is_admin: bool,
    pub role_id: i64,
    // Loaded via the roles join.
    pub role: String,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Author
///
/// A publishing profile from the `authors` table. Owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Author {
    pub id: i64,
    pub name: String,
    /// Derived from `name` at creation; stable afterwards.
    pub slug: String,
    pub bio: String,
    pub user_id: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Article
///
/// An article with its owning author embedded. Built from `ArticleRow`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Article {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub content: String,
    /// Free-form, e.g. "draft" or "published".
    pub status: String,
    pub author_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Author>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// ArticleRow
///
/// Flat result of the `articles JOIN authors` query. Columns are mapped by their
/// alias, so the select list order does not matter.
#[derive(Debug, Clone, FromRow)]
pub struct ArticleRow {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub short_description: String,
    pub content: String,
    pub status: String,
    pub author_id: i64,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub author_name: String,
    pub author_slug: String,
    pub author_bio: String,
    pub author_user_id: i64,
    pub author_created_at: DateTime<Utc>,
    pub author_updated_at: DateTime<Utc>,
    pub author_deleted_at: Option<DateTime<Utc>>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        let author = Author {
            id: row.author_id,
            name: row.author_name,
            slug: row.author_slug,
            bio: row.author_bio,
            user_id: row.author_user_id,
            created_at: row.author_created_at,
            updated_at: row.author_updated_at,
            deleted_at: row.author_deleted_at,
        };

        Article {
            id: row.id,
            title: row.title,
            slug: row.slug,
            short_description: row.short_description,
            content: row.content,
            status: row.status,
            author_id: row.author_id,
            author: Some(author),
            published_at: row.published_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

/// Image
///
/// A stored image URL from the `images` table. Linked to articles through `article_images`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Image {
    pub id: i64,
    pub url: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    pub deleted_at: Option<DateTime<Utc>>,
}

// --- Request Payloads (Input Schemas) ---
//
// Missing fields decode to their zero value. Update payloads overwrite every field
// they declare, so callers must send the full set.

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// Store-level input for a new account. The password is already hashed.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct UserUpdate {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct AuthorCreate {
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct AuthorUpdate {
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct ArticleCreate {
    pub title: String,
    pub short_description: String,
    pub content: String,
    /// Defaults to "draft" when blank.
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct ArticleUpdate {
    pub title: String,
    pub short_description: String,
    pub content: String,
    pub status: String,
    #[ts(type = "string | null")]
    pub published_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(default)]
pub struct ImageCreate {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AttachImageRequest {
    pub image_id: i64,
}

// --- Response Shapes (Output Schemas) ---

/// UserResponse
///
/// Public view of a `User`. The password hash is dropped here, at the response boundary.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct UserResponse {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
    pub role: String,
    #[ts(type = "string | null")]
    pub last_login: Option<DateTime<Utc>>,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
            role: user.role,
            last_login: user.last_login,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// AuthResponse
///
/// Returned by login and register: the bearer token plus the signed-in user.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// ErrorResponse
///
/// Shape of every failed request: a single human-readable `error` string.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ErrorResponse {
    pub error: String,
}
