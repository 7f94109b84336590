#![allow(dead_code)]

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::Utc;
use serde_json::Value;
use skinny_cms::{
    AppConfig, AppState, create_router,
    models::{
        Article, ArticleCreate, ArticleUpdate, Author, AuthorCreate, AuthorUpdate, Image,
        ImageCreate, NewUser, User, UserUpdate,
    },
    slug::slugify,
    stores::{
        ArticleStore, AuthorStore, ImageStore, StoreError, StoreResult, UserStore,
        article::DEFAULT_STATUS,
    },
};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

// --- IN-MEMORY STORES ---

// One shared "database" behind all four store traits. It keeps soft-deleted rows,
// enforces live-row uniqueness like the partial indexes do, and embeds authors
// into articles like the join does.
#[derive(Default)]
pub struct MemoryDb {
    inner: Mutex<Tables>,
}

#[derive(Default)]
pub struct Tables {
    pub users: Vec<User>,
    pub authors: Vec<Author>,
    pub articles: Vec<Article>,
    pub images: Vec<Image>,
    pub article_images: Vec<(i64, i64)>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn with_author(&self, article: &Article) -> Article {
        let mut article = article.clone();
        article.author = self
            .authors
            .iter()
            .find(|a| a.id == article.author_id)
            .cloned();
        article
    }
}

const ROLES: [(i64, &str); 2] = [(1, "admin"), (2, "author")];

impl MemoryDb {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Read access for assertions on raw rows, soft-deleted ones included.
    pub fn tables(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.inner.lock().unwrap()
    }
}

#[async_trait]
impl UserStore for MemoryDb {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        let mut t = self.tables();
        if t.users
            .iter()
            .any(|u| u.deleted_at.is_none() && u.email == user.email)
        {
            return Err(StoreError::Conflict("users_email_live_idx".to_string()));
        }
        let (role_id, role) = ROLES
            .iter()
            .find(|(_, name)| *name == user.role)
            .map(|(id, name)| (*id, name.to_string()))
            .ok_or_else(|| StoreError::Database(sqlx::Error::Protocol("unknown role".into())))?;

        let now = Utc::now();
        let created = User {
            id: t.next_id(),
            name: user.name,
            email: user.email,
            password_hash: user.password_hash,
            is_admin: false,
            role_id,
            role,
            last_login: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<User> {
        self.tables()
            .users
            .iter()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_email(&self, email: &str) -> StoreResult<User> {
        self.tables()
            .users
            .iter()
            .find(|u| u.email == email && u.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<User>> {
        Ok(self
            .tables()
            .users
            .iter()
            .filter(|u| u.deleted_at.is_none())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, user: UserUpdate) -> StoreResult<User> {
        let mut t = self.tables();
        let row = t
            .users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(StoreError::NotFound)?;
        row.name = user.name;
        row.email = user.email;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables();
        let row = t
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn touch_last_login(&self, id: i64) -> StoreResult<User> {
        let mut t = self.tables();
        let row = t
            .users
            .iter_mut()
            .find(|u| u.id == id && u.deleted_at.is_none())
            .ok_or(StoreError::NotFound)?;
        row.last_login = Some(Utc::now());
        Ok(row.clone())
    }
}

#[async_trait]
impl AuthorStore for MemoryDb {
    async fn create(&self, author: AuthorCreate, user_id: i64) -> StoreResult<Author> {
        let mut t = self.tables();
        let slug = slugify(&author.name);
        if t.authors
            .iter()
            .any(|a| a.deleted_at.is_none() && a.slug == slug)
        {
            return Err(StoreError::Conflict("authors_slug_live_idx".to_string()));
        }
        let now = Utc::now();
        let created = Author {
            id: t.next_id(),
            name: author.name,
            slug,
            bio: author.bio,
            user_id,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        t.authors.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Author> {
        self.tables()
            .authors
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_slug(&self, slug: &str) -> StoreResult<Author> {
        self.tables()
            .authors
            .iter()
            .find(|a| a.slug == slug && a.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_by_user_id(&self, user_id: i64) -> StoreResult<Author> {
        self.tables()
            .authors
            .iter()
            .find(|a| a.user_id == user_id && a.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<Author>> {
        Ok(self
            .tables()
            .authors
            .iter()
            .filter(|a| a.deleted_at.is_none())
            .skip(offset as usize)
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn update(&self, id: i64, author: AuthorUpdate) -> StoreResult<Author> {
        let mut t = self.tables();
        let row = t
            .authors
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .ok_or(StoreError::NotFound)?;
        row.name = author.name;
        row.bio = author.bio;
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables();
        let row = t
            .authors
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl ArticleStore for MemoryDb {
    async fn create(&self, article: ArticleCreate, author_id: i64) -> StoreResult<Article> {
        let mut t = self.tables();
        let slug = slugify(&article.title);
        if t.articles
            .iter()
            .any(|a| a.deleted_at.is_none() && a.slug == slug)
        {
            return Err(StoreError::Conflict("articles_slug_live_idx".to_string()));
        }
        let status = if article.status.trim().is_empty() {
            DEFAULT_STATUS.to_string()
        } else {
            article.status
        };
        let now = Utc::now();
        let created = Article {
            id: t.next_id(),
            title: article.title,
            slug,
            short_description: article.short_description,
            content: article.content,
            status,
            author_id,
            author: None,
            published_at: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        t.articles.push(created.clone());
        Ok(t.with_author(&created))
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Article> {
        let t = self.tables();
        t.articles
            .iter()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .map(|a| t.with_author(a))
            .ok_or(StoreError::NotFound)
    }

    async fn get_all(&self, limit: i64, offset: i64) -> StoreResult<Vec<Article>> {
        let t = self.tables();
        Ok(t.articles
            .iter()
            .filter(|a| a.deleted_at.is_none())
            .skip(offset as usize)
            .take(limit as usize)
            .map(|a| t.with_author(a))
            .collect())
    }

    async fn update(&self, id: i64, article: ArticleUpdate) -> StoreResult<Article> {
        let mut t = self.tables();
        let row = t
            .articles
            .iter_mut()
            .find(|a| a.id == id && a.deleted_at.is_none())
            .ok_or(StoreError::NotFound)?;
        row.title = article.title;
        row.short_description = article.short_description;
        row.content = article.content;
        row.status = article.status;
        row.published_at = article.published_at;
        row.updated_at = Utc::now();
        let updated = row.clone();
        Ok(t.with_author(&updated))
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables();
        let row = t
            .articles
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or(StoreError::NotFound)?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl ImageStore for MemoryDb {
    async fn create(&self, image: ImageCreate) -> StoreResult<Image> {
        let mut t = self.tables();
        let created = Image {
            id: t.next_id(),
            url: image.url,
            created_at: Utc::now(),
            deleted_at: None,
        };
        t.images.push(created.clone());
        Ok(created)
    }

    async fn get_by_id(&self, id: i64) -> StoreResult<Image> {
        self.tables()
            .images
            .iter()
            .find(|i| i.id == id && i.deleted_at.is_none())
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: i64) -> StoreResult<()> {
        let mut t = self.tables();
        let row = t
            .images
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        row.deleted_at = Some(Utc::now());
        Ok(())
    }

    async fn attach_to_article(&self, article_id: i64, image_id: i64) -> StoreResult<()> {
        let mut t = self.tables();
        if !t.article_images.contains(&(article_id, image_id)) {
            t.article_images.push((article_id, image_id));
        }
        Ok(())
    }

    async fn get_for_article(&self, article_id: i64) -> StoreResult<Vec<Image>> {
        let t = self.tables();
        Ok(t.article_images
            .iter()
            .filter(|(a, _)| *a == article_id)
            .filter_map(|(_, image_id)| {
                t.images
                    .iter()
                    .find(|i| i.id == *image_id && i.deleted_at.is_none())
                    .cloned()
            })
            .collect())
    }
}

// --- APP SCAFFOLDING ---

pub fn test_state(db: &Arc<MemoryDb>) -> AppState {
    AppState::new(
        db.clone(),
        db.clone(),
        db.clone(),
        db.clone(),
        AppConfig::default(),
    )
    .expect("test config has a signing secret")
}

pub fn test_app(db: &Arc<MemoryDb>) -> Router {
    create_router(test_state(db))
}

/// Sends one request through the router and returns status plus decoded JSON body
/// (`Value::Null` for empty or non-JSON bodies).
pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

/// Registers a user and returns `(user_id, token)`.
pub async fn register(app: &Router, name: &str, email: &str, password: &str) -> (i64, String) {
    let (status, body) = send(
        app,
        "POST",
        "/api/register",
        None,
        Some(serde_json::json!({ "name": name, "email": email, "password": password })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["user"]["id"].as_i64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
    )
}

/// Creates an author profile for the token's user and returns the author JSON.
pub async fn create_author(app: &Router, token: &str, name: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/authors",
        Some(token),
        Some(serde_json::json!({ "name": name, "bio": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create author failed: {body}");
    body
}

/// Creates an article under the token's author profile and returns the article JSON.
pub async fn create_article(app: &Router, token: &str, title: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/articles",
        Some(token),
        Some(serde_json::json!({
            "title": title,
            "short_description": "short",
            "content": "body"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create article failed: {body}");
    body
}
