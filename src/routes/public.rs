use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without a token. Reads here only ever see live
/// (non-deleted) rows; the stores apply that filter.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe for load balancers.
        .route("/health", get(|| async { "ok" }))
        // POST /api/login, POST /api/register
        // Credential exchange. Both return `{token, user}`.
        .route("/api/login", post(handlers::auth::login))
        .route("/api/register", post(handlers::auth::register))
        // GET /api/authors, GET /api/authors/{slug}
        .route("/api/authors", get(handlers::authors::get_authors))
        .route("/api/authors/{slug}", get(handlers::authors::get_author))
        // GET /api/images/{id}
        .route("/api/images/{id}", get(handlers::images::get_image))
        // GET /api/articles, GET /api/articles/{id}
        // Articles come back with their author embedded.
        .route("/api/articles", get(handlers::articles::get_articles))
        .route("/api/articles/{id}", get(handlers::articles::get_article))
        .route(
            "/api/articles/{id}/images",
            get(handlers::articles::get_article_images),
        )
}
