use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Every route here sits behind `auth_middleware` (applied in `create_router`),
/// so handlers always receive a validated `AuthUser`. Ownership rules are then
/// enforced per handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /api/me
        .route("/api/me", get(handlers::auth::get_current_user))
        // POST /api/authors
        // Creates an author profile bound to the caller.
        .route("/api/authors", post(handlers::authors::create_author))
        // PUT /api/authors/{slug}, DELETE /api/authors/{id}
        // Both owner-only. The path segment is shared, so DELETE reads it as a numeric id.
        .route(
            "/api/authors/{slug}",
            put(handlers::authors::update_author).delete(handlers::authors::delete_author),
        )
        // POST /api/images, DELETE /api/images/{id}
        .route("/api/images", post(handlers::images::create_image))
        .route(
            "/api/images/{id}",
            axum::routing::delete(handlers::images::delete_image),
        )
        // POST /api/articles
        // Only callers with an author profile may publish.
        .route("/api/articles", post(handlers::articles::create_article))
        // PUT/DELETE /api/articles/{id}
        // Owner-only: the caller's author profile must own the article.
        .route(
            "/api/articles/{id}",
            put(handlers::articles::update_article).delete(handlers::articles::delete_article),
        )
        // POST /api/articles/{id}/images
        .route(
            "/api/articles/{id}/images",
            post(handlers::articles::attach_article_image),
        )
}
