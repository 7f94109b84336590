use axum::{
    Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    models::{Author, AuthorCreate, AuthorUpdate, MessageResponse},
};

use super::{LIST_LIMIT, LIST_OFFSET};

/// Owner-only rule shared by author update and delete.
fn ensure_author_owner(author: &Author, caller: &AuthUser, action: &str) -> ApiResult<()> {
    if author.user_id != caller.id {
        tracing::warn!(
            author_id = author.id,
            caller_id = caller.id,
            "rejected {} of another user's author profile",
            action
        );
        return Err(ApiError::Authorization(format!(
            "Not authorized to {action} this author"
        )));
    }
    Ok(())
}

/// get_authors
///
/// [Public Route] Lists live author profiles. Always the first page of 10.
#[utoipa::path(
    get,
    path = "/api/authors",
    responses((status = 200, description = "Authors", body = [Author]))
)]
pub async fn get_authors(State(state): State<AppState>) -> ApiResult<Json<Vec<Author>>> {
    let authors = state.authors.get_all(LIST_LIMIT, LIST_OFFSET).await?;
    Ok(Json(authors))
}

/// get_author
///
/// [Public Route] Looks an author up by slug.
#[utoipa::path(
    get,
    path = "/api/authors/{slug}",
    params(("slug" = String, Path, description = "Author slug")),
    responses(
        (status = 200, description = "Found", body = Author),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_author(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<Json<Author>> {
    let author = state
        .authors
        .get_by_slug(&slug)
        .await
        .or_not_found("Author not found")?;
    Ok(Json(author))
}

/// create_author
///
/// [Authenticated Route] Creates an author profile bound to the caller.
/// A second profile with the same name collides on the slug and yields 409.
#[utoipa::path(
    post,
    path = "/api/authors",
    request_body = AuthorCreate,
    responses(
        (status = 201, description = "Created", body = Author),
        (status = 409, description = "Slug already taken", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_author(
    caller: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<AuthorCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Author>)> {
    let Json(input) = payload?;
    if input.name.trim().is_empty() {
        return Err(ApiError::Validation("Author name is required".to_string()));
    }

    let author = state.authors.create(input, caller.id).await?;
    tracing::info!(author_id = author.id, user_id = caller.id, "author created");
    Ok((StatusCode::CREATED, Json(author)))
}

/// update_author
///
/// [Authenticated Route] Overwrites name and bio. Owner-only.
#[utoipa::path(
    put,
    path = "/api/authors/{slug}",
    params(("slug" = String, Path, description = "Author slug")),
    request_body = AuthorUpdate,
    responses(
        (status = 200, description = "Updated", body = Author),
        (status = 403, description = "Not Owner", body = crate::models::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_author(
    caller: AuthUser,
    State(state): State<AppState>,
    Path(slug): Path<String>,
    payload: Result<Json<AuthorUpdate>, JsonRejection>,
) -> ApiResult<Json<Author>> {
    let Json(input) = payload?;

    let existing = state
        .authors
        .get_by_slug(&slug)
        .await
        .or_not_found("Author not found")?;
    ensure_author_owner(&existing, &caller, "update")?;

    let updated = state
        .authors
        .update(existing.id, input)
        .await
        .or_not_found("Author not found")?;
    Ok(Json(updated))
}

/// delete_author
///
/// [Authenticated Route] Soft-deletes an author by numeric id. Owner-only.
///
/// The route shares the `/api/authors/{slug}` segment with the slug routes; here
/// the segment must parse as an id.
#[utoipa::path(
    delete,
    path = "/api/authors/{id}",
    params(("id" = i64, Path, description = "Author ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner", body = crate::models::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_author(
    caller: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id.map_err(|_| ApiError::Validation("Invalid author ID".to_string()))?;

    let existing = state
        .authors
        .get_by_id(id)
        .await
        .or_not_found("Author not found")?;
    ensure_author_owner(&existing, &caller, "delete")?;

    state.authors.delete(id).await.or_not_found("Author not found")?;
    tracing::info!(author_id = id, "author deleted");
    Ok(Json(MessageResponse::new("Author deleted successfully")))
}
