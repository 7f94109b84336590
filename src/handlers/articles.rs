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
    models::{
        Article, ArticleCreate, ArticleUpdate, AttachImageRequest, Image, MessageResponse,
    },
    stores::StoreError,
};

use super::{LIST_LIMIT, LIST_OFFSET};

fn article_id(id: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::Validation("Invalid article ID".to_string()))
}

/// Loads a live article and checks that the caller's author profile owns it.
///
/// Order matters: a missing article is a 404 before any ownership question is asked.
/// A caller without an author profile, or with a different one, gets 403.
pub(crate) async fn load_owned_article(
    state: &AppState,
    caller: &AuthUser,
    id: i64,
    action: &str,
) -> ApiResult<Article> {
    let article = state
        .articles
        .get_by_id(id)
        .await
        .or_not_found("Article not found")?;

    let forbidden = || ApiError::Authorization(format!("Not authorized to {action} this article"));

    let author = match state.authors.get_by_user_id(caller.id).await {
        Ok(author) => author,
        Err(StoreError::NotFound) => return Err(forbidden()),
        Err(e) => return Err(e.into()),
    };

    if author.id != article.author_id {
        tracing::warn!(
            article_id = id,
            caller_id = caller.id,
            "rejected {} of an article owned by another author",
            action
        );
        return Err(forbidden());
    }

    Ok(article)
}

/// get_articles
///
/// [Public Route] Lists live articles with their authors. Always the first page of 10.
#[utoipa::path(
    get,
    path = "/api/articles",
    responses((status = 200, description = "Articles", body = [Article]))
)]
pub async fn get_articles(State(state): State<AppState>) -> ApiResult<Json<Vec<Article>>> {
    let articles = state.articles.get_all(LIST_LIMIT, LIST_OFFSET).await?;
    Ok(Json(articles))
}

/// get_article
///
/// [Public Route] Retrieves one live article with its author embedded.
#[utoipa::path(
    get,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = Article),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_article(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Article>> {
    let id = article_id(id)?;
    let article = state
        .articles
        .get_by_id(id)
        .await
        .or_not_found("Article not found")?;
    Ok(Json(article))
}

/// create_article
///
/// [Authenticated Route] Publishes a new article under the caller's author profile.
/// Callers without a profile get 403 and nothing is written.
#[utoipa::path(
    post,
    path = "/api/articles",
    request_body = ArticleCreate,
    responses(
        (status = 201, description = "Created", body = Article),
        (status = 403, description = "Caller is not an author", body = crate::models::ErrorResponse),
        (status = 409, description = "Slug already taken", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn create_article(
    caller: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ArticleCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Article>)> {
    let Json(input) = payload?;

    let author = match state.authors.get_by_user_id(caller.id).await {
        Ok(author) => author,
        Err(StoreError::NotFound) => {
            return Err(ApiError::Authorization(
                "Only authors can create articles".to_string(),
            ));
        }
        Err(e) => return Err(e.into()),
    };

    if input.title.trim().is_empty() {
        return Err(ApiError::Validation("Article title is required".to_string()));
    }

    let article = state.articles.create(input, author.id).await?;
    tracing::info!(article_id = article.id, author_id = author.id, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// update_article
///
/// [Authenticated Route] Overwrites the article's editable fields. Owner-only.
#[utoipa::path(
    put,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = ArticleUpdate,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 403, description = "Not Owner", body = crate::models::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn update_article(
    caller: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<ArticleUpdate>, JsonRejection>,
) -> ApiResult<Json<Article>> {
    let id = article_id(id)?;
    let Json(input) = payload?;

    load_owned_article(&state, &caller, id, "update").await?;

    let updated = state
        .articles
        .update(id, input)
        .await
        .or_not_found("Article not found")?;
    Ok(Json(updated))
}

/// delete_article
///
/// [Authenticated Route] Soft-deletes an article. Owner-only.
#[utoipa::path(
    delete,
    path = "/api/articles/{id}",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 403, description = "Not Owner", body = crate::models::ErrorResponse),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_article(
    caller: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = article_id(id)?;

    load_owned_article(&state, &caller, id, "delete").await?;

    state.articles.delete(id).await.or_not_found("Article not found")?;
    tracing::info!(article_id = id, "article deleted");
    Ok(Json(MessageResponse::new("Article deleted successfully")))
}

/// get_article_images
///
/// [Public Route] Lists the live images linked to a live article.
#[utoipa::path(
    get,
    path = "/api/articles/{id}/images",
    params(("id" = i64, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Images", body = [Image]),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_article_images(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Vec<Image>>> {
    let id = article_id(id)?;
    state
        .articles
        .get_by_id(id)
        .await
        .or_not_found("Article not found")?;

    let images = state.images.get_for_article(id).await?;
    Ok(Json(images))
}

/// attach_article_image
///
/// [Authenticated Route] Links an existing image to an article. Owner-only, same
/// rule as updating the article. Returns the article's images after linking.
#[utoipa::path(
    post,
    path = "/api/articles/{id}/images",
    params(("id" = i64, Path, description = "Article ID")),
    request_body = AttachImageRequest,
    responses(
        (status = 200, description = "Linked", body = [Image]),
        (status = 403, description = "Not Owner", body = crate::models::ErrorResponse),
        (status = 404, description = "Article or image not found", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn attach_article_image(
    caller: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AttachImageRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Image>>> {
    let id = article_id(id)?;
    let Json(request) = payload?;

    load_owned_article(&state, &caller, id, "update").await?;
    state
        .images
        .get_by_id(request.image_id)
        .await
        .or_not_found("Image not found")?;

    state.images.attach_to_article(id, request.image_id).await?;
    let images = state.images.get_for_article(id).await?;
    Ok(Json(images))
}
