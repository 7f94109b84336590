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
    models::{Image, ImageCreate, MessageResponse},
};

fn image_id(id: Result<Path<i64>, PathRejection>) -> ApiResult<i64> {
    id.map(|Path(id)| id)
        .map_err(|_| ApiError::Validation("Invalid image ID".to_string()))
}

/// get_image
///
/// [Public Route] Retrieves a live image by id.
#[utoipa::path(
    get,
    path = "/api/images/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Found", body = Image),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    )
)]
pub async fn get_image(
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<Image>> {
    let id = image_id(id)?;
    let image = state
        .images
        .get_by_id(id)
        .await
        .or_not_found("Image not found")?;
    Ok(Json(image))
}

/// create_image
///
/// [Authenticated Route] Records an image URL.
#[utoipa::path(
    post,
    path = "/api/images",
    request_body = ImageCreate,
    responses((status = 201, description = "Created", body = Image)),
    security(("bearer" = []))
)]
pub async fn create_image(
    caller: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<ImageCreate>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Image>)> {
    let Json(input) = payload?;
    if input.url.trim().is_empty() {
        return Err(ApiError::Validation("Image URL is required".to_string()));
    }

    let image = state.images.create(input).await?;
    tracing::info!(image_id = image.id, user_id = caller.id, "image created");
    Ok((StatusCode::CREATED, Json(image)))
}

/// delete_image
///
/// [Authenticated Route] Soft-deletes an image. Images have no owner, so any
/// authenticated caller may delete any image.
#[utoipa::path(
    delete,
    path = "/api/images/{id}",
    params(("id" = i64, Path, description = "Image ID")),
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not Found", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn delete_image(
    caller: AuthUser,
    State(state): State<AppState>,
    id: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let id = image_id(id)?;
    state.images.delete(id).await.or_not_found("Image not found")?;
    tracing::info!(image_id = id, user_id = caller.id, "image deleted");
    Ok(Json(MessageResponse::new("Image deleted successfully")))
}
