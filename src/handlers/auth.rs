use axum::{Json, extract::State, extract::rejection::JsonRejection, http::StatusCode};

use crate::{
    AppState,
    auth::AuthUser,
    error::{ApiError, ApiResult, StoreResultExt},
    models::{AuthResponse, LoginRequest, NewUser, RegisterRequest, UserResponse},
    password::{hash_password, verify_password},
    stores::StoreError,
};

/// Role assigned to every self-registered account.
pub const DEFAULT_ROLE: &str = "author";

/// login
///
/// [Public Route] Exchanges email + password for a bearer token.
///
/// Unknown email and wrong password produce the same 401 so the endpoint does
/// not reveal which accounts exist.
#[utoipa::path(
    post,
    path = "/api/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = AuthResponse),
        (status = 401, description = "Invalid credentials", body = crate::models::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(credentials) = payload?;
    let invalid = || ApiError::Authentication("Invalid credentials".to_string());

    let user = match state.users.get_by_email(&credentials.email).await {
        Ok(user) => user,
        Err(StoreError::NotFound) => return Err(invalid()),
        Err(e) => return Err(e.into()),
    };

    if !verify_password(&user.password_hash, &credentials.password) {
        tracing::info!(user_id = user.id, "login rejected: wrong password");
        return Err(invalid());
    }

    let token = state.tokens.issue_token(&user)?;
    let user = state.users.touch_last_login(user.id).await?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// register
///
/// [Public Route] Creates an account with the "author" role and signs it in.
///
/// The email pre-check gives a friendly 409 in the common case. It races with
/// concurrent registrations; the partial unique index on `users.email` is the
/// actual guarantee, and its violation is also reported as 409.
#[utoipa::path(
    post,
    path = "/api/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = AuthResponse),
        (status = 400, description = "Missing required fields", body = crate::models::ErrorResponse),
        (status = 409, description = "Email already exists", body = crate::models::ErrorResponse)
    )
)]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(request) = payload?;

    if request.name.trim().is_empty()
        || request.email.trim().is_empty()
        || request.password.trim().is_empty()
    {
        return Err(ApiError::Validation("Missing required fields".to_string()));
    }

    let email_taken = || ApiError::Conflict("Email already exists".to_string());

    match state.users.get_by_email(&request.email).await {
        Ok(_) => return Err(email_taken()),
        Err(StoreError::NotFound) => {}
        Err(e) => return Err(e.into()),
    }

    let password_hash = hash_password(&request.password)?;
    let new_user = NewUser {
        name: request.name,
        email: request.email,
        password_hash,
        role: DEFAULT_ROLE.to_string(),
    };

    let user = match state.users.create(new_user).await {
        Ok(user) => user,
        Err(StoreError::Conflict(_)) => return Err(email_taken()),
        Err(e) => return Err(e.into()),
    };

    let token = state.tokens.issue_token(&user)?;

    tracing::info!(user_id = user.id, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: user.into(),
        }),
    ))
}

/// get_current_user
///
/// [Authenticated Route] Returns the caller's own record (without the password hash).
#[utoipa::path(
    get,
    path = "/api/me",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not authenticated", body = crate::models::ErrorResponse)
    ),
    security(("bearer" = []))
)]
pub async fn get_current_user(
    AuthUser { id, .. }: AuthUser,
    State(state): State<AppState>,
) -> ApiResult<Json<UserResponse>> {
    let user = state.users.get_by_id(id).await.or_not_found("User not found")?;
    Ok(Json(user.into()))
}
