use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::{error::ApiError, token::TokenService};

/// AuthUser
///
/// The authenticated identity of a request, decoded from its bearer token.
/// Protected handlers take it as an argument; it is never looked up by untyped key.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: String,
}

impl AuthUser {
    /// Authenticates a request from its headers.
    ///
    /// 1. `Authorization` must be present and shaped `Bearer <token>`.
    /// 2. The token must pass signature, algorithm and expiry checks.
    ///
    /// Any failure is a 401; there is no retry and no refresh.
    pub fn from_headers(headers: &HeaderMap, tokens: &TokenService) -> Result<Self, ApiError> {
        let auth_header = headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| ApiError::Authentication("No authorization header".to_string()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .filter(|token| !token.is_empty() && !token.contains(' '))
            .ok_or_else(|| ApiError::Authentication("Invalid token format".to_string()))?;

        let claims = tokens.validate_token(token)?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

/// Resolves `AuthUser` for a handler. Behind `auth_middleware` the identity is
/// already in the request extensions; otherwise the token is validated here.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenService: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthUser>() {
            return Ok(user.clone());
        }

        let tokens = TokenService::from_ref(state);
        AuthUser::from_headers(&parts.headers, &tokens)
    }
}

/// auth_middleware
///
/// Gate for the authenticated router. Rejected requests never reach a handler;
/// accepted ones carry their `AuthUser` in the request extensions.
pub async fn auth_middleware(
    State(tokens): State<TokenService>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = match AuthUser::from_headers(request.headers(), &tokens) {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(uri = %request.uri(), "rejected unauthenticated request: {}", e);
            return Err(e);
        }
    };

    tracing::debug!(user_id = user.id, role = %user.role, "request authenticated");
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
