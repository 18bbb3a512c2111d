use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, OptionalFromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};

use crate::presentation::AppState;
use crate::presentation::app_error::AppError;

#[derive(Debug, Clone)]
pub(crate) struct AuthenticatedUser {
    pub(crate) user_id: i64,
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::Unauthorized)
    }
}

// Viewer-relative fields (engagement flags) work without a token; routes
// behind optional_jwt_auth_middleware extract Option<AuthenticatedUser>.
impl<S> OptionalFromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<AuthenticatedUser>().cloned())
    }
}

pub(crate) async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?.ok_or(AppError::Unauthorized)?;

    let claims = state
        .jwt
        .verify(&token)
        .map_err(|_| AppError::Unauthorized)?;

    request
        .extensions_mut()
        .insert(AuthenticatedUser { user_id: claims.sub });

    Ok(next.run(request).await)
}

/// Like `jwt_auth_middleware`, but a missing Authorization header passes
/// through anonymously. A header that is present but invalid still fails.
pub(crate) async fn optional_jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(token) = bearer_token(request.headers())? {
        let claims = state
            .jwt
            .verify(&token)
            .map_err(|_| AppError::Unauthorized)?;

        request
            .extensions_mut()
            .insert(AuthenticatedUser { user_id: claims.sub });
    }

    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(auth_header) = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
    else {
        return Ok(None);
    };

    let mut parts = auth_header.split_whitespace();
    let scheme = parts.next().ok_or(AppError::Unauthorized)?;
    let token = parts.next().ok_or(AppError::Unauthorized)?;
    if parts.next().is_some() {
        return Err(AppError::Unauthorized);
    }
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(AppError::Unauthorized);
    }
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    Ok(Some(token.to_string()))
}
