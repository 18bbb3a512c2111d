use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::application::auth_service::AuthResult;
use crate::domain::user::{LoginRequest, RegisterRequest};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;

// Length and email rules live on the domain request types; the DTOs here
// only shape the wire format.
#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct RegisterDto {
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) password: String,
}

impl From<RegisterDto> for RegisterRequest {
    fn from(dto: RegisterDto) -> Self {
        Self {
            username: dto.username,
            email: dto.email,
            password: dto.password,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub(crate) struct LoginDto {
    pub(crate) username: String,
    pub(crate) password: String,
}

impl From<LoginDto> for LoginRequest {
    fn from(dto: LoginDto) -> Self {
        Self {
            username: dto.username,
            password: dto.password,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct AccountDto {
    pub(crate) id: i64,
    pub(crate) username: String,
    pub(crate) email: String,
    pub(crate) created_at: DateTime<Utc>,
}

/// Issued on both register and login; the token goes into the
/// `Authorization: Bearer` header of subsequent requests.
#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct SessionDto {
    pub(crate) token: String,
    pub(crate) account: AccountDto,
}

impl From<AuthResult> for SessionDto {
    fn from(result: AuthResult) -> Self {
        let user = result.user;
        Self {
            token: result.token,
            account: AccountDto {
                id: user.id,
                username: user.username,
                email: user.email,
                created_at: user.created_at,
            },
        }
    }
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterDto,
    responses(
        (status = 201, description = "Account created", body = SessionDto),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Username or email already taken"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn register(
    State(state): State<AppState>,
    Json(dto): Json<RegisterDto>,
) -> AppResult<(StatusCode, Json<SessionDto>)> {
    let session = state.auth_service.register(dto.into()).await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginDto,
    responses(
        (status = 200, description = "Session token issued", body = SessionDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn login(
    State(state): State<AppState>,
    Json(dto): Json<LoginDto>,
) -> AppResult<(StatusCode, Json<SessionDto>)> {
    let session = state.auth_service.login(dto.into()).await?;
    Ok((StatusCode::OK, Json(session.into())))
}
