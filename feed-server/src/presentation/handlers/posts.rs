use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::application::feed_service::EngagementView;
use crate::domain::post::{CreatePostRequest, Post};
use crate::presentation::AppState;
use crate::presentation::app_error::{AppError, AppResult};
use crate::presentation::middleware::auth::AuthenticatedUser;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct CreatePostDto {
    /// Reference into external file storage for the post's attachment.
    #[validate(length(min = 1, max = 255))]
    pub(crate) file_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PostDto {
    pub(crate) id: i64,
    pub(crate) author_id: i64,
    pub(crate) file_id: String,
    pub(crate) created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct EngagementDto {
    pub(crate) likes_count: i64,
    pub(crate) is_liked: bool,
    pub(crate) reposts_count: i64,
    pub(crate) is_reposted: bool,
}

impl From<Post> for PostDto {
    fn from(post: Post) -> Self {
        Self {
            id: post.id,
            author_id: post.author_id,
            file_id: post.file_id,
            created_at: post.created_at,
        }
    }
}

impl From<EngagementView> for EngagementDto {
    fn from(view: EngagementView) -> Self {
        Self {
            likes_count: view.likes_count,
            is_liked: view.is_liked,
            reposts_count: view.reposts_count,
            is_reposted: view.is_reposted,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Post found", body = PostDto),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    let result = state.feed_service.get_post(id).await?;

    Ok((StatusCode::OK, Json(PostDto::from(result))))
}

#[utoipa::path(
    get,
    path = "/api/posts/{id}/engagement",
    tag = "posts",
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 200, description = "Engagement for the post; viewer flags need a bearer token", body = EngagementDto),
        (status = 401, description = "Invalid token"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn post_engagement(
    State(state): State<AppState>,
    viewer: Option<AuthenticatedUser>,
    Path(id): Path<i64>,
) -> AppResult<(StatusCode, Json<EngagementDto>)> {
    let view = state
        .feed_service
        .post_engagement(id, viewer.map(|auth| auth.user_id))
        .await?;

    Ok((StatusCode::OK, Json(EngagementDto::from(view))))
}

#[utoipa::path(
    post,
    path = "/api/posts",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    request_body = CreatePostDto,
    responses(
        (status = 201, description = "Post created", body = PostDto),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn create_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Json(dto): Json<CreatePostDto>,
) -> AppResult<(StatusCode, Json<PostDto>)> {
    dto.validate()?;
    let req = CreatePostRequest {
        file_id: dto.file_id,
    };

    let result = state.feed_service.create_post(auth.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(PostDto::from(result))))
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Post deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn delete_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.feed_service.delete_post(auth.user_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/like",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Liked (idempotent)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn like_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    found(state.feed_service.like_post(id, auth.user_id).await?)
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}/like",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Unliked (idempotent)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn unlike_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    found(state.feed_service.unlike_post(id, auth.user_id).await?)
}

#[utoipa::path(
    post,
    path = "/api/posts/{id}/repost",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Reposted (idempotent)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn repost_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    found(state.feed_service.repost_post(id, auth.user_id).await?)
}

#[utoipa::path(
    delete,
    path = "/api/posts/{id}/repost",
    tag = "posts",
    security(
        ("bearer_auth" = [])
    ),
    params(
        ("id" = i64, Path, description = "Post id")
    ),
    responses(
        (status = 204, description = "Unreposted (idempotent)"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Post not found"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn unrepost_post(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    found(state.feed_service.unrepost_post(id, auth.user_id).await?)
}

fn found(post_exists: bool) -> AppResult<StatusCode> {
    if post_exists {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::NotFound)
    }
}
