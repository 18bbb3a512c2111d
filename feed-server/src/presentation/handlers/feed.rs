use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::domain::feed::{FeedEvent, FeedEventKind, FeedPage};
use crate::presentation::AppState;
use crate::presentation::app_error::AppResult;
use crate::presentation::handlers::posts::PostDto;

const DEFAULT_PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub(crate) struct FeedQueryDto {
    /// Opaque cursor from a previous page's `end_cursor`. Cursors are only
    /// valid for the same filter they were obtained with.
    pub(crate) cursor: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub(crate) limit: Option<u32>,
    /// Restrict the feed to one author's posts (and their reposts).
    pub(crate) author: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct FeedEdgeDto {
    pub(crate) post: PostDto,
    /// Timestamp that placed this edge on the feed: the post's creation
    /// time, or the repost's.
    pub(crate) occurred_at: DateTime<Utc>,
    pub(crate) is_repost: bool,
    pub(crate) reposter_id: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct PageInfoDto {
    pub(crate) has_next_page: bool,
    pub(crate) end_cursor: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub(crate) struct FeedPageDto {
    pub(crate) edges: Vec<FeedEdgeDto>,
    pub(crate) page_info: PageInfoDto,
}

impl From<FeedEvent> for FeedEdgeDto {
    fn from(event: FeedEvent) -> Self {
        let (is_repost, reposter_id) = match event.kind {
            FeedEventKind::Original => (false, None),
            FeedEventKind::Repost { reposter_id } => (true, Some(reposter_id)),
        };
        Self {
            post: event.post.into(),
            occurred_at: event.occurred_at,
            is_repost,
            reposter_id,
        }
    }
}

impl From<FeedPage> for FeedPageDto {
    fn from(page: FeedPage) -> Self {
        Self {
            edges: page.edges.into_iter().map(FeedEdgeDto::from).collect(),
            page_info: PageInfoDto {
                has_next_page: page.page_info.has_next_page,
                end_cursor: page.page_info.end_cursor,
            },
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/feed",
    tag = "feed",
    params(
        ("cursor" = Option<String>, Query, description = "Opaque cursor from a previous page"),
        ("limit" = Option<u32>, Query, description = "Edges per page (1..=500, default 100)"),
        ("author" = Option<String>, Query, description = "Filter by author username")
    ),
    responses(
        (status = 200, description = "Feed page", body = FeedPageDto),
        (status = 400, description = "Validation error or malformed cursor"),
        (status = 500, description = "Internal error")
    )
)]
pub(crate) async fn list_feed(
    State(state): State<AppState>,
    Query(query): Query<FeedQueryDto>,
) -> AppResult<(StatusCode, Json<FeedPageDto>)> {
    query.validate()?;
    let limit = query.limit.unwrap_or(DEFAULT_PAGE_LIMIT);

    let page = state
        .feed_service
        .list_feed(query.cursor, limit, query.author)
        .await?;

    Ok((StatusCode::OK, Json(FeedPageDto::from(page))))
}
