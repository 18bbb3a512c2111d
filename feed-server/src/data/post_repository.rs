use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::error::DomainError;
use crate::domain::post::Post;

#[derive(Debug, Clone)]
pub(crate) struct NewPost {
    pub(crate) author_id: i64,
    pub(crate) file_id: String,
}

/// Storage-level candidate scan for one feed page. The filter is a
/// deliberate over-approximation: it keeps every post with at least one
/// event (creation or repost) strictly before `before`, ordered by the
/// post's newest such event, newest first. Exact per-event filtering
/// happens in the merge step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FeedQuery {
    pub(crate) author_id: Option<i64>,
    pub(crate) before: Option<DateTime<Utc>>,
    pub(crate) fetch_limit: i64,
}

#[async_trait]
pub(crate) trait PostRepository: Send + Sync {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError>;
    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError>;
    /// Deletes in one ownership-checked statement; false when the post is
    /// missing or owned by someone else.
    async fn delete_post_owned(&self, post_id: i64, author_id: i64) -> Result<bool, DomainError>;
    async fn feed_candidates(&self, query: FeedQuery) -> Result<Vec<Post>, DomainError>;

    // Set mutations. All return whether the post exists; repeating an
    // add or remove is an idempotent no-op.
    async fn add_liker(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError>;
    async fn remove_liker(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError>;
    async fn add_repost(&self, post_id: i64, reposter_id: i64) -> Result<bool, DomainError>;
    async fn remove_repost(&self, post_id: i64, reposter_id: i64) -> Result<bool, DomainError>;
}
