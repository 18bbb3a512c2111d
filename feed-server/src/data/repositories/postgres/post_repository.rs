use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::data::post_repository::{FeedQuery, NewPost, PostRepository};
use crate::domain::error::DomainError;
use crate::domain::post::{Post, Repost};

#[derive(Debug, Clone)]
pub(crate) struct PostgresPostRepository {
    pool: PgPool,
}

impl PostgresPostRepository {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn post_exists(&self, post_id: i64) -> Result<bool, DomainError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM posts WHERE id = $1)")
            .bind(post_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_post_db_error)
    }

    /// Loads the mutable member sets for a batch of posts in two queries.
    async fn load_member_sets(
        &self,
        post_ids: &[i64],
    ) -> Result<(HashMap<i64, Vec<i64>>, HashMap<i64, Vec<Repost>>), DomainError> {
        let like_rows = sqlx::query_as::<_, LikeRow>(
            r#"
            SELECT post_id, user_id
            FROM post_likes
            WHERE post_id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        let repost_rows = sqlx::query_as::<_, RepostRow>(
            r#"
            SELECT post_id, reposter_id, created_at
            FROM post_reposts
            WHERE post_id = ANY($1)
            "#,
        )
        .bind(post_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        let mut likers: HashMap<i64, Vec<i64>> = HashMap::new();
        for row in like_rows {
            likers.entry(row.post_id).or_default().push(row.user_id);
        }

        let mut reposts: HashMap<i64, Vec<Repost>> = HashMap::new();
        for row in repost_rows {
            // A repost without a timestamp cannot be placed on the feed;
            // refuse the read instead of inventing a sort position.
            let created_at = row.created_at.ok_or_else(|| {
                DomainError::Unexpected(format!(
                    "repost record ({}, {}) has no timestamp",
                    row.post_id, row.reposter_id
                ))
            })?;
            let repost = Repost::new(row.reposter_id, created_at)
                .map_err(|err| DomainError::Unexpected(err.to_string()))?;
            reposts.entry(row.post_id).or_default().push(repost);
        }

        Ok((likers, reposts))
    }
}

#[derive(sqlx::FromRow)]
struct PostRow {
    id: i64,
    author_id: i64,
    file_id: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct LikeRow {
    post_id: i64,
    user_id: i64,
}

#[derive(sqlx::FromRow)]
struct RepostRow {
    post_id: i64,
    reposter_id: i64,
    created_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (author_id, file_id)
            VALUES ($1, $2)
            RETURNING id, author_id, file_id, created_at
            "#,
        )
        .bind(input.author_id)
        .bind(&input.file_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Post::new(
            row.id,
            row.author_id,
            row.file_id,
            row.created_at,
            Vec::new(),
            Vec::new(),
        )
        .map_err(|err| DomainError::Unexpected(err.to_string()))
    }

    async fn get_post(&self, id: i64) -> Result<Option<Post>, DomainError> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, author_id, file_id, created_at
            FROM posts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let (mut likers, mut reposts) = self.load_member_sets(&[row.id]).await?;
        let post = assemble_post(row, &mut likers, &mut reposts)?;
        Ok(Some(post))
    }

    async fn delete_post_owned(&self, post_id: i64, author_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM posts
            WHERE id = $1 AND author_id = $2
            "#,
        )
        .bind(post_id)
        .bind(author_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        Ok(result.rows_affected() > 0)
    }

    async fn feed_candidates(&self, query: FeedQuery) -> Result<Vec<Post>, DomainError> {
        // Over-approximating scan: keep every post with at least one event
        // strictly before the cursor and rank posts by their newest such
        // event. The merge step does the exact per-event work.
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, author_id, file_id, created_at
            FROM (
                SELECT
                    p.id,
                    p.author_id,
                    p.file_id,
                    p.created_at,
                    GREATEST(
                        CASE
                            WHEN p.created_at < COALESCE($2::TIMESTAMPTZ, 'infinity')
                            THEN p.created_at
                        END,
                        MAX(r.created_at) FILTER (
                            WHERE r.created_at < COALESCE($2::TIMESTAMPTZ, 'infinity')
                        )
                    ) AS newest_event_at
                FROM posts p
                LEFT JOIN post_reposts r ON r.post_id = p.id
                WHERE ($1::BIGINT IS NULL OR p.author_id = $1)
                GROUP BY p.id
            ) candidates
            WHERE newest_event_at IS NOT NULL
            ORDER BY newest_event_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(query.author_id)
        .bind(query.before)
        .bind(query.fetch_limit)
        .fetch_all(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let post_ids: Vec<i64> = rows.iter().map(|row| row.id).collect();
        let (mut likers, mut reposts) = self.load_member_sets(&post_ids).await?;

        rows.into_iter()
            .map(|row| assemble_post(row, &mut likers, &mut reposts))
            .collect()
    }

    async fn add_liker(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_likes (post_id, user_id)
            SELECT p.id, $2
            FROM posts p
            WHERE p.id = $1
            ON CONFLICT (post_id, user_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        // Zero rows means either a repeat like or a missing post.
        self.post_exists(post_id).await
    }

    async fn remove_liker(&self, post_id: i64, user_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM post_likes
            WHERE post_id = $1 AND user_id = $2
            "#,
        )
        .bind(post_id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.post_exists(post_id).await
    }

    async fn add_repost(&self, post_id: i64, reposter_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            INSERT INTO post_reposts (post_id, reposter_id)
            SELECT p.id, $2
            FROM posts p
            WHERE p.id = $1
            ON CONFLICT (post_id, reposter_id) DO NOTHING
            "#,
        )
        .bind(post_id)
        .bind(reposter_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.post_exists(post_id).await
    }

    async fn remove_repost(&self, post_id: i64, reposter_id: i64) -> Result<bool, DomainError> {
        let result = sqlx::query(
            r#"
            DELETE FROM post_reposts
            WHERE post_id = $1 AND reposter_id = $2
            "#,
        )
        .bind(post_id)
        .bind(reposter_id)
        .execute(&self.pool)
        .await
        .map_err(map_post_db_error)?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }
        self.post_exists(post_id).await
    }
}

fn assemble_post(
    row: PostRow,
    likers: &mut HashMap<i64, Vec<i64>>,
    reposts: &mut HashMap<i64, Vec<Repost>>,
) -> Result<Post, DomainError> {
    Post::new(
        row.id,
        row.author_id,
        row.file_id,
        row.created_at,
        likers.remove(&row.id).unwrap_or_default(),
        reposts.remove(&row.id).unwrap_or_default(),
    )
    .map_err(|err| DomainError::Unexpected(err.to_string()))
}

fn map_post_db_error(err: sqlx::Error) -> DomainError {
    match &err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            DomainError::Unavailable(err.to_string())
        }
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
            DomainError::NotFound("user".to_string())
        }
        _ => DomainError::Unexpected(err.to_string()),
    }
}
