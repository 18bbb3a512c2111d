use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// One re-share of a post by another user. The timestamp is assigned by
/// storage when the repost is written and never changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Repost {
    pub(crate) reposter_id: i64,
    pub(crate) created_at: DateTime<Utc>,
}

impl Repost {
    pub(crate) fn new(reposter_id: i64, created_at: DateTime<Utc>) -> Result<Self, DomainError> {
        validate_positive_i64("reposter_id", reposter_id)?;
        Ok(Self {
            reposter_id,
            created_at,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Post {
    pub(crate) id: i64,
    pub(crate) author_id: i64,
    pub(crate) file_id: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) likers: Vec<i64>,
    pub(crate) reposts: Vec<Repost>,
}

impl Post {
    pub(crate) fn new(
        id: i64,
        author_id: i64,
        file_id: impl Into<String>,
        created_at: DateTime<Utc>,
        likers: Vec<i64>,
        reposts: Vec<Repost>,
    ) -> Result<Self, DomainError> {
        validate_positive_i64("id", id)?;
        validate_positive_i64("author_id", author_id)?;
        let file_id = normalize_file_id(&file_id.into())?;

        // A (post, reposter) pair appears at most once; a duplicate here is
        // corrupted storage state, not something to sort around.
        for (index, repost) in reposts.iter().enumerate() {
            validate_positive_i64("reposter_id", repost.reposter_id)?;
            if reposts[..index]
                .iter()
                .any(|other| other.reposter_id == repost.reposter_id)
            {
                return Err(DomainError::Validation {
                    field: "reposts",
                    message: "duplicate reposter",
                });
            }
        }

        Ok(Self {
            id,
            author_id,
            file_id,
            created_at,
            likers,
            reposts,
        })
    }

    pub(crate) fn likes_count(&self) -> i64 {
        self.likers.len() as i64
    }

    pub(crate) fn is_liked_by(&self, viewer_id: i64) -> bool {
        self.likers.contains(&viewer_id)
    }

    pub(crate) fn reposts_count(&self) -> i64 {
        self.reposts.len() as i64
    }

    pub(crate) fn is_reposted_by(&self, viewer_id: i64) -> bool {
        self.reposts
            .iter()
            .any(|repost| repost.reposter_id == viewer_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CreatePostRequest {
    pub(crate) file_id: String,
}

impl CreatePostRequest {
    pub(crate) fn validate(self) -> Result<Self, DomainError> {
        Ok(Self {
            file_id: normalize_file_id(&self.file_id)?,
        })
    }
}

fn validate_positive_i64(field: &'static str, value: i64) -> Result<(), DomainError> {
    if value <= 0 {
        return Err(DomainError::Validation {
            field,
            message: "must be > 0",
        });
    }
    Ok(())
}

fn normalize_file_id(file_id: &str) -> Result<String, DomainError> {
    let file_id = file_id.trim();
    if file_id.is_empty() || file_id.len() > 255 {
        return Err(DomainError::Validation {
            field: "file_id",
            message: "must be 1..255 chars",
        });
    }
    Ok(file_id.to_string())
}
