use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use super::cursor::encode_cursor;
use super::post::Post;

/// What placed a post on the feed: its own creation, or one re-share of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FeedEventKind {
    Original,
    Repost { reposter_id: i64 },
}

/// One feed occurrence, sorted by its own timestamp. A post with reposts
/// contributes several events, so the same post may legitimately show up
/// more than once on a page, each time with its own kind.
#[derive(Debug, Clone)]
pub(crate) struct FeedEvent {
    pub(crate) post: Post,
    pub(crate) occurred_at: DateTime<Utc>,
    pub(crate) kind: FeedEventKind,
}

#[derive(Debug, Clone)]
pub(crate) struct PageInfo {
    pub(crate) has_next_page: bool,
    /// None when the page is empty; there is no last-event timestamp to
    /// encode and no sentinel stands in for one.
    pub(crate) end_cursor: Option<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct FeedPage {
    pub(crate) edges: Vec<FeedEvent>,
    pub(crate) page_info: PageInfo,
}

impl FeedPage {
    pub(crate) fn empty() -> Self {
        Self {
            edges: Vec::new(),
            page_info: PageInfo {
                has_next_page: false,
                end_cursor: None,
            },
        }
    }
}

/// Expands one post into the events it contributes: exactly one original
/// event at the post's creation time plus one repost event per repost
/// record. Relative order of the output is not meaningful; the merge
/// re-sorts regardless.
pub(crate) fn expand_events(post: &Post) -> Vec<FeedEvent> {
    let mut events = Vec::with_capacity(post.reposts.len() + 1);
    events.push(FeedEvent {
        post: post.clone(),
        occurred_at: post.created_at,
        kind: FeedEventKind::Original,
    });
    for repost in &post.reposts {
        events.push(FeedEvent {
            post: post.clone(),
            occurred_at: repost.created_at,
            kind: FeedEventKind::Repost {
                reposter_id: repost.reposter_id,
            },
        });
    }
    events
}

/// Merges candidate posts into one descending-time page of events.
///
/// The candidate set is an over-approximation from storage; the exact
/// per-event cursor filter and the truncation happen here. Events at
/// exactly the cursor timestamp were on the previous page and are excluded.
pub(crate) fn merge_timeline(
    posts: Vec<Post>,
    before: Option<DateTime<Utc>>,
    limit: usize,
) -> FeedPage {
    let mut events: Vec<FeedEvent> = posts
        .iter()
        .flat_map(expand_events)
        .filter(|event| before.is_none_or(|cutoff| event.occurred_at < cutoff))
        .collect();

    events.sort_by(compare_events);

    let has_next_page = events.len() > limit;
    events.truncate(limit);

    let end_cursor = events.last().map(|event| encode_cursor(event.occurred_at));

    FeedPage {
        edges: events,
        page_info: PageInfo {
            has_next_page,
            end_cursor,
        },
    }
}

// Total order: newest first, ties broken by post id, then original before
// repost, then reposter id, so repeated merges of the same input paginate
// identically.
fn compare_events(a: &FeedEvent, b: &FeedEvent) -> Ordering {
    b.occurred_at
        .cmp(&a.occurred_at)
        .then_with(|| b.post.id.cmp(&a.post.id))
        .then_with(|| kind_rank(&a.kind).cmp(&kind_rank(&b.kind)))
}

fn kind_rank(kind: &FeedEventKind) -> (u8, i64) {
    match kind {
        FeedEventKind::Original => (0, 0),
        FeedEventKind::Repost { reposter_id } => (1, *reposter_id),
    }
}
