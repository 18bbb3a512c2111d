use tokio::sync::broadcast;

use crate::domain::post::Post;

/// Published when a post is created. This is a separate channel from feed
/// pagination; the merge engine neither produces nor consumes it.
#[derive(Debug, Clone)]
pub(crate) struct PostCreated {
    pub(crate) post: Post,
}

const CHANNEL_CAPACITY: usize = 64;

pub(crate) fn post_created_channel() -> broadcast::Sender<PostCreated> {
    broadcast::channel(CHANNEL_CAPACITY).0
}
