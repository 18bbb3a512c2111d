pub(crate) mod auth;
pub(crate) mod feed;
pub(crate) mod posts;
