pub(crate) mod auth_service;
pub(crate) mod events;
pub(crate) mod feed_service;
