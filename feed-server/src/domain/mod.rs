pub(crate) mod cursor;
pub(crate) mod error;
pub(crate) mod feed;
pub(crate) mod post;
pub(crate) mod user;
