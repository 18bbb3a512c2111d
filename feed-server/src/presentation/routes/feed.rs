use axum::{Router, routing::get};

use crate::presentation::AppState;
use crate::presentation::handlers::feed::list_feed;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", get(list_feed))
}
