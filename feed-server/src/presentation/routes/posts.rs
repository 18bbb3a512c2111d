use axum::Router;
use axum::middleware;
use axum::routing::{delete, get, post};

use crate::presentation::AppState;
use crate::presentation::handlers::posts::{
    create_post, delete_post, get_post, like_post, post_engagement, repost_post, unlike_post,
    unrepost_post,
};
use crate::presentation::middleware::auth::{jwt_auth_middleware, optional_jwt_auth_middleware};

pub(crate) fn router(state: AppState) -> Router<AppState> {
    let public = Router::new().route("/{id}", get(get_post));

    // Engagement works anonymously, but a valid token makes the
    // viewer-relative flags meaningful.
    let engagement = Router::new()
        .route("/{id}/engagement", get(post_engagement))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            optional_jwt_auth_middleware,
        ));

    let protected = Router::new()
        .route("/", post(create_post))
        .route("/{id}", delete(delete_post))
        .route("/{id}/like", post(like_post).delete(unlike_post))
        .route("/{id}/repost", post(repost_post).delete(unrepost_post))
        .layer(middleware::from_fn_with_state(state, jwt_auth_middleware));

    public.merge(engagement).merge(protected)
}
