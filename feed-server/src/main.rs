use std::sync::Arc;

use anyhow::Result;
use tracing::info;

mod application;
mod data;
mod domain;
mod infrastructure;
mod presentation;
mod server;

use application::auth_service::AuthService;
use application::events::post_created_channel;
use application::feed_service::FeedService;
use data::repositories::postgres::post_repository::PostgresPostRepository;
use data::repositories::postgres::user_repository::PostgresUserRepository;
use infrastructure::database::{create_pool, run_migrations};
use infrastructure::jwt::JwtService;
use infrastructure::logging::init_logging;
use infrastructure::settings::Settings;
use presentation::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::from_env()?;

    init_logging(&settings.log_level)?;

    let pool = create_pool(&settings.database_url).await?;
    run_migrations(&pool).await?;

    let user_repo = PostgresUserRepository::new(pool.clone());
    let post_repo = PostgresPostRepository::new(pool);

    let post_created_tx = post_created_channel();
    let mut post_created_rx = post_created_tx.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = post_created_rx.recv().await {
            info!(post_id = event.post.id, author_id = event.post.author_id, "post created");
        }
    });

    let auth_service = Arc::new(AuthService::new(
        user_repo.clone(),
        JwtService::new(&settings.jwt_secret, settings.jwt_ttl_seconds),
    ));
    let feed_service = Arc::new(FeedService::new(post_repo, user_repo, post_created_tx));
    let jwt = Arc::new(JwtService::new(
        &settings.jwt_secret,
        settings.jwt_ttl_seconds,
    ));

    let state = AppState::new(auth_service, feed_service, jwt);

    server::run_http(&settings, state).await
}
