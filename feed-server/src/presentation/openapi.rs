use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::presentation::handlers::auth::{AccountDto, LoginDto, RegisterDto, SessionDto};
use crate::presentation::handlers::feed::{FeedEdgeDto, FeedPageDto, FeedQueryDto, PageInfoDto};
use crate::presentation::handlers::posts::{CreatePostDto, EngagementDto, PostDto};

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::presentation::handlers::auth::register,
        crate::presentation::handlers::auth::login,
        crate::presentation::handlers::feed::list_feed,
        crate::presentation::handlers::posts::get_post,
        crate::presentation::handlers::posts::post_engagement,
        crate::presentation::handlers::posts::create_post,
        crate::presentation::handlers::posts::delete_post,
        crate::presentation::handlers::posts::like_post,
        crate::presentation::handlers::posts::unlike_post,
        crate::presentation::handlers::posts::repost_post,
        crate::presentation::handlers::posts::unrepost_post
    ),
    components(
        schemas(
            RegisterDto,
            LoginDto,
            SessionDto,
            AccountDto,
            CreatePostDto,
            PostDto,
            EngagementDto,
            FeedQueryDto,
            FeedEdgeDto,
            PageInfoDto,
            FeedPageDto
        )
    ),
    tags(
        (name = "auth", description = "Authentication endpoints"),
        (name = "feed", description = "Cursor-paginated timeline"),
        (name = "posts", description = "Post and engagement endpoints")
    ),
    modifiers(&SecurityAddon)
)]
pub(crate) struct ApiDoc;

pub(crate) struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let mut components = openapi.components.take().unwrap_or_default();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
        openapi.components = Some(components);
    }
}
