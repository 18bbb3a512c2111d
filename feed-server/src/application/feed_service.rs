use tokio::sync::broadcast;

use crate::application::events::PostCreated;
use crate::data::post_repository::{FeedQuery, NewPost, PostRepository};
use crate::data::user_repository::UserRepository;
use crate::domain::cursor::decode_cursor;
use crate::domain::error::DomainError;
use crate::domain::feed::{FeedPage, merge_timeline};
use crate::domain::post::{CreatePostRequest, Post};

/// Presentation fields derived from a post's current member sets. Always
/// computed from a fresh read, never from a copy held since the feed query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct EngagementView {
    pub(crate) likes_count: i64,
    pub(crate) is_liked: bool,
    pub(crate) reposts_count: i64,
    pub(crate) is_reposted: bool,
}

/// Translates one page request into the storage-level candidate scan:
/// decode the cursor into the strict upper bound and fetch one extra post
/// so the merger can tell whether a next page exists.
pub(crate) fn plan_feed_query(
    author_id: Option<i64>,
    cursor: Option<&str>,
    limit: u32,
) -> Result<FeedQuery, DomainError> {
    let before = cursor.map(decode_cursor).transpose()?;
    Ok(FeedQuery {
        author_id,
        before,
        fetch_limit: i64::from(limit) + 1,
    })
}

pub(crate) struct FeedService<P: PostRepository, U: UserRepository> {
    posts: P,
    users: U,
    post_created: broadcast::Sender<PostCreated>,
}

impl<P: PostRepository, U: UserRepository> FeedService<P, U> {
    pub(crate) fn new(posts: P, users: U, post_created: broadcast::Sender<PostCreated>) -> Self {
        Self {
            posts,
            users,
            post_created,
        }
    }

    pub(crate) async fn list_feed(
        &self,
        cursor: Option<String>,
        limit: u32,
        author_username: Option<String>,
    ) -> Result<FeedPage, DomainError> {
        let author_id = match author_username {
            Some(username) => match self.users.find_by_username(&username).await? {
                Some(credentials) => Some(credentials.user.id),
                // Unknown author is a well-formed empty-result request.
                None => return Ok(FeedPage::empty()),
            },
            None => None,
        };

        let query = plan_feed_query(author_id, cursor.as_deref(), limit)?;
        let candidates = self.posts.feed_candidates(query).await?;

        Ok(merge_timeline(candidates, query.before, limit as usize))
    }

    pub(crate) async fn get_post(&self, id: i64) -> Result<Post, DomainError> {
        self.posts
            .get_post(id)
            .await?
            .ok_or(DomainError::NotFound(format!("post id: {id}")))
    }

    pub(crate) async fn create_post(
        &self,
        author_id: i64,
        req: CreatePostRequest,
    ) -> Result<Post, DomainError> {
        let req = req.validate()?;

        let post = self
            .posts
            .create_post(NewPost {
                author_id,
                file_id: req.file_id,
            })
            .await?;

        // No subscribers is fine; pagination does not depend on delivery.
        let _ = self.post_created.send(PostCreated { post: post.clone() });

        Ok(post)
    }

    pub(crate) async fn delete_post(
        &self,
        actor_user_id: i64,
        post_id: i64,
    ) -> Result<(), DomainError> {
        if self.posts.delete_post_owned(post_id, actor_user_id).await? {
            return Ok(());
        }
        match self.posts.get_post(post_id).await? {
            Some(_) => Err(DomainError::Forbidden),
            None => Err(DomainError::NotFound(format!("post id: {post_id}"))),
        }
    }

    pub(crate) async fn like_post(&self, post_id: i64, viewer_id: i64) -> Result<bool, DomainError> {
        self.posts.add_liker(post_id, viewer_id).await
    }

    pub(crate) async fn unlike_post(
        &self,
        post_id: i64,
        viewer_id: i64,
    ) -> Result<bool, DomainError> {
        self.posts.remove_liker(post_id, viewer_id).await
    }

    pub(crate) async fn repost_post(
        &self,
        post_id: i64,
        viewer_id: i64,
    ) -> Result<bool, DomainError> {
        self.posts.add_repost(post_id, viewer_id).await
    }

    pub(crate) async fn unrepost_post(
        &self,
        post_id: i64,
        viewer_id: i64,
    ) -> Result<bool, DomainError> {
        self.posts.remove_repost(post_id, viewer_id).await
    }

    pub(crate) async fn post_engagement(
        &self,
        post_id: i64,
        viewer_id: Option<i64>,
    ) -> Result<EngagementView, DomainError> {
        let Some(post) = self.posts.get_post(post_id).await? else {
            // A deleted post's engagement is vacuously empty.
            return Ok(EngagementView::default());
        };

        Ok(EngagementView {
            likes_count: post.likes_count(),
            is_liked: viewer_id.is_some_and(|viewer| post.is_liked_by(viewer)),
            reposts_count: post.reposts_count(),
            is_reposted: viewer_id.is_some_and(|viewer| post.is_reposted_by(viewer)),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use chrono::{DateTime, Utc};

    use super::{EngagementView, FeedService, plan_feed_query};
    use crate::application::events::post_created_channel;
    use crate::data::post_repository::{FeedQuery, NewPost, PostRepository};
    use crate::data::user_repository::{NewUser, UserCredentials, UserRepository};
    use crate::domain::cursor::encode_cursor;
    use crate::domain::error::DomainError;
    use crate::domain::feed::FeedEventKind;
    use crate::domain::post::{CreatePostRequest, Post, Repost};
    use crate::domain::user::User;

    #[derive(Clone)]
    struct FakePostRepo {
        feed_query: Arc<Mutex<Option<FeedQuery>>>,
        feed_result: Arc<Mutex<Vec<Post>>>,
        post_for_get: Arc<Mutex<Option<Post>>>,
        created_input: Arc<Mutex<Option<NewPost>>>,
        delete_result: Arc<Mutex<bool>>,
        mutation_result: Arc<Mutex<bool>>,
    }

    impl FakePostRepo {
        fn new() -> Self {
            Self {
                feed_query: Arc::new(Mutex::new(None)),
                feed_result: Arc::new(Mutex::new(Vec::new())),
                post_for_get: Arc::new(Mutex::new(None)),
                created_input: Arc::new(Mutex::new(None)),
                delete_result: Arc::new(Mutex::new(true)),
                mutation_result: Arc::new(Mutex::new(true)),
            }
        }

        fn set_feed_result(&self, posts: Vec<Post>) {
            *self.feed_result.lock().expect("feed_result mutex poisoned") = posts;
        }

        fn captured_feed_query(&self) -> Option<FeedQuery> {
            *self.feed_query.lock().expect("feed_query mutex poisoned")
        }
    }

    #[async_trait]
    impl PostRepository for FakePostRepo {
        async fn create_post(&self, input: NewPost) -> Result<Post, DomainError> {
            *self
                .created_input
                .lock()
                .expect("created_input mutex poisoned") = Some(input.clone());
            Ok(sample_post(1, input.author_id, at(100), vec![]))
        }

        async fn get_post(&self, _id: i64) -> Result<Option<Post>, DomainError> {
            Ok(self
                .post_for_get
                .lock()
                .expect("post_for_get mutex poisoned")
                .clone())
        }

        async fn delete_post_owned(
            &self,
            _post_id: i64,
            _author_id: i64,
        ) -> Result<bool, DomainError> {
            Ok(*self
                .delete_result
                .lock()
                .expect("delete_result mutex poisoned"))
        }

        async fn feed_candidates(&self, query: FeedQuery) -> Result<Vec<Post>, DomainError> {
            *self.feed_query.lock().expect("feed_query mutex poisoned") = Some(query);
            Ok(self
                .feed_result
                .lock()
                .expect("feed_result mutex poisoned")
                .clone())
        }

        async fn add_liker(&self, _post_id: i64, _user_id: i64) -> Result<bool, DomainError> {
            Ok(*self
                .mutation_result
                .lock()
                .expect("mutation_result mutex poisoned"))
        }

        async fn remove_liker(&self, _post_id: i64, _user_id: i64) -> Result<bool, DomainError> {
            Ok(*self
                .mutation_result
                .lock()
                .expect("mutation_result mutex poisoned"))
        }

        async fn add_repost(&self, _post_id: i64, _reposter_id: i64) -> Result<bool, DomainError> {
            Ok(*self
                .mutation_result
                .lock()
                .expect("mutation_result mutex poisoned"))
        }

        async fn remove_repost(
            &self,
            _post_id: i64,
            _reposter_id: i64,
        ) -> Result<bool, DomainError> {
            Ok(*self
                .mutation_result
                .lock()
                .expect("mutation_result mutex poisoned"))
        }
    }

    #[derive(Clone)]
    struct FakeUserRepo {
        user_for_lookup: Arc<Mutex<Option<User>>>,
    }

    impl FakeUserRepo {
        fn new(user_for_lookup: Option<User>) -> Self {
            Self {
                user_for_lookup: Arc::new(Mutex::new(user_for_lookup)),
            }
        }
    }

    #[async_trait]
    impl UserRepository for FakeUserRepo {
        async fn create_user(&self, _input: NewUser) -> Result<User, DomainError> {
            Err(DomainError::Unexpected("not used in feed tests".to_string()))
        }

        async fn find_by_username(
            &self,
            _username: &str,
        ) -> Result<Option<UserCredentials>, DomainError> {
            Ok(self
                .user_for_lookup
                .lock()
                .expect("user_for_lookup mutex poisoned")
                .clone()
                .map(|user| UserCredentials {
                    user,
                    password_hash: "unused".to_string(),
                }))
        }
    }

    fn at(seconds: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(seconds, 0).expect("timestamp must be valid")
    }

    fn sample_post(id: i64, author_id: i64, created_at: DateTime<Utc>, reposts: Vec<Repost>) -> Post {
        Post::new(id, author_id, format!("file-{id}"), created_at, vec![], reposts)
            .expect("sample post must be valid")
    }

    fn sample_user(id: i64, username: &str) -> User {
        User::new(id, username, format!("{username}@example.com"), Utc::now())
            .expect("sample user must be valid")
    }

    fn service(
        posts: FakePostRepo,
        users: FakeUserRepo,
    ) -> FeedService<FakePostRepo, FakeUserRepo> {
        FeedService::new(posts, users, post_created_channel())
    }

    #[test]
    fn plan_decodes_cursor_and_fetches_one_extra() {
        let cursor = encode_cursor(at(500));
        let query =
            plan_feed_query(Some(7), Some(cursor.as_str()), 20).expect("plan must succeed");

        assert_eq!(query.author_id, Some(7));
        assert_eq!(query.before, Some(at(500)));
        assert_eq!(query.fetch_limit, 21);
    }

    #[test]
    fn plan_rejects_malformed_cursor() {
        let err = plan_feed_query(None, Some("???"), 20).expect_err("plan must fail");
        assert!(matches!(err, DomainError::MalformedCursor));
    }

    #[tokio::test]
    async fn unknown_author_yields_empty_page_without_touching_storage() {
        let posts = FakePostRepo::new();
        let users = FakeUserRepo::new(None);
        let service = service(posts.clone(), users);

        let page = service
            .list_feed(None, 10, Some("nonexistent".to_string()))
            .await
            .expect("list_feed must succeed");

        assert!(page.edges.is_empty());
        assert!(!page.page_info.has_next_page);
        assert!(page.page_info.end_cursor.is_none());
        assert!(posts.captured_feed_query().is_none());
    }

    #[tokio::test]
    async fn author_filter_resolves_username_to_author_id() {
        let posts = FakePostRepo::new();
        let users = FakeUserRepo::new(Some(sample_user(7, "alice")));
        let service = service(posts.clone(), users);

        service
            .list_feed(None, 10, Some("alice".to_string()))
            .await
            .expect("list_feed must succeed");

        let query = posts
            .captured_feed_query()
            .expect("storage must be queried");
        assert_eq!(query.author_id, Some(7));
        assert_eq!(query.before, None);
        assert_eq!(query.fetch_limit, 11);
    }

    #[tokio::test]
    async fn list_feed_merges_candidates_into_a_page() {
        let posts = FakePostRepo::new();
        posts.set_feed_result(vec![
            sample_post(
                1,
                10,
                at(100),
                vec![Repost::new(11, at(300)).expect("repost must be valid")],
            ),
            sample_post(2, 11, at(200), vec![]),
        ]);
        let service = service(posts, FakeUserRepo::new(None));

        let page = service
            .list_feed(None, 2, None)
            .await
            .expect("list_feed must succeed");

        assert_eq!(page.edges.len(), 2);
        assert_eq!(
            page.edges[0].kind,
            FeedEventKind::Repost { reposter_id: 11 }
        );
        assert_eq!(page.edges[1].kind, FeedEventKind::Original);
        assert!(page.page_info.has_next_page);
        assert_eq!(
            page.page_info.end_cursor.as_deref(),
            Some(encode_cursor(at(200)).as_str())
        );
    }

    #[tokio::test]
    async fn list_feed_rejects_malformed_cursor_as_client_error() {
        let service = service(FakePostRepo::new(), FakeUserRepo::new(None));

        let err = service
            .list_feed(Some("not a cursor".to_string()), 10, None)
            .await
            .expect_err("list_feed must fail");
        assert!(matches!(err, DomainError::MalformedCursor));
    }

    #[tokio::test]
    async fn create_post_publishes_post_created_event() {
        let posts = FakePostRepo::new();
        let channel = post_created_channel();
        let mut subscriber = channel.subscribe();
        let service = FeedService::new(posts, FakeUserRepo::new(None), channel);

        let created = service
            .create_post(
                10,
                CreatePostRequest {
                    file_id: "  file-abc  ".to_string(),
                },
            )
            .await
            .expect("create_post must succeed");

        let event = subscriber.try_recv().expect("event must be published");
        assert_eq!(event.post.id, created.id);
    }

    #[tokio::test]
    async fn create_post_normalizes_request_before_repo_call() {
        let posts = FakePostRepo::new();
        let service = service(posts.clone(), FakeUserRepo::new(None));

        service
            .create_post(
                10,
                CreatePostRequest {
                    file_id: "  file-abc  ".to_string(),
                },
            )
            .await
            .expect("create_post must succeed");

        let input = posts
            .created_input
            .lock()
            .expect("created_input mutex poisoned")
            .clone()
            .expect("repo input must be captured");
        assert_eq!(input.file_id, "file-abc");
        assert_eq!(input.author_id, 10);
    }

    #[tokio::test]
    async fn delete_post_is_forbidden_for_non_owner() {
        let posts = FakePostRepo::new();
        *posts
            .delete_result
            .lock()
            .expect("delete_result mutex poisoned") = false;
        *posts
            .post_for_get
            .lock()
            .expect("post_for_get mutex poisoned") = Some(sample_post(7, 99, at(100), vec![]));
        let service = service(posts, FakeUserRepo::new(None));

        let err = service
            .delete_post(10, 7)
            .await
            .expect_err("must be forbidden");
        assert!(matches!(err, DomainError::Forbidden));
    }

    #[tokio::test]
    async fn delete_post_reports_not_found_for_missing_post() {
        let posts = FakePostRepo::new();
        *posts
            .delete_result
            .lock()
            .expect("delete_result mutex poisoned") = false;
        let service = service(posts, FakeUserRepo::new(None));

        let err = service
            .delete_post(10, 7)
            .await
            .expect_err("must be missing");
        assert!(matches!(err, DomainError::NotFound(_)));
    }

    #[tokio::test]
    async fn engagement_of_unknown_post_is_vacuously_empty() {
        let service = service(FakePostRepo::new(), FakeUserRepo::new(None));

        let view = service
            .post_engagement(42, Some(10))
            .await
            .expect("engagement must succeed");

        assert_eq!(view, EngagementView::default());
    }

    #[tokio::test]
    async fn engagement_reflects_freshly_read_member_sets() {
        let posts = FakePostRepo::new();
        let mut post = sample_post(
            7,
            10,
            at(100),
            vec![Repost::new(3, at(200)).expect("repost must be valid")],
        );
        post.likers = vec![2, 3];
        *posts
            .post_for_get
            .lock()
            .expect("post_for_get mutex poisoned") = Some(post);
        let service = service(posts, FakeUserRepo::new(None));

        let view = service
            .post_engagement(7, Some(3))
            .await
            .expect("engagement must succeed");

        assert_eq!(view.likes_count, 2);
        assert!(view.is_liked);
        assert_eq!(view.reposts_count, 1);
        assert!(view.is_reposted);

        let anonymous = service
            .post_engagement(7, None)
            .await
            .expect("engagement must succeed");
        assert!(!anonymous.is_liked);
        assert!(!anonymous.is_reposted);
    }

    #[tokio::test]
    async fn like_and_repost_pass_through_to_storage() {
        let posts = FakePostRepo::new();
        let service = service(posts.clone(), FakeUserRepo::new(None));

        assert!(service.like_post(7, 10).await.expect("like must succeed"));
        assert!(service.repost_post(7, 10).await.expect("repost must succeed"));

        *posts
            .mutation_result
            .lock()
            .expect("mutation_result mutex poisoned") = false;
        assert!(!service.unlike_post(7, 10).await.expect("unlike must succeed"));
        assert!(!service
            .unrepost_post(7, 10)
            .await
            .expect("unrepost must succeed"));
    }
}
