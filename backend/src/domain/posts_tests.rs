//! Tests for the post service.

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{
    CommentRepositoryError, MockCommentRepository, MockPostRepository, MockRoleRepository,
    PostRepositoryError,
};
use crate::domain::{Email, ErrorCode, PostUpdate, Role, Username};

type Service = PostService<MockPostRepository, MockCommentRepository, MockRoleRepository>;

fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 1, 8, 30, 0)
        .single()
        .expect("valid timestamp")
}

fn role(name: &str, level: i64) -> Role {
    Role {
        id: level,
        name: name.to_owned(),
        description: String::new(),
        level,
    }
}

fn account(id: i64, role: Role) -> Account {
    Account {
        id: AccountId::new(id),
        username: Username::new(format!("user{id}")).expect("username"),
        email: Email::new(format!("user{id}@x.com")).expect("email"),
        is_active: true,
        role,
        created_at: timestamp(),
    }
}

#[fixture]
fn owner() -> Account {
    account(1, role("user", 1))
}

#[fixture]
fn post() -> Post {
    Post {
        id: PostId::new(10),
        title: "hello".to_owned(),
        content: "world".to_owned(),
        tags: Vec::new(),
        owner_id: AccountId::new(1),
        version: PostVersion::INITIAL,
        created_at: timestamp(),
        updated_at: timestamp(),
    }
}

fn make_service(
    posts: MockPostRepository,
    comments: MockCommentRepository,
    roles: MockRoleRepository,
) -> Service {
    PostService::new(Arc::new(posts), Arc::new(comments), Arc::new(roles))
}

fn expect_lookup(posts: &mut MockPostRepository, post: &Post) {
    let stored = post.clone();
    posts
        .expect_find_by_id()
        .times(1)
        .return_once(move |_| Ok(Some(stored)));
}

#[rstest]
#[tokio::test]
async fn owner_update_bumps_version(owner: Account, post: Post) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    let mut bumped = post.clone();
    bumped.title = "edited".to_owned();
    bumped.version = post.version.next();
    posts
        .expect_update()
        .withf(|update: &PostUpdate| {
            update.expected_version == PostVersion::INITIAL
                && update.title == "edited"
                && update.content == "world"
        })
        .times(1)
        .return_once(move |_| Ok(Some(bumped)));
    let mut roles = MockRoleRepository::new();
    roles.expect_find_by_name().times(0);

    let service = make_service(posts, MockCommentRepository::new(), roles);
    let edit = PostEdit::new(Some("edited"), None).expect("valid edit");
    let updated = service
        .update(&owner, post.id, PostVersion::INITIAL, &edit)
        .await
        .expect("update succeeds");
    assert_eq!(updated.version, PostVersion::new(2));
}

#[rstest]
#[tokio::test]
async fn retag_writes_new_tags_and_keeps_text(owner: Account, post: Post) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    let mut bumped = post.clone();
    bumped.tags = vec!["rust".to_owned()];
    bumped.version = post.version.next();
    posts
        .expect_update()
        .withf(|update: &PostUpdate| {
            update.tags == ["rust".to_owned()]
                && update.title == "hello"
                && update.content == "world"
        })
        .times(1)
        .return_once(move |_| Ok(Some(bumped)));

    let service = make_service(posts, MockCommentRepository::new(), MockRoleRepository::new());
    let updated = service
        .update(
            &owner,
            post.id,
            PostVersion::INITIAL,
            &PostEdit::retag(["rust".to_owned()]),
        )
        .await
        .expect("retag succeeds");
    assert_eq!(updated.tags, ["rust".to_owned()]);
}

#[rstest]
#[tokio::test]
async fn stale_version_is_not_found(owner: Account, post: Post) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    posts.expect_update().times(1).return_once(|_| Ok(None));

    let service = make_service(posts, MockCommentRepository::new(), MockRoleRepository::new());
    let edit = PostEdit::new(None, Some("new body")).expect("valid edit");
    let error = service
        .update(&owner, post.id, PostVersion::new(7), &edit)
        .await
        .expect_err("stale");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[case(role("user", 1), Some(ErrorCode::Forbidden))]
#[case(role("moderator", 2), None)]
#[case(role("admin", 3), None)]
#[tokio::test]
async fn non_owner_update_requires_moderator(
    post: Post,
    #[case] actor_role: Role,
    #[case] expected: Option<ErrorCode>,
) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    let updated = Post {
        version: post.version.next(),
        ..post.clone()
    };
    posts
        .expect_update()
        .times(usize::from(expected.is_none()))
        .return_once(move |_| Ok(Some(updated)));
    let mut roles = MockRoleRepository::new();
    roles
        .expect_find_by_name()
        .withf(|name: &str| name == MODERATOR_ROLE)
        .times(1)
        .return_once(|_| Ok(Some(role("moderator", 2))));

    let service = make_service(posts, MockCommentRepository::new(), roles);
    let actor = account(2, actor_role);
    let edit = PostEdit::new(Some("edited"), None).expect("valid edit");
    let result = service
        .update(&actor, post.id, PostVersion::INITIAL, &edit)
        .await;
    assert_eq!(result.err().map(|err| err.code()), expected);
}

#[rstest]
#[tokio::test]
async fn moderator_cannot_delete_foreign_post(post: Post) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    posts.expect_delete().times(0);
    let mut roles = MockRoleRepository::new();
    roles
        .expect_find_by_name()
        .withf(|name: &str| name == ADMIN_ROLE)
        .times(1)
        .return_once(|_| Ok(Some(role("admin", 3))));

    let service = make_service(posts, MockCommentRepository::new(), roles);
    let error = service
        .delete(&account(2, role("moderator", 2)), post.id)
        .await
        .expect_err("forbidden");
    assert_eq!(error.code(), ErrorCode::Forbidden);
}

#[rstest]
#[tokio::test]
async fn delete_of_vanished_post_is_not_found(owner: Account, post: Post) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    posts.expect_delete().times(1).return_once(|_| Ok(false));

    let service = make_service(posts, MockCommentRepository::new(), MockRoleRepository::new());
    let error = service.delete(&owner, post.id).await.expect_err("gone");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn get_with_comments_joins_comment_list(post: Post) {
    let mut posts = MockPostRepository::new();
    expect_lookup(&mut posts, &post);
    let comment = Comment {
        id: 1,
        post_id: post.id,
        author_id: AccountId::new(2),
        author: Username::new("bob").expect("username"),
        content: "nice".to_owned(),
        created_at: timestamp(),
    };
    let listed = vec![comment.clone()];
    let mut comments = MockCommentRepository::new();
    comments
        .expect_list_for_post()
        .times(1)
        .return_once(move |_| Ok(listed));

    let service = make_service(posts, comments, MockRoleRepository::new());
    let loaded = service
        .get_with_comments(post.id)
        .await
        .expect("post with comments");
    assert_eq!(loaded.post, post);
    assert_eq!(loaded.comments, vec![comment]);
}

#[rstest]
#[tokio::test]
async fn comment_on_missing_post_is_not_found() {
    let mut comments = MockCommentRepository::new();
    comments
        .expect_create()
        .times(1)
        .return_once(|_| Err(CommentRepositoryError::post_not_found(99_i64)));

    let service = make_service(MockPostRepository::new(), comments, MockRoleRepository::new());
    let comment =
        NewComment::new(PostId::new(99), AccountId::new(1), "hello").expect("valid comment");
    let error = service.add_comment(&comment).await.expect_err("missing post");
    assert_eq!(error.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn feed_failure_maps_to_storage_error() {
    let mut posts = MockPostRepository::new();
    posts
        .expect_feed()
        .times(1)
        .return_once(|_, _| Err(PostRepositoryError::query("bad plan")));

    let service = make_service(posts, MockCommentRepository::new(), MockRoleRepository::new());
    let error = service
        .feed(AccountId::new(1), &FeedQuery::default())
        .await
        .expect_err("query failure");
    assert_eq!(error.code(), ErrorCode::StorageError);
}
