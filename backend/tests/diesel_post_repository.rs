//! Integration tests for the Diesel post, comment and follower repositories.
//!
//! The suite runs the version-checked update, the feed query and constraint
//! classification against embedded PostgreSQL. Accounts and the follow graph
//! are seeded with plain SQL before each test.

use pg_embedded_setup_unpriv::TemporaryDatabase;
use rstest::{fixture, rstest};
use social_backend::domain::ports::{
    CommentRepository, CommentRepositoryError, FollowerRepository, FollowerRepositoryError,
    PostRepository,
};
use social_backend::domain::{
    AccountId, FeedQuery, NewComment, NewPost, Post, PostId, PostUpdate, PostVersion,
    SortDirection,
};
use social_backend::outbound::persistence::{
    DbPool, DieselCommentRepository, DieselFollowerRepository, DieselPostRepository, PoolConfig,
};
use tokio::runtime::Runtime;

mod support;

use support::embedded_postgres::{
    execute_batch, handle_cluster_setup_failure, provision_template_database,
    shared_cluster_handle,
};

const ALICE: AccountId = AccountId::new(1);
const BOB: AccountId = AccountId::new(2);
const CAROL: AccountId = AccountId::new(3);

const SEED_SQL: &str = concat!(
    "INSERT INTO accounts (id, username, email, password_hash, is_active, role_id) VALUES ",
    "(1, 'alice', 'alice@example.com', 'unused', TRUE, 1), ",
    "(2, 'bob', 'bob@example.com', 'unused', TRUE, 1), ",
    "(3, 'carol', 'carol@example.com', 'unused', TRUE, 1); ",
    "SELECT setval('accounts_id_seq', 3); ",
    "INSERT INTO followers (follower_id, followed_id) VALUES (1, 2);"
);

struct TestContext {
    runtime: Runtime,
    posts: DieselPostRepository,
    comments: DieselCommentRepository,
    followers: DieselFollowerRepository,
    _database: TemporaryDatabase,
}

impl TestContext {
    fn create(&self, owner: AccountId, title: &str, tags: &[&str]) -> Post {
        let post = NewPost::new(
            owner,
            title,
            "body text",
            tags.iter().map(|tag| (*tag).to_owned()),
        )
        .expect("valid post");
        self.runtime
            .block_on(self.posts.create(&post))
            .expect("post created")
    }

    fn feed_titles(&self, viewer: AccountId, query: &FeedQuery) -> Vec<String> {
        self.runtime
            .block_on(self.posts.feed(viewer, query))
            .expect("feed loads")
            .into_iter()
            .map(|item| item.post.title)
            .collect()
    }
}

fn edit(post: &Post, expected: PostVersion, title: &str, tags: &[&str]) -> PostUpdate {
    PostUpdate {
        id: post.id,
        expected_version: expected,
        title: title.to_owned(),
        content: post.content.clone(),
        tags: tags.iter().map(|tag| (*tag).to_owned()).collect(),
    }
}

fn setup_context() -> Result<TestContext, String> {
    let runtime = Runtime::new().map_err(|err| err.to_string())?;
    let cluster = shared_cluster_handle()?;
    let temp_db = provision_template_database(cluster)?;
    let database_url = temp_db.url().to_string();
    execute_batch(database_url.as_str(), SEED_SQL)?;

    let config = PoolConfig::new(database_url.as_str())
        .with_max_size(4)
        .with_min_idle(Some(1));
    let pool = runtime
        .block_on(async { DbPool::new(config).await })
        .map_err(|err| err.to_string())?;

    Ok(TestContext {
        runtime,
        posts: DieselPostRepository::new(pool.clone()),
        comments: DieselCommentRepository::new(pool.clone()),
        followers: DieselFollowerRepository::new(pool),
        _database: temp_db,
    })
}

#[fixture]
fn repo_context() -> Option<TestContext> {
    match setup_context() {
        Ok(ctx) => Some(ctx),
        Err(reason) => handle_cluster_setup_failure(reason),
    }
}

#[rstest]
fn stale_version_update_changes_nothing(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: stale_version_update_changes_nothing skipped");
        return;
    };

    let post = context.create(ALICE, "first draft", &[]);
    assert_eq!(post.version, PostVersion::INITIAL);

    let updated = context
        .runtime
        .block_on(
            context
                .posts
                .update(&edit(&post, PostVersion::INITIAL, "second draft", &[])),
        )
        .expect("update runs")
        .expect("version matched");
    assert_eq!(updated.version, PostVersion::new(2));

    let stale = context
        .runtime
        .block_on(
            context
                .posts
                .update(&edit(&post, PostVersion::INITIAL, "lost edit", &[])),
        )
        .expect("update runs");
    assert!(stale.is_none());

    let stored = context
        .runtime
        .block_on(context.posts.find_by_id(post.id))
        .expect("lookup runs")
        .expect("post exists");
    assert_eq!(stored.title, "second draft");
    assert_eq!(stored.version, PostVersion::new(2));
}

#[rstest]
fn racing_updates_from_one_version_admit_one(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: racing_updates_from_one_version_admit_one skipped");
        return;
    };

    let post = context.create(ALICE, "contended", &[]);
    let left = edit(&post, PostVersion::INITIAL, "left", &[]);
    let right = edit(&post, PostVersion::INITIAL, "right", &[]);
    let (left_result, right_result) = context.runtime.block_on(async {
        tokio::join!(context.posts.update(&left), context.posts.update(&right))
    });

    let winners = [
        left_result.expect("left runs"),
        right_result.expect("right runs"),
    ]
    .into_iter()
    .flatten()
    .count();
    assert_eq!(winners, 1);

    let stored = context
        .runtime
        .block_on(context.posts.find_by_id(post.id))
        .expect("lookup runs")
        .expect("post exists");
    assert_eq!(stored.version, PostVersion::new(2));
}

#[rstest]
fn retagging_bumps_the_version_and_moves_tag_matches(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: retagging_bumps_the_version_and_moves_tag_matches skipped");
        return;
    };

    let post = context.create(ALICE, "tagged", &["old"]);
    let retagged = context
        .runtime
        .block_on(context.posts.update(&edit(
            &post,
            PostVersion::INITIAL,
            "tagged",
            &["new", "rust"],
        )))
        .expect("update runs")
        .expect("version matched");
    assert_eq!(retagged.version, PostVersion::new(2));
    assert_eq!(retagged.tags, vec!["new".to_owned(), "rust".to_owned()]);

    let old = FeedQuery::default()
        .with_tags(["old".to_owned()])
        .expect("valid query");
    assert!(context.feed_titles(ALICE, &old).is_empty());

    // Containment ignores tag order.
    let both = FeedQuery::default()
        .with_tags(["rust".to_owned(), "new".to_owned()])
        .expect("valid query");
    assert_eq!(context.feed_titles(ALICE, &both), vec!["tagged".to_owned()]);

    let extra = FeedQuery::default()
        .with_tags(["rust".to_owned(), "go".to_owned()])
        .expect("valid query");
    assert!(context.feed_titles(ALICE, &extra).is_empty());
}

#[rstest]
#[case("100%", "100% coverage")]
#[case("snake_case", "snake_case naming")]
#[case("COVERAGE", "100% coverage")]
fn search_matches_wildcards_literally(
    repo_context: Option<TestContext>,
    #[case] term: &str,
    #[case] expected_first: &str,
) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: search_matches_wildcards_literally skipped");
        return;
    };

    context.create(ALICE, "100% coverage", &[]);
    context.create(ALICE, "1000 lines", &[]);
    context.create(ALICE, "snake_case naming", &[]);
    context.create(ALICE, "snakeXcase naming", &[]);

    let query = FeedQuery::default()
        .with_search(term)
        .expect("valid query")
        .with_sort(SortDirection::Asc);
    let titles = context.feed_titles(ALICE, &query);
    assert_eq!(titles, vec![expected_first.to_owned()]);
}

#[rstest]
fn feed_covers_own_and_followed_posts_with_comment_counts(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!(
            "SKIP-TEST-CLUSTER: feed_covers_own_and_followed_posts_with_comment_counts skipped"
        );
        return;
    };

    context.create(ALICE, "alice writes", &[]);
    let bobs = context.create(BOB, "bob writes", &[]);
    context.create(CAROL, "carol writes", &[]);
    for body in ["nice", "agreed"] {
        let comment = NewComment::new(bobs.id, CAROL, body).expect("valid comment");
        context
            .runtime
            .block_on(context.comments.create(&comment))
            .expect("comment stored");
    }

    let query = FeedQuery::default().with_sort(SortDirection::Asc);
    let items = context
        .runtime
        .block_on(context.posts.feed(ALICE, &query))
        .expect("feed loads");
    let summary: Vec<(String, String, u64)> = items
        .into_iter()
        .map(|item| {
            (
                item.post.title,
                item.author.as_str().to_owned(),
                item.comment_count,
            )
        })
        .collect();
    assert_eq!(
        summary,
        vec![
            ("alice writes".to_owned(), "alice".to_owned(), 0),
            ("bob writes".to_owned(), "bob".to_owned(), 2),
        ]
    );

    assert_eq!(
        context.feed_titles(CAROL, &query),
        vec!["carol writes".to_owned()]
    );

    let paged = FeedQuery::default()
        .with_sort(SortDirection::Asc)
        .with_limit(1)
        .expect("valid limit")
        .with_offset(1);
    assert_eq!(
        context.feed_titles(ALICE, &paged),
        vec!["bob writes".to_owned()]
    );
}

#[rstest]
fn comments_on_missing_posts_are_post_not_found(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: comments_on_missing_posts_are_post_not_found skipped");
        return;
    };

    let comment = NewComment::new(PostId::new(9_999), ALICE, "hello?").expect("valid comment");
    let result = context.runtime.block_on(context.comments.create(&comment));
    assert_eq!(
        result.expect_err("foreign key rejects the comment"),
        CommentRepositoryError::PostNotFound { post_id: 9_999 }
    );
}

#[rstest]
fn deleting_a_post_removes_its_comments(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: deleting_a_post_removes_its_comments skipped");
        return;
    };

    let post = context.create(BOB, "short lived", &[]);
    let comment = NewComment::new(post.id, ALICE, "first").expect("valid comment");
    context
        .runtime
        .block_on(context.comments.create(&comment))
        .expect("comment stored");

    let removed = context
        .runtime
        .block_on(context.posts.delete(post.id))
        .expect("delete runs");
    assert!(removed);
    let comments = context
        .runtime
        .block_on(context.comments.list_for_post(post.id))
        .expect("list runs");
    assert!(comments.is_empty());
}

#[rstest]
fn follow_constraints_are_classified(repo_context: Option<TestContext>) {
    let Some(context) = repo_context else {
        eprintln!("SKIP-TEST-CLUSTER: follow_constraints_are_classified skipped");
        return;
    };

    let duplicate = context.runtime.block_on(context.followers.follow(ALICE, BOB));
    assert_eq!(duplicate, Err(FollowerRepositoryError::AlreadyFollowing));

    let unknown = context
        .runtime
        .block_on(context.followers.follow(ALICE, AccountId::new(999)));
    assert_eq!(unknown, Err(FollowerRepositoryError::UnknownAccount));

    let (first, second) = context.runtime.block_on(async {
        let first = context.followers.unfollow(ALICE, BOB).await;
        let second = context.followers.unfollow(ALICE, BOB).await;
        (first, second)
    });
    assert_eq!(first, Ok(true));
    assert_eq!(second, Ok(false));
    assert!(context.feed_titles(ALICE, &FeedQuery::default()).is_empty());
}
