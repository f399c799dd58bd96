//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` when a migration changes a table.

diesel::table! {
    /// Authorisation roles, seeded by the initial migration.
    roles (id) {
        id -> Int8,
        name -> Varchar,
        description -> Text,
        /// Higher levels carry more authority.
        level -> Int8,
    }
}

diesel::table! {
    /// Registered accounts. `email` and `username` carry unique constraints.
    accounts (id) {
        id -> Int8,
        username -> Varchar,
        email -> Varchar,
        /// Argon2id PHC string.
        password_hash -> Text,
        is_active -> Bool,
        role_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Pending activation invitations. Only the token digest is stored.
    account_invitations (token_digest) {
        /// Hex SHA-256 of the plaintext token.
        token_digest -> Varchar,
        account_id -> Int8,
        expires_at -> Timestamptz,
    }
}

diesel::table! {
    /// Posts with their optimistic concurrency version.
    posts (id) {
        id -> Int8,
        title -> Varchar,
        content -> Text,
        tags -> Array<Text>,
        owner_id -> Int8,
        version -> Int4,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    comments (id) {
        id -> Int8,
        post_id -> Int8,
        author_id -> Int8,
        content -> Text,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Directed follow edges, keyed by the pair.
    followers (follower_id, followed_id) {
        follower_id -> Int8,
        followed_id -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(accounts -> roles (role_id));
diesel::joinable!(account_invitations -> accounts (account_id));
diesel::joinable!(posts -> accounts (owner_id));
diesel::joinable!(comments -> posts (post_id));
diesel::joinable!(comments -> accounts (author_id));

diesel::allow_tables_to_appear_in_same_query!(
    roles,
    accounts,
    account_invitations,
    posts,
    comments,
    followers,
);
