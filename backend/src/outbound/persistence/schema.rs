//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Registered accounts.
    users (id) {
        id -> Uuid,
        username -> Varchar,
        /// Domain part lower-cased before insert.
        email -> Varchar,
        /// Argon2 PHC string.
        password_hash -> Text,
        date_of_birth -> Nullable<Date>,
        profile_photo -> Nullable<Varchar>,
        is_active -> Bool,
        is_staff -> Bool,
        is_superuser -> Bool,
    }
}

diesel::table! {
    /// One row per user, written by the profile hook.
    user_profiles (user_id) {
        user_id -> Uuid,
        /// `Admin`, `Librarian` or `Member`.
        role -> Varchar,
    }
}

diesel::table! {
    /// Capability registry, seeded by the initial migration.
    permissions (id) {
        id -> Int8,
        entity_type -> Varchar,
        codename -> Varchar,
        name -> Varchar,
    }
}

diesel::table! {
    auth_groups (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    group_permissions (group_id, permission_id) {
        group_id -> Int8,
        permission_id -> Int8,
    }
}

diesel::table! {
    user_groups (user_id, group_id) {
        user_id -> Uuid,
        group_id -> Int8,
    }
}

diesel::table! {
    /// At most one live token per user; only the SHA-256 fingerprint is kept.
    api_tokens (user_id) {
        user_id -> Uuid,
        fingerprint -> Varchar,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    authors (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    books (id) {
        id -> Int8,
        title -> Varchar,
        author_id -> Int8,
        publication_year -> Nullable<Int4>,
    }
}

diesel::table! {
    libraries (id) {
        id -> Int8,
        name -> Varchar,
    }
}

diesel::table! {
    library_books (library_id, book_id) {
        library_id -> Int8,
        book_id -> Int8,
    }
}

diesel::table! {
    /// `library_id` is unique: a library has at most one librarian.
    librarians (id) {
        id -> Int8,
        name -> Varchar,
        library_id -> Int8,
    }
}

diesel::joinable!(user_profiles -> users (user_id));
diesel::joinable!(group_permissions -> auth_groups (group_id));
diesel::joinable!(group_permissions -> permissions (permission_id));
diesel::joinable!(user_groups -> auth_groups (group_id));
diesel::joinable!(user_groups -> users (user_id));
diesel::joinable!(api_tokens -> users (user_id));
diesel::joinable!(books -> authors (author_id));
diesel::joinable!(library_books -> books (book_id));
diesel::joinable!(library_books -> libraries (library_id));
diesel::joinable!(librarians -> libraries (library_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    user_profiles,
    permissions,
    auth_groups,
    group_permissions,
    user_groups,
    api_tokens,
    authors,
    books,
    libraries,
    library_books,
    librarians,
);
