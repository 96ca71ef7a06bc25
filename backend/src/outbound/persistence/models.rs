//! Internal Diesel row structs for database operations.
//!
//! These types are implementation details of the persistence layer and must
//! never be exposed to the domain. Conversions into domain types revalidate
//! the stored values.

use chrono::NaiveDate;
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{
    AccountFlags, Author, AuthorId, Book, BookId, EmailAddress, Librarian, LibrarianId, Library,
    LibraryId, ProfilePhoto, Role, UnknownRole, User, UserId, UserProfile, UserValidationError,
    Username,
};

use super::schema::{
    api_tokens, authors, books, group_permissions, librarians, libraries, library_books,
    user_groups, user_profiles, users,
};

// ---------------------------------------------------------------------------
// Accounts
// ---------------------------------------------------------------------------

/// Row struct for reading from the users table.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_photo: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl UserRow {
    /// Rebuild the domain user, revalidating stored fields.
    pub fn to_user(&self) -> Result<User, UserValidationError> {
        let profile_photo = self
            .profile_photo
            .as_deref()
            .map(ProfilePhoto::new)
            .transpose()?;
        Ok(User::new(
            UserId::from(self.id),
            Username::new(&self.username)?,
            EmailAddress::new(&self.email)?,
        )
        .with_date_of_birth(self.date_of_birth)
        .with_profile_photo(profile_photo)
        .with_flags(AccountFlags {
            is_active: self.is_active,
            is_staff: self.is_staff,
            is_superuser: self.is_superuser,
        }))
    }
}

/// Insertable struct for new accounts.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = users)]
pub(crate) struct NewUserRow<'a> {
    pub id: Uuid,
    pub username: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_photo: Option<&'a str>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

/// Changeset applied by account updates. `None` clears nullable columns.
#[derive(Debug, Clone, AsChangeset)]
#[diesel(table_name = users)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct UserUpdate<'a> {
    pub username: &'a str,
    pub email: &'a str,
    pub date_of_birth: Option<NaiveDate>,
    pub profile_photo: Option<&'a str>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl<'a> UserUpdate<'a> {
    pub fn from_user(user: &'a User) -> Self {
        let flags = user.flags();
        Self {
            username: user.username().as_ref(),
            email: user.email().as_ref(),
            date_of_birth: user.date_of_birth(),
            profile_photo: user.profile_photo().map(AsRef::as_ref),
            is_active: flags.is_active,
            is_staff: flags.is_staff,
            is_superuser: flags.is_superuser,
        }
    }
}

/// Profile row; read, inserted and upserted as a whole.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = user_profiles)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct ProfileRow {
    pub user_id: Uuid,
    pub role: String,
}

impl ProfileRow {
    pub fn from_profile(profile: &UserProfile) -> Self {
        Self {
            user_id: *profile.user_id().as_uuid(),
            role: profile.role().as_str().to_owned(),
        }
    }

    pub fn to_profile(&self) -> Result<UserProfile, UnknownRole> {
        let role: Role = self.role.parse()?;
        Ok(UserProfile::new(UserId::from(self.user_id), role))
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = api_tokens)]
pub(crate) struct NewTokenRow<'a> {
    pub user_id: Uuid,
    pub fingerprint: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = group_permissions)]
pub(crate) struct NewGroupPermissionRow {
    pub group_id: i64,
    pub permission_id: i64,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = user_groups)]
pub(crate) struct NewUserGroupRow {
    pub user_id: Uuid,
    pub group_id: i64,
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = authors)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct AuthorRow {
    pub id: i64,
    pub name: String,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Self {
            id: AuthorId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = authors)]
pub(crate) struct NewAuthorRow<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = books)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct BookRow {
    pub id: i64,
    pub title: String,
    pub author_id: i64,
    pub publication_year: Option<i32>,
}

impl BookRow {
    pub fn into_book(self, author: AuthorRow) -> Book {
        Book {
            id: BookId::new(self.id),
            title: self.title,
            author: author.into(),
            publication_year: self.publication_year,
        }
    }
}

/// Book columns written on insert and update.
#[derive(Debug, Clone, Insertable, AsChangeset)]
#[diesel(table_name = books)]
#[diesel(treat_none_as_null = true)]
pub(crate) struct BookValues<'a> {
    pub title: &'a str,
    pub author_id: i64,
    pub publication_year: Option<i32>,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = libraries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LibraryRow {
    pub id: i64,
    pub name: String,
}

impl From<LibraryRow> for Library {
    fn from(row: LibraryRow) -> Self {
        Self {
            id: LibraryId::new(row.id),
            name: row.name,
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = libraries)]
pub(crate) struct NewLibraryRow<'a> {
    pub name: &'a str,
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = library_books)]
pub(crate) struct NewHoldingRow {
    pub library_id: i64,
    pub book_id: i64,
}

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = librarians)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub(crate) struct LibrarianRow {
    pub id: i64,
    pub name: String,
    pub library_id: i64,
}

impl From<LibrarianRow> for Librarian {
    fn from(row: LibrarianRow) -> Self {
        Self {
            id: LibrarianId::new(row.id),
            name: row.name,
            library_id: LibraryId::new(row.library_id),
        }
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = librarians)]
pub(crate) struct NewLibrarianRow<'a> {
    pub name: &'a str,
    pub library_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn user_row() -> UserRow {
        UserRow {
            id: Uuid::nil(),
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            password_hash: String::new(),
            date_of_birth: NaiveDate::from_ymd_opt(1815, 12, 10),
            profile_photo: Some("profile_photos/ada.png".to_owned()),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }

    #[rstest]
    fn stored_user_converts_with_optional_fields() {
        let user = user_row().to_user().expect("valid row");
        assert_eq!(user.username().as_ref(), "ada");
        assert_eq!(user.date_of_birth(), NaiveDate::from_ymd_opt(1815, 12, 10));
        assert_eq!(
            user.profile_photo().map(AsRef::as_ref),
            Some("profile_photos/ada.png")
        );
        assert!(user.is_active());
    }

    #[rstest]
    fn corrupted_username_is_rejected() {
        let row = UserRow {
            username: "has spaces".to_owned(),
            ..user_row()
        };
        assert!(row.to_user().is_err());
    }

    #[rstest]
    #[case("Member", Some(Role::Member))]
    #[case("Librarian", Some(Role::Librarian))]
    #[case("Janitor", None)]
    fn profile_role_round_trips_through_text(#[case] stored: &str, #[case] expected: Option<Role>) {
        let row = ProfileRow {
            user_id: Uuid::nil(),
            role: stored.to_owned(),
        };
        assert_eq!(row.to_profile().ok().map(|profile| profile.role()), expected);
    }
}
