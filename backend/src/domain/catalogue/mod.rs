//! Catalogue entities: authors, books, libraries and librarians.
//!
//! Entities returned from stores are always valid; inbound data goes through
//! the forms in [`validation`] first and only reaches persistence as a draft.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

mod validation;

pub use validation::{
    AUTHOR_NAME_MAX, BookDraft, BookFilter, BookForm, LIBRARIAN_NAME_MAX, LIBRARY_NAME_MAX,
    LibrarianDraft, LibrarianForm, LibraryDraft, LibraryForm, MIN_NAME_LENGTH,
    MIN_PUBLICATION_YEAR, SEARCH_QUERY_MAX, TITLE_MAX, publication_year_ceiling,
};

macro_rules! catalogue_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(raw: i64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(value: i64) -> Self {
                Self(value)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

catalogue_id!(
    /// Author primary key.
    AuthorId
);
catalogue_id!(
    /// Book primary key.
    BookId
);
catalogue_id!(
    /// Library primary key.
    LibraryId
);
catalogue_id!(
    /// Librarian primary key.
    LibrarianId
);

/// Book author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[schema(value_type = i64, example = 1)]
    pub id: AuthorId,
    #[schema(example = "George Orwell")]
    pub name: String,
}

/// Catalogued book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[schema(value_type = i64, example = 1)]
    pub id: BookId,
    #[schema(example = "1984")]
    pub title: String,
    pub author: Author,
    #[schema(example = 1949)]
    pub publication_year: Option<i32>,
}

/// Library holding a set of books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Library {
    #[schema(value_type = i64, example = 1)]
    pub id: LibraryId,
    #[schema(example = "Central Library")]
    pub name: String,
}

/// The single librarian assigned to a library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Librarian {
    #[schema(value_type = i64, example = 1)]
    pub id: LibrarianId,
    #[schema(example = "Mrs. Pince")]
    pub name: String,
    #[schema(value_type = i64, example = 1)]
    pub library_id: LibraryId,
}

/// Library with its holdings and librarian.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryDetail {
    #[serde(flatten)]
    pub library: Library,
    pub books: Vec<Book>,
    pub librarian: Option<Librarian>,
}
