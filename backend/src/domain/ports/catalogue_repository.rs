//! Port for catalogue persistence: books, authors, libraries and librarians.
//!
//! Only validated drafts cross this boundary. Authors are created on demand
//! when a book names one that does not exist yet.

use async_trait::async_trait;

use crate::domain::{
    Book, BookDraft, BookFilter, BookId, Librarian, LibrarianDraft, Library, LibraryDetail,
    LibraryDraft, LibraryId,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by catalogue repository adapters.
    pub enum CatalogueRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "catalogue repository connection failed: {message}",
        /// Query failed during execution or row conversion.
        Query { message: String } =>
            "catalogue repository query failed: {message}",
        /// The write collides with existing state.
        Conflict { message: String } =>
            "catalogue write conflicts with existing data: {message}",
        /// A referenced record does not exist.
        MissingReference { message: String } =>
            "catalogue reference not found: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueRepository: Send + Sync {
    /// Books matching `filter`, ordered by title then id.
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, CatalogueRepositoryError>;

    async fn find_book(&self, id: BookId) -> Result<Option<Book>, CatalogueRepositoryError>;

    /// Insert a book, reusing the author with the same name if present.
    async fn insert_book(&self, draft: &BookDraft) -> Result<Book, CatalogueRepositoryError>;

    /// Replace a book's fields. `None` when the book does not exist.
    async fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
    ) -> Result<Option<Book>, CatalogueRepositoryError>;

    /// Delete a book and its library memberships. `false` when absent.
    async fn delete_book(&self, id: BookId) -> Result<bool, CatalogueRepositoryError>;

    async fn count_books(&self) -> Result<u64, CatalogueRepositoryError>;

    async fn insert_library(&self, draft: &LibraryDraft)
    -> Result<Library, CatalogueRepositoryError>;

    async fn find_library(
        &self,
        id: LibraryId,
    ) -> Result<Option<LibraryDetail>, CatalogueRepositoryError>;

    /// Add a book to a library's holdings. Attaching twice is a no-op.
    async fn attach_book(
        &self,
        library: LibraryId,
        book: BookId,
    ) -> Result<LibraryDetail, CatalogueRepositoryError>;

    /// Assign the library's librarian. Fails with `Conflict` when one is
    /// already assigned.
    async fn assign_librarian(
        &self,
        library: LibraryId,
        draft: &LibrarianDraft,
    ) -> Result<Librarian, CatalogueRepositoryError>;
}
