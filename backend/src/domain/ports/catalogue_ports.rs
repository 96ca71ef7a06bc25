//! Driving ports for gated catalogue reads and writes.
//!
//! Every call takes the acting [`Actor`]; implementations check the gate
//! first, validate second and touch persistence last.

use async_trait::async_trait;

use crate::domain::{
    Actor, Book, BookFilter, BookForm, BookId, Error, Librarian, LibrarianForm, Library,
    LibraryDetail, LibraryForm, LibraryId,
};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueQuery: Send + Sync {
    async fn list_books(&self, actor: &Actor, filter: &BookFilter) -> Result<Vec<Book>, Error>;

    async fn get_book(&self, actor: &Actor, id: BookId) -> Result<Book, Error>;

    async fn get_library(&self, actor: &Actor, id: LibraryId) -> Result<LibraryDetail, Error>;
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogueCommand: Send + Sync {
    async fn create_book(&self, actor: &Actor, form: BookForm) -> Result<Book, Error>;

    async fn update_book(&self, actor: &Actor, id: BookId, form: BookForm) -> Result<Book, Error>;

    async fn delete_book(&self, actor: &Actor, id: BookId) -> Result<(), Error>;

    async fn create_library(&self, actor: &Actor, form: LibraryForm) -> Result<Library, Error>;

    async fn attach_book(
        &self,
        actor: &Actor,
        library: LibraryId,
        book: BookId,
    ) -> Result<LibraryDetail, Error>;

    async fn assign_librarian(
        &self,
        actor: &Actor,
        library: LibraryId,
        form: LibrarianForm,
    ) -> Result<Librarian, Error>;
}
