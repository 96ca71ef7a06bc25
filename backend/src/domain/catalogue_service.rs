//! Gated catalogue service.
//!
//! Each operation runs in three strict stages: the access gate, form
//! validation, then the repository call. A rejected request never reaches
//! persistence.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::info;

use crate::domain::ports::{
    CatalogueCommand, CatalogueQuery, CatalogueRepository, CatalogueRepositoryError,
};
use crate::domain::{
    Actor, Book, BookFilter, BookForm, BookId, CatalogueOperation, Error, Librarian,
    LibrarianForm, Library, LibraryDetail, LibraryForm, LibraryId, publication_year_ceiling,
};

fn map_catalogue_error(error: CatalogueRepositoryError) -> Error {
    match error {
        CatalogueRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("catalogue repository unavailable: {message}"))
        }
        CatalogueRepositoryError::Query { message } => {
            Error::internal(format!("catalogue repository error: {message}"))
        }
        CatalogueRepositoryError::Conflict { message } => Error::conflict(message),
        CatalogueRepositoryError::MissingReference { message } => Error::not_found(message),
    }
}

fn book_not_found(id: BookId) -> Error {
    Error::not_found(format!("book {id} not found"))
}

/// Catalogue service implementing [`CatalogueQuery`] and [`CatalogueCommand`].
#[derive(Clone)]
pub struct CatalogueService<C> {
    repo: Arc<C>,
    clock: Arc<dyn Clock>,
}

impl<C> CatalogueService<C> {
    /// Create a service; `clock` supplies the current year for validation.
    pub fn new(repo: Arc<C>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    fn max_publication_year(&self) -> i32 {
        publication_year_ceiling(self.clock.as_ref())
    }
}

#[async_trait]
impl<C> CatalogueQuery for CatalogueService<C>
where
    C: CatalogueRepository,
{
    async fn list_books(&self, actor: &Actor, filter: &BookFilter) -> Result<Vec<Book>, Error> {
        actor.authorize(CatalogueOperation::ListBooks)?;
        self.repo
            .list_books(filter)
            .await
            .map_err(map_catalogue_error)
    }

    async fn get_book(&self, actor: &Actor, id: BookId) -> Result<Book, Error> {
        actor.authorize(CatalogueOperation::ViewBook)?;
        self.repo
            .find_book(id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| book_not_found(id))
    }

    async fn get_library(&self, actor: &Actor, id: LibraryId) -> Result<LibraryDetail, Error> {
        actor.authorize(CatalogueOperation::ViewLibrary)?;
        self.repo
            .find_library(id)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| Error::not_found(format!("library {id} not found")))
    }
}

#[async_trait]
impl<C> CatalogueCommand for CatalogueService<C>
where
    C: CatalogueRepository,
{
    async fn create_book(&self, actor: &Actor, form: BookForm) -> Result<Book, Error> {
        actor.authorize(CatalogueOperation::CreateBook)?;
        let draft = form.validate(self.max_publication_year())?;
        let book = self
            .repo
            .insert_book(&draft)
            .await
            .map_err(map_catalogue_error)?;
        info!(book_id = %book.id, "book created");
        Ok(book)
    }

    async fn update_book(&self, actor: &Actor, id: BookId, form: BookForm) -> Result<Book, Error> {
        actor.authorize(CatalogueOperation::EditBook)?;
        let draft = form.validate(self.max_publication_year())?;
        self.repo
            .update_book(id, &draft)
            .await
            .map_err(map_catalogue_error)?
            .ok_or_else(|| book_not_found(id))
    }

    async fn delete_book(&self, actor: &Actor, id: BookId) -> Result<(), Error> {
        actor.authorize(CatalogueOperation::DeleteBook)?;
        let deleted = self
            .repo
            .delete_book(id)
            .await
            .map_err(map_catalogue_error)?;
        if deleted {
            info!(book_id = %id, "book deleted");
            Ok(())
        } else {
            Err(book_not_found(id))
        }
    }

    async fn create_library(&self, actor: &Actor, form: LibraryForm) -> Result<Library, Error> {
        actor.authorize(CatalogueOperation::ManageLibrary)?;
        let draft = form.validate()?;
        self.repo
            .insert_library(&draft)
            .await
            .map_err(map_catalogue_error)
    }

    async fn attach_book(
        &self,
        actor: &Actor,
        library: LibraryId,
        book: BookId,
    ) -> Result<LibraryDetail, Error> {
        actor.authorize(CatalogueOperation::ManageLibrary)?;
        self.repo
            .attach_book(library, book)
            .await
            .map_err(map_catalogue_error)
    }

    async fn assign_librarian(
        &self,
        actor: &Actor,
        library: LibraryId,
        form: LibrarianForm,
    ) -> Result<Librarian, Error> {
        actor.authorize(CatalogueOperation::ManageLibrary)?;
        let draft = form.validate()?;
        self.repo
            .assign_librarian(library, &draft)
            .await
            .map_err(map_catalogue_error)
    }
}
