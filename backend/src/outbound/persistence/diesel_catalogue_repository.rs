//! PostgreSQL-backed `CatalogueRepository`.
//!
//! Book filters are pushed down into SQL. Authors are upserted by name so
//! concurrent inserts naming the same author converge on one row.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::result::Error as DieselError;
use diesel::upsert::excluded;
use diesel_async::scoped_futures::ScopedFutureExt;
use diesel_async::{AsyncConnection, AsyncPgConnection, RunQueryDsl};

use crate::domain::ports::{CatalogueRepository, CatalogueRepositoryError};
use crate::domain::{
    Book, BookDraft, BookFilter, BookId, Librarian, LibrarianDraft, Library, LibraryDetail,
    LibraryDraft, LibraryId,
};

use super::diesel_error_mapping::{DieselFailure, classify_diesel_error, pool_error_message};
use super::models::{
    AuthorRow, BookRow, BookValues, LibrarianRow, LibraryRow, NewAuthorRow, NewHoldingRow,
    NewLibrarianRow, NewLibraryRow,
};
use super::pool::{DbPool, PoolError};
use super::schema::{authors, books, librarians, libraries, library_books};

/// Diesel implementation of [`CatalogueRepository`].
#[derive(Clone)]
pub struct DieselCatalogueRepository {
    pool: DbPool,
}

impl DieselCatalogueRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn map_pool_error(error: PoolError) -> CatalogueRepositoryError {
    CatalogueRepositoryError::connection(pool_error_message(error))
}

fn map_failure(failure: DieselFailure) -> CatalogueRepositoryError {
    match failure {
        DieselFailure::Connection(message) => CatalogueRepositoryError::connection(message),
        DieselFailure::Query(message) => CatalogueRepositoryError::query(message),
        DieselFailure::UniqueViolation(_) => {
            CatalogueRepositoryError::conflict("catalogue record already exists")
        }
        DieselFailure::ForeignKeyViolation(_) => {
            CatalogueRepositoryError::missing_reference("referenced catalogue record not found")
        }
    }
}

fn map_diesel_error(error: DieselError) -> CatalogueRepositoryError {
    map_failure(classify_diesel_error(error))
}

fn missing_library(id: LibraryId) -> CatalogueRepositoryError {
    CatalogueRepositoryError::missing_reference(format!("library {id} not found"))
}

/// Escape `LIKE` metacharacters so user search text matches literally.
fn like_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for ch in search.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

async fn upsert_author(conn: &mut AsyncPgConnection, name: &str) -> QueryResult<AuthorRow> {
    diesel::insert_into(authors::table)
        .values(&NewAuthorRow { name })
        .on_conflict(authors::name)
        .do_update()
        .set(authors::name.eq(excluded(authors::name)))
        .returning(AuthorRow::as_returning())
        .get_result(conn)
        .await
}

async fn load_book(conn: &mut AsyncPgConnection, id: BookId) -> QueryResult<Option<Book>> {
    let row = books::table
        .inner_join(authors::table)
        .filter(books::id.eq(id.get()))
        .select((BookRow::as_select(), AuthorRow::as_select()))
        .first::<(BookRow, AuthorRow)>(conn)
        .await
        .optional()?;
    Ok(row.map(|(book, author)| book.into_book(author)))
}

async fn load_library(
    conn: &mut AsyncPgConnection,
    id: LibraryId,
) -> QueryResult<Option<LibraryDetail>> {
    let Some(library) = libraries::table
        .find(id.get())
        .select(LibraryRow::as_select())
        .first::<LibraryRow>(conn)
        .await
        .optional()?
    else {
        return Ok(None);
    };
    let holdings: Vec<(BookRow, AuthorRow)> = books::table
        .inner_join(authors::table)
        .inner_join(library_books::table)
        .filter(library_books::library_id.eq(id.get()))
        .select((BookRow::as_select(), AuthorRow::as_select()))
        .order_by((books::title, books::id))
        .load(conn)
        .await?;
    let librarian = librarians::table
        .filter(librarians::library_id.eq(id.get()))
        .select(LibrarianRow::as_select())
        .first::<LibrarianRow>(conn)
        .await
        .optional()?;
    Ok(Some(LibraryDetail {
        library: library.into(),
        books: holdings
            .into_iter()
            .map(|(book, author)| book.into_book(author))
            .collect(),
        librarian: librarian.map(Librarian::from),
    }))
}

#[async_trait]
impl CatalogueRepository for DieselCatalogueRepository {
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let mut query = books::table
            .inner_join(authors::table)
            .select((BookRow::as_select(), AuthorRow::as_select()))
            .order_by((books::title, books::id))
            .into_boxed();
        if let Some(author) = filter.author() {
            query = query.filter(authors::name.eq(author.to_owned()));
        }
        if let Some(search) = filter.search() {
            let pattern = like_pattern(search);
            query = query.filter(
                books::title
                    .ilike(pattern.clone())
                    .or(authors::name.ilike(pattern)),
            );
        }
        let rows: Vec<(BookRow, AuthorRow)> =
            query.load(&mut conn).await.map_err(map_diesel_error)?;
        Ok(rows
            .into_iter()
            .map(|(book, author)| book.into_book(author))
            .collect())
    }

    async fn find_book(&self, id: BookId) -> Result<Option<Book>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_book(&mut conn, id).await.map_err(map_diesel_error)
    }

    async fn insert_book(&self, draft: &BookDraft) -> Result<Book, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let author = upsert_author(conn, &draft.author_name).await?;
                let book = diesel::insert_into(books::table)
                    .values(&BookValues {
                        title: &draft.title,
                        author_id: author.id,
                        publication_year: draft.publication_year,
                    })
                    .returning(BookRow::as_returning())
                    .get_result::<BookRow>(conn)
                    .await?;
                Ok(book.into_book(author))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
    ) -> Result<Option<Book>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        conn.transaction(|conn| {
            async move {
                let author = upsert_author(conn, &draft.author_name).await?;
                let book = diesel::update(books::table.find(id.get()))
                    .set(&BookValues {
                        title: &draft.title,
                        author_id: author.id,
                        publication_year: draft.publication_year,
                    })
                    .returning(BookRow::as_returning())
                    .get_result::<BookRow>(conn)
                    .await
                    .optional()?;
                Ok(book.map(|row| row.into_book(author)))
            }
            .scope_boxed()
        })
        .await
        .map_err(map_diesel_error)
    }

    async fn delete_book(&self, id: BookId) -> Result<bool, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let deleted = diesel::delete(books::table.find(id.get()))
            .execute(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(deleted > 0)
    }

    async fn count_books(&self) -> Result<u64, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let count: i64 = books::table
            .count()
            .get_result(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        u64::try_from(count)
            .map_err(|_| CatalogueRepositoryError::query("book count out of range"))
    }

    async fn insert_library(
        &self,
        draft: &LibraryDraft,
    ) -> Result<Library, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(libraries::table)
            .values(&NewLibraryRow { name: &draft.name })
            .returning(LibraryRow::as_returning())
            .get_result::<LibraryRow>(&mut conn)
            .await
            .map_err(map_diesel_error)?;
        Ok(row.into())
    }

    async fn find_library(
        &self,
        id: LibraryId,
    ) -> Result<Option<LibraryDetail>, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        load_library(&mut conn, id).await.map_err(map_diesel_error)
    }

    async fn attach_book(
        &self,
        library: LibraryId,
        book: BookId,
    ) -> Result<LibraryDetail, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        diesel::insert_into(library_books::table)
            .values(&NewHoldingRow {
                library_id: library.get(),
                book_id: book.get(),
            })
            .on_conflict_do_nothing()
            .execute(&mut conn)
            .await
            .map_err(|err| match classify_diesel_error(err) {
                DieselFailure::ForeignKeyViolation(Some(constraint))
                    if constraint.contains("book_id") =>
                {
                    CatalogueRepositoryError::missing_reference(format!("book {book} not found"))
                }
                DieselFailure::ForeignKeyViolation(_) => missing_library(library),
                other => map_failure(other),
            })?;
        load_library(&mut conn, library)
            .await
            .map_err(map_diesel_error)?
            .ok_or_else(|| missing_library(library))
    }

    async fn assign_librarian(
        &self,
        library: LibraryId,
        draft: &LibrarianDraft,
    ) -> Result<Librarian, CatalogueRepositoryError> {
        let mut conn = self.pool.get().await.map_err(map_pool_error)?;
        let row = diesel::insert_into(librarians::table)
            .values(&NewLibrarianRow {
                name: &draft.name,
                library_id: library.get(),
            })
            .returning(LibrarianRow::as_returning())
            .get_result::<LibrarianRow>(&mut conn)
            .await
            .map_err(|err| match classify_diesel_error(err) {
                DieselFailure::UniqueViolation(_) => CatalogueRepositoryError::conflict(format!(
                    "library {library} already has a librarian"
                )),
                DieselFailure::ForeignKeyViolation(_) => missing_library(library),
                other => map_failure(other),
            })?;
        Ok(row.into())
    }
}
