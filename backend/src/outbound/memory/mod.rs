//! In-memory adapter implementing every repository port.
//!
//! All tables sit behind one mutex, so a user write and its profile hook are
//! applied atomically. Used by tests and by servers started without a
//! database URL.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::ports::{
    CatalogueRepository, CatalogueRepositoryError, GroupRepository, GroupRepositoryError,
    StoredCredentials, TokenRepository, TokenRepositoryError, UserPersistenceError,
    UserRepository,
};
use crate::domain::{
    Author, AuthorId, Book, BookDraft, BookFilter, BookId, CapabilitySet, EntityType, GroupName,
    Librarian, LibrarianDraft, LibrarianId, Library, LibraryDetail, LibraryDraft, LibraryId,
    LoginIdentifier, NewAccount, PasswordDigest, Permission, PermissionRegistry,
    ProvisioningOutcome, Role, TokenFingerprint, User, UserId, UserProfile, UserWrite,
    UserWriteHook,
};

struct UserRecord {
    user: User,
    password: PasswordDigest,
}

struct BookRecord {
    title: String,
    author_id: AuthorId,
    publication_year: Option<i32>,
}

#[derive(Default)]
struct Sequence(i64);

impl Sequence {
    fn next(&mut self) -> i64 {
        self.0 += 1;
        self.0
    }
}

#[derive(Default)]
struct Tables {
    users: BTreeMap<UserId, UserRecord>,
    profiles: HashMap<UserId, UserProfile>,
    registry: PermissionRegistry,
    groups: BTreeMap<GroupName, CapabilitySet>,
    memberships: BTreeSet<(GroupName, UserId)>,
    tokens: HashMap<UserId, TokenFingerprint>,
    authors: BTreeMap<AuthorId, Author>,
    books: BTreeMap<BookId, BookRecord>,
    libraries: BTreeMap<LibraryId, Library>,
    holdings: BTreeSet<(LibraryId, BookId)>,
    librarians: BTreeMap<LibraryId, Librarian>,
    author_ids: Sequence,
    book_ids: Sequence,
    library_ids: Sequence,
    librarian_ids: Sequence,
}

impl Tables {
    fn duplicate_field(&self, user: &User) -> Option<&'static str> {
        let others = self
            .users
            .values()
            .filter(|record| record.user.id() != user.id());
        let mut duplicate = None;
        for record in others {
            if record.user.username() == user.username() {
                return Some("username");
            }
            if record.user.email() == user.email() {
                duplicate = Some("email");
            }
        }
        duplicate
    }

    fn sync_profile(
        &mut self,
        user: &User,
        write: UserWrite,
        hook: &dyn UserWriteHook,
    ) -> UserProfile {
        let existing = self.profiles.get(user.id()).cloned();
        let profile = hook.after_user_write(user, write, existing).into_profile();
        self.profiles.insert(user.id().clone(), profile.clone());
        profile
    }

    fn book(&self, id: BookId) -> Option<Book> {
        let record = self.books.get(&id)?;
        let author = self.authors.get(&record.author_id)?.clone();
        Some(Book {
            id,
            title: record.title.clone(),
            author,
            publication_year: record.publication_year,
        })
    }

    fn author_named(&mut self, name: &str) -> AuthorId {
        if let Some(author) = self.authors.values().find(|author| author.name == name) {
            return author.id;
        }
        let id = AuthorId::new(self.author_ids.next());
        self.authors.insert(
            id,
            Author {
                id,
                name: name.to_owned(),
            },
        );
        id
    }

    fn library_detail(&self, id: LibraryId) -> Option<LibraryDetail> {
        let library = self.libraries.get(&id)?.clone();
        let mut books: Vec<Book> = self
            .holdings
            .iter()
            .filter(|(library_id, _)| *library_id == id)
            .filter_map(|(_, book_id)| self.book(*book_id))
            .collect();
        sort_books(&mut books);
        Some(LibraryDetail {
            library,
            books,
            librarian: self.librarians.get(&id).cloned(),
        })
    }
}

fn sort_books(books: &mut [Book]) {
    books.sort_by(|left, right| {
        left.title
            .cmp(&right.title)
            .then_with(|| left.id.cmp(&right.id))
    });
}

fn missing_library(id: LibraryId) -> CatalogueRepositoryError {
    CatalogueRepositoryError::missing_reference(format!("library {id} not found"))
}

/// Process-local store backing every repository port.
///
/// # Examples
/// ```
/// use backend::domain::ports::CatalogueRepository;
/// use backend::domain::BookFilter;
/// use backend::outbound::memory::InMemoryStore;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let store = InMemoryStore::new();
/// assert!(store.list_books(&BookFilter::default()).await.unwrap().is_empty());
/// # });
/// ```
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Create an empty store with the four Book capabilities registered.
    pub fn new() -> Self {
        Self::with_registry(PermissionRegistry::declared())
    }

    /// Create an empty store with a custom capability registry.
    pub fn with_registry(registry: PermissionRegistry) -> Self {
        Self {
            tables: Mutex::new(Tables {
                registry,
                ..Tables::default()
            }),
        }
    }

    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn create_user(
        &self,
        account: &NewAccount,
        hook: &(dyn UserWriteHook + 'static),
    ) -> Result<UserProfile, UserPersistenceError> {
        let mut tables = self.tables();
        if let Some(field) = tables.duplicate_field(&account.user) {
            return Err(UserPersistenceError::duplicate(field));
        }
        if tables.users.contains_key(account.user.id()) {
            return Err(UserPersistenceError::duplicate("id"));
        }
        tables.users.insert(
            account.user.id().clone(),
            UserRecord {
                user: account.user.clone(),
                password: account.password.clone(),
            },
        );
        Ok(tables.sync_profile(&account.user, UserWrite::Created, hook))
    }

    async fn update_user(
        &self,
        user: &User,
        hook: &(dyn UserWriteHook + 'static),
    ) -> Result<UserProfile, UserPersistenceError> {
        let mut tables = self.tables();
        if !tables.users.contains_key(user.id()) {
            return Err(UserPersistenceError::unknown_user(user.id().to_string()));
        }
        if let Some(field) = tables.duplicate_field(user) {
            return Err(UserPersistenceError::duplicate(field));
        }
        if let Some(record) = tables.users.get_mut(user.id()) {
            record.user = user.clone();
        }
        Ok(tables.sync_profile(user, UserWrite::Updated, hook))
    }

    async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, UserPersistenceError> {
        Ok(self.tables().users.get(id).map(|record| record.user.clone()))
    }

    async fn find_credentials(
        &self,
        login: &LoginIdentifier,
    ) -> Result<Option<StoredCredentials>, UserPersistenceError> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|record| match login {
                LoginIdentifier::Email(email) => record.user.email() == email,
                LoginIdentifier::Username(username) => record.user.username() == username,
            })
            .map(|record| StoredCredentials {
                user: record.user.clone(),
                password: record.password.clone(),
            }))
    }

    async fn find_profile(&self, id: &UserId) -> Result<Option<UserProfile>, UserPersistenceError> {
        Ok(self.tables().profiles.get(id).cloned())
    }

    async fn set_role(&self, id: &UserId, role: Role) -> Result<UserProfile, UserPersistenceError> {
        let mut tables = self.tables();
        if !tables.users.contains_key(id) {
            return Err(UserPersistenceError::unknown_user(id.to_string()));
        }
        let profile = tables
            .profiles
            .remove(id)
            .unwrap_or_else(|| UserProfile::member(id.clone()))
            .with_role(role);
        tables.profiles.insert(id.clone(), profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl GroupRepository for InMemoryStore {
    async fn registered_permissions(
        &self,
        entity: EntityType,
    ) -> Result<PermissionRegistry, GroupRepositoryError> {
        let registered = self.tables().registry.capabilities(entity);
        Ok(PermissionRegistry::from_codenames(
            entity,
            registered.codenames(),
        ))
    }

    async fn provision_group(
        &self,
        name: &GroupName,
        grants: &[Permission],
    ) -> Result<ProvisioningOutcome, GroupRepositoryError> {
        let granted: CapabilitySet = grants.iter().map(|grant| grant.capability).collect();
        let previous = self.tables().groups.insert(name.clone(), granted);
        Ok(if previous.is_some() {
            ProvisioningOutcome::Updated
        } else {
            ProvisioningOutcome::Created
        })
    }

    async fn group_grants(
        &self,
        name: &GroupName,
    ) -> Result<Option<CapabilitySet>, GroupRepositoryError> {
        Ok(self.tables().groups.get(name).cloned())
    }

    async fn add_member(
        &self,
        group: &GroupName,
        user: &UserId,
    ) -> Result<(), GroupRepositoryError> {
        let mut tables = self.tables();
        if !tables.groups.contains_key(group) {
            return Err(GroupRepositoryError::unknown_group(group.to_string()));
        }
        if !tables.users.contains_key(user) {
            return Err(GroupRepositoryError::unknown_user(user.to_string()));
        }
        tables.memberships.insert((group.clone(), user.clone()));
        Ok(())
    }

    async fn capabilities_for(&self, user: &UserId) -> Result<CapabilitySet, GroupRepositoryError> {
        let tables = self.tables();
        let mut held = CapabilitySet::empty();
        for (group, _) in tables.memberships.iter().filter(|(_, member)| member == user) {
            if let Some(grants) = tables.groups.get(group) {
                held.extend(grants.iter());
            }
        }
        Ok(held)
    }
}

#[async_trait]
impl TokenRepository for InMemoryStore {
    async fn replace_token(
        &self,
        user: &UserId,
        fingerprint: &TokenFingerprint,
    ) -> Result<(), TokenRepositoryError> {
        self.tables()
            .tokens
            .insert(user.clone(), fingerprint.clone());
        Ok(())
    }

    async fn find_user_by_token(
        &self,
        fingerprint: &TokenFingerprint,
    ) -> Result<Option<UserId>, TokenRepositoryError> {
        Ok(self
            .tables()
            .tokens
            .iter()
            .find(|(_, stored)| *stored == fingerprint)
            .map(|(user, _)| user.clone()))
    }
}

#[async_trait]
impl CatalogueRepository for InMemoryStore {
    async fn list_books(&self, filter: &BookFilter) -> Result<Vec<Book>, CatalogueRepositoryError> {
        let tables = self.tables();
        let mut books: Vec<Book> = tables
            .books
            .keys()
            .filter_map(|id| tables.book(*id))
            .filter(|book| filter.matches(&book.title, &book.author.name))
            .collect();
        sort_books(&mut books);
        Ok(books)
    }

    async fn find_book(&self, id: BookId) -> Result<Option<Book>, CatalogueRepositoryError> {
        Ok(self.tables().book(id))
    }

    async fn insert_book(&self, draft: &BookDraft) -> Result<Book, CatalogueRepositoryError> {
        let mut tables = self.tables();
        let author_id = tables.author_named(&draft.author_name);
        let id = BookId::new(tables.book_ids.next());
        tables.books.insert(
            id,
            BookRecord {
                title: draft.title.clone(),
                author_id,
                publication_year: draft.publication_year,
            },
        );
        tables
            .book(id)
            .ok_or_else(|| CatalogueRepositoryError::query(format!("book {id} vanished")))
    }

    async fn update_book(
        &self,
        id: BookId,
        draft: &BookDraft,
    ) -> Result<Option<Book>, CatalogueRepositoryError> {
        let mut tables = self.tables();
        if !tables.books.contains_key(&id) {
            return Ok(None);
        }
        let author_id = tables.author_named(&draft.author_name);
        if let Some(record) = tables.books.get_mut(&id) {
            record.title.clone_from(&draft.title);
            record.author_id = author_id;
            record.publication_year = draft.publication_year;
        }
        Ok(tables.book(id))
    }

    async fn delete_book(&self, id: BookId) -> Result<bool, CatalogueRepositoryError> {
        let mut tables = self.tables();
        if tables.books.remove(&id).is_none() {
            return Ok(false);
        }
        tables.holdings.retain(|(_, book)| *book != id);
        Ok(true)
    }

    async fn count_books(&self) -> Result<u64, CatalogueRepositoryError> {
        Ok(self.tables().books.len() as u64)
    }

    async fn insert_library(
        &self,
        draft: &LibraryDraft,
    ) -> Result<Library, CatalogueRepositoryError> {
        let mut tables = self.tables();
        let library = Library {
            id: LibraryId::new(tables.library_ids.next()),
            name: draft.name.clone(),
        };
        tables.libraries.insert(library.id, library.clone());
        Ok(library)
    }

    async fn find_library(
        &self,
        id: LibraryId,
    ) -> Result<Option<LibraryDetail>, CatalogueRepositoryError> {
        Ok(self.tables().library_detail(id))
    }

    async fn attach_book(
        &self,
        library: LibraryId,
        book: BookId,
    ) -> Result<LibraryDetail, CatalogueRepositoryError> {
        let mut tables = self.tables();
        if !tables.libraries.contains_key(&library) {
            return Err(missing_library(library));
        }
        if !tables.books.contains_key(&book) {
            return Err(CatalogueRepositoryError::missing_reference(format!(
                "book {book} not found"
            )));
        }
        tables.holdings.insert((library, book));
        tables
            .library_detail(library)
            .ok_or_else(|| missing_library(library))
    }

    async fn assign_librarian(
        &self,
        library: LibraryId,
        draft: &LibrarianDraft,
    ) -> Result<Librarian, CatalogueRepositoryError> {
        let mut tables = self.tables();
        if !tables.libraries.contains_key(&library) {
            return Err(missing_library(library));
        }
        if tables.librarians.contains_key(&library) {
            return Err(CatalogueRepositoryError::conflict(format!(
                "library {library} already has a librarian"
            )));
        }
        let librarian = Librarian {
            id: LibrarianId::new(tables.librarian_ids.next()),
            name: draft.name.clone(),
            library_id: library,
        };
        tables.librarians.insert(library, librarian.clone());
        Ok(librarian)
    }
}
