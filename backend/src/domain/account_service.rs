//! Account domain service.
//!
//! Implements login, registration, self-service updates, identity
//! resolution and API token issuance over the user, group and token ports.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::domain::ports::{
    AccountCommand, AccountQuery, AccountRegistration, GroupRepository, GroupRepositoryError,
    IdentityResolver, LoginService, TokenIssuer, TokenRepository, TokenRepositoryError,
    UserPersistenceError, UserRepository,
};
use crate::domain::{
    AccountUpdateForm, AccountView, ApiTokenKey, EmailAddress, Error, Identity, LoginCredentials,
    NewAccount, ProfileSync, RegistrationForm, User, UserId, UserProfile, UserWriteHook, Username,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

pub(crate) fn map_user_error(error: UserPersistenceError) -> Error {
    match error {
        UserPersistenceError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        UserPersistenceError::Query { message } => {
            Error::internal(format!("user repository error: {message}"))
        }
        UserPersistenceError::Duplicate { field } => Error::duplicate(&field),
        UserPersistenceError::UnknownUser { id } => Error::not_found(format!("user {id} not found")),
    }
}

pub(crate) fn map_group_error(error: GroupRepositoryError) -> Error {
    match error {
        GroupRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("group repository unavailable: {message}"))
        }
        GroupRepositoryError::Query { message } => {
            Error::internal(format!("group repository error: {message}"))
        }
        GroupRepositoryError::UnknownGroup { name } => {
            Error::not_found(format!("group {name} not found"))
        }
        GroupRepositoryError::UnknownUser { id } => Error::not_found(format!("user {id} not found")),
    }
}

fn map_token_error(error: TokenRepositoryError) -> Error {
    match error {
        TokenRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("token repository unavailable: {message}"))
        }
        TokenRepositoryError::Query { message } => {
            Error::internal(format!("token repository error: {message}"))
        }
    }
}

/// Account service implementing the account and identity driving ports.
#[derive(Clone)]
pub struct AccountService<U, G, T> {
    users: Arc<U>,
    groups: Arc<G>,
    tokens: Arc<T>,
    hook: Arc<dyn UserWriteHook>,
}

impl<U, G, T> AccountService<U, G, T> {
    /// Create a service that keeps profiles in sync with [`ProfileSync`].
    pub fn new(users: Arc<U>, groups: Arc<G>, tokens: Arc<T>) -> Self {
        Self::with_hook(users, groups, tokens, Arc::new(ProfileSync))
    }

    /// Create a service with a custom post-write hook.
    pub fn with_hook(
        users: Arc<U>,
        groups: Arc<G>,
        tokens: Arc<T>,
        hook: Arc<dyn UserWriteHook>,
    ) -> Self {
        Self {
            users,
            groups,
            tokens,
            hook,
        }
    }
}

impl<U, G, T> AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    /// Create an active staff superuser without any gate.
    ///
    /// Used by the administrative CLI to bootstrap the first staff account.
    pub async fn create_superuser(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AccountView, Error> {
        let username = Username::new(username).map_err(|err| Error::invalid_request(err.to_string()))?;
        let email = EmailAddress::new(email).map_err(|err| Error::invalid_request(err.to_string()))?;
        let account = NewAccount::new(User::superuser(UserId::random(), username, email), password)?;
        self.insert(account).await
    }

    async fn insert(&self, account: NewAccount) -> Result<AccountView, Error> {
        let profile = self
            .users
            .create_user(&account, self.hook.as_ref())
            .await
            .map_err(map_user_error)?;
        Ok(AccountView::new(account.user, &profile))
    }

    async fn load_user(&self, user_id: &UserId) -> Result<User, Error> {
        self.users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::not_found(format!("user {user_id} not found")))
    }

    async fn load_profile(&self, user_id: &UserId) -> Result<UserProfile, Error> {
        self.users
            .find_profile(user_id)
            .await
            .map_err(map_user_error)?
            .ok_or_else(|| Error::internal(format!("user {user_id} has no profile")))
    }
}

#[async_trait]
impl<U, G, T> LoginService for AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    async fn authenticate(&self, credentials: &LoginCredentials) -> Result<UserId, Error> {
        let mut stored = None;
        for login in credentials.identifiers() {
            stored = self
                .users
                .find_credentials(&login)
                .await
                .map_err(map_user_error)?;
            if stored.is_some() {
                break;
            }
        }
        match stored {
            Some(stored)
                if stored.user.is_active() && stored.password.verify(credentials.password()) =>
            {
                Ok(stored.user.id().clone())
            }
            _ => {
                debug!(login = credentials.username(), "login rejected");
                Err(Error::unauthorized(INVALID_CREDENTIALS))
            }
        }
    }
}

#[async_trait]
impl<U, G, T> AccountRegistration for AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    async fn register(&self, form: RegistrationForm) -> Result<AccountView, Error> {
        let account = form.validate()?;
        self.insert(account).await
    }
}

#[async_trait]
impl<U, G, T> AccountQuery for AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    async fn account(&self, user_id: &UserId) -> Result<AccountView, Error> {
        let user = self.load_user(user_id).await?;
        let profile = self.load_profile(user_id).await?;
        Ok(AccountView::new(user, &profile))
    }
}

#[async_trait]
impl<U, G, T> AccountCommand for AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    async fn update_account(
        &self,
        user_id: &UserId,
        form: AccountUpdateForm,
    ) -> Result<AccountView, Error> {
        let user = form.apply(self.load_user(user_id).await?)?;
        let profile = self
            .users
            .update_user(&user, self.hook.as_ref())
            .await
            .map_err(map_user_error)?;
        Ok(AccountView::new(user, &profile))
    }
}

#[async_trait]
impl<U, G, T> IdentityResolver for AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    async fn resolve_user(&self, user_id: &UserId) -> Result<Option<Identity>, Error> {
        let Some(user) = self.users.find_by_id(user_id).await.map_err(map_user_error)? else {
            return Ok(None);
        };
        let role = self
            .users
            .find_profile(user_id)
            .await
            .map_err(map_user_error)?
            .map(|profile| profile.role());
        let granted = self
            .groups
            .capabilities_for(user_id)
            .await
            .map_err(map_group_error)?;
        Ok(Some(Identity::new(
            user.id().clone(),
            user.flags(),
            role,
            granted,
        )))
    }

    async fn resolve_token(&self, key: &ApiTokenKey) -> Result<Option<Identity>, Error> {
        let owner = self
            .tokens
            .find_user_by_token(&key.fingerprint())
            .await
            .map_err(map_token_error)?;
        match owner {
            Some(user_id) => self.resolve_user(&user_id).await,
            None => Ok(None),
        }
    }
}

#[async_trait]
impl<U, G, T> TokenIssuer for AccountService<U, G, T>
where
    U: UserRepository,
    G: GroupRepository,
    T: TokenRepository,
{
    async fn issue_token(&self, credentials: &LoginCredentials) -> Result<ApiTokenKey, Error> {
        let user_id = self.authenticate(credentials).await?;
        let key = ApiTokenKey::generate();
        self.tokens
            .replace_token(&user_id, &key.fingerprint())
            .await
            .map_err(map_token_error)?;
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use crate::domain::ports::{
        MockGroupRepository, MockTokenRepository, MockUserRepository, StoredCredentials,
    };
    use crate::domain::{
        AccountFlags, Capability, CapabilitySet, ErrorCode, LoginIdentifier, PasswordDigest, Role,
    };
    use rstest::rstest;
    use zeroize::Zeroizing;

    type Service = AccountService<MockUserRepository, MockGroupRepository, MockTokenRepository>;

    fn make_service(
        users: MockUserRepository,
        groups: MockGroupRepository,
        tokens: MockTokenRepository,
    ) -> Service {
        AccountService::new(Arc::new(users), Arc::new(groups), Arc::new(tokens))
    }

    fn ada() -> User {
        User::try_from_strings("3fa85f64-5717-4562-b3fc-2c963f66afa6", "ada", "ada@example.com")
            .expect("valid user")
    }

    fn stored(user: User, password: &str) -> StoredCredentials {
        StoredCredentials {
            user,
            password: PasswordDigest::create(password).expect("hash"),
        }
    }

    fn creds(username: &str, password: &str) -> LoginCredentials {
        LoginCredentials::try_from_parts(username, password).expect("credential shape")
    }

    #[rstest]
    #[case("analytical", true, true)]
    #[case("wrong-password", true, false)]
    #[case("analytical", false, false)]
    #[tokio::test]
    async fn authenticate_requires_active_account_and_matching_password(
        #[case] password: &str,
        #[case] active: bool,
        #[case] should_succeed: bool,
    ) {
        let user = ada().with_flags(AccountFlags {
            is_active: active,
            ..AccountFlags::member()
        });
        let expected_id = user.id().clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .times(1)
            .return_once(move |_| Ok(Some(stored(user, "analytical"))));
        let service = make_service(users, MockGroupRepository::new(), MockTokenRepository::new());

        match (should_succeed, service.authenticate(&creds("ada", password)).await) {
            (true, Ok(id)) => assert_eq!(id, expected_id),
            (false, Err(err)) => assert_eq!(err.code(), ErrorCode::Unauthorized),
            (true, Err(err)) => panic!("expected success, got {err:?}"),
            (false, Ok(id)) => panic!("expected rejection, got {id}"),
        }
    }

    #[tokio::test]
    async fn authenticate_accepts_the_account_email() {
        let user = ada();
        let expected_id = user.id().clone();
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .withf(|login| {
                matches!(login, LoginIdentifier::Email(email) if email.as_ref() == "ada@example.com")
            })
            .times(1)
            .return_once(move |_| Ok(Some(stored(user, "analytical"))));
        let service = make_service(users, MockGroupRepository::new(), MockTokenRepository::new());

        let id = service
            .authenticate(&creds("ada@Example.com", "analytical"))
            .await
            .expect("email login");
        assert_eq!(id, expected_id);
    }

    #[tokio::test]
    async fn authenticate_falls_back_to_email_shaped_usernames() {
        let user = User::try_from_strings(
            "3fa85f64-5717-4562-b3fc-2c963f66afa6",
            "ada@home",
            "ada@example.com",
        )
        .expect("valid user");
        let mut sequence = mockall::Sequence::new();
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .withf(|login| matches!(login, LoginIdentifier::Email(_)))
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(|_| Ok(None));
        users
            .expect_find_credentials()
            .withf(|login| matches!(login, LoginIdentifier::Username(_)))
            .times(1)
            .in_sequence(&mut sequence)
            .return_once(move |_| Ok(Some(stored(user, "analytical"))));
        let service = make_service(users, MockGroupRepository::new(), MockTokenRepository::new());

        service
            .authenticate(&creds("ada@home", "analytical"))
            .await
            .expect("username login");
    }

    #[tokio::test]
    async fn register_rejects_invalid_form_before_persistence() {
        let mut users = MockUserRepository::new();
        users.expect_create_user().never();
        let service = make_service(users, MockGroupRepository::new(), MockTokenRepository::new());
        let form = RegistrationForm {
            username: "ada".into(),
            email: "not-an-email".into(),
            password: Zeroizing::new("analytical".into()),
            password_confirmation: Zeroizing::new("analytical".into()),
            ..RegistrationForm::default()
        };
        let err = service.register(form).await.expect_err("invalid form");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn register_maps_duplicate_to_conflict() {
        let mut users = MockUserRepository::new();
        users
            .expect_create_user()
            .times(1)
            .return_once(|_, _| Err(UserPersistenceError::duplicate("email")));
        let service = make_service(users, MockGroupRepository::new(), MockTokenRepository::new());
        let form = RegistrationForm {
            username: "ada".into(),
            email: "ada@example.com".into(),
            password: Zeroizing::new("analytical".into()),
            password_confirmation: Zeroizing::new("analytical".into()),
            ..RegistrationForm::default()
        };
        let err = service.register(form).await.expect_err("duplicate");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn resolve_user_combines_flags_role_and_grants() {
        let user = ada();
        let user_id = user.id().clone();
        let profile = UserProfile::new(user_id.clone(), Role::Librarian);
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(user)));
        users
            .expect_find_profile()
            .return_once(move |_| Ok(Some(profile)));
        let mut groups = MockGroupRepository::new();
        groups
            .expect_capabilities_for()
            .times(1)
            .return_once(|_| Ok([Capability::View].into_iter().collect()));
        let service = make_service(users, groups, MockTokenRepository::new());

        let identity = service
            .resolve_user(&user_id)
            .await
            .expect("lookup succeeds")
            .expect("identity present");
        assert_eq!(identity.role(), Some(Role::Librarian));
        assert_eq!(
            identity.effective_capabilities(),
            [Capability::View].into_iter().collect::<CapabilitySet>()
        );
    }

    #[tokio::test]
    async fn unknown_token_resolves_to_none() {
        let mut tokens = MockTokenRepository::new();
        tokens
            .expect_find_user_by_token()
            .times(1)
            .return_once(|_| Ok(None));
        let service = make_service(MockUserRepository::new(), MockGroupRepository::new(), tokens);
        let resolved = service
            .resolve_token(&ApiTokenKey::generate())
            .await
            .expect("lookup succeeds");
        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn issue_token_stores_fingerprint_of_returned_key() {
        let user = ada();
        let mut users = MockUserRepository::new();
        users
            .expect_find_credentials()
            .return_once(move |_| Ok(Some(stored(user, "analytical"))));
        let stored_fingerprint = Arc::new(std::sync::Mutex::new(None));
        let sink = Arc::clone(&stored_fingerprint);
        let mut tokens = MockTokenRepository::new();
        tokens
            .expect_replace_token()
            .times(1)
            .returning(move |_, fingerprint| {
                *sink.lock().expect("lock") = Some(fingerprint.clone());
                Ok(())
            });
        let service = make_service(users, MockGroupRepository::new(), tokens);

        let key = service
            .issue_token(&creds("ada", "analytical"))
            .await
            .expect("token issued");
        let saved = stored_fingerprint.lock().expect("lock").clone();
        assert_eq!(saved, Some(key.fingerprint()));
    }

    #[tokio::test]
    async fn connection_failures_surface_as_service_unavailable() {
        let mut users = MockUserRepository::new();
        users
            .expect_find_by_id()
            .return_once(|_| Err(UserPersistenceError::connection("pool exhausted")));
        let service = make_service(users, MockGroupRepository::new(), MockTokenRepository::new());
        let err = service
            .account(&UserId::random())
            .await
            .expect_err("store down");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
