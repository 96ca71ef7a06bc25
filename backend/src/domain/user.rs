//! User account model.
//!
//! Accounts carry a unique username and a unique, normalised email address.
//! Passwords never live on [`User`]; the persistence layer stores a
//! [`crate::domain::PasswordDigest`] alongside the record.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Maximum username length in characters.
pub const USERNAME_MAX: usize = 150;
/// Maximum email length in characters.
pub const EMAIL_MAX: usize = 254;
/// Maximum stored length of a profile photo path.
pub const PROFILE_PHOTO_MAX: usize = 255;
/// Directory under which profile photos are stored.
pub const PROFILE_PHOTO_DIR: &str = "profile_photos/";

/// Validation errors raised while building user components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    EmptyId,
    InvalidId,
    EmptyUsername,
    UsernameTooLong { max: usize },
    UsernameInvalidCharacters,
    EmptyEmail,
    EmailTooLong { max: usize },
    InvalidEmail,
    InvalidProfilePhoto,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyUsername => write!(f, "The Username field must be set"),
            Self::UsernameTooLong { max } => {
                write!(f, "username must be at most {max} characters")
            }
            Self::UsernameInvalidCharacters => write!(
                f,
                "username may only contain letters, digits and @/./+/-/_ characters",
            ),
            Self::EmptyEmail => write!(f, "The Email field must be set"),
            Self::EmailTooLong { max } => write!(f, "email must be at most {max} characters"),
            Self::InvalidEmail => write!(f, "enter a valid email address"),
            Self::InvalidProfilePhoto => write!(
                f,
                "profile photo must be a relative path of at most {PROFILE_PHOTO_MAX} characters",
            ),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let raw = id.as_ref();
        if raw.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if raw.trim() != raw {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(raw)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for UserId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Login name, unique across accounts.
///
/// # Examples
/// ```
/// use backend::domain::Username;
///
/// let name = Username::new("  ada.l@home ").unwrap();
/// assert_eq!(name.as_ref(), "ada.l@home");
/// assert!(Username::new("no spaces").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Username(String);

impl Username {
    /// Trim and validate a username.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyUsername);
        }
        if trimmed.chars().count() > USERNAME_MAX {
            return Err(UserValidationError::UsernameTooLong { max: USERNAME_MAX });
        }
        let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
        if !trimmed.chars().all(allowed) {
            return Err(UserValidationError::UsernameInvalidCharacters);
        }
        Ok(Self(trimmed.to_owned()))
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<Username> for String {
    fn from(value: Username) -> Self {
        value.0
    }
}

impl TryFrom<String> for Username {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Email address with a lower-cased domain part.
///
/// The local part keeps its case; only the domain is normalised, so
/// `Ada@Example.COM` and `Ada@example.com` collide on uniqueness.
///
/// # Examples
/// ```
/// use backend::domain::EmailAddress;
///
/// let email = EmailAddress::new(" Ada@Example.COM ").unwrap();
/// assert_eq!(email.as_ref(), "Ada@example.com");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Trim, validate, and normalise an email address.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(UserValidationError::EmptyEmail);
        }
        if trimmed.chars().count() > EMAIL_MAX {
            return Err(UserValidationError::EmailTooLong { max: EMAIL_MAX });
        }
        let (local, domain) = trimmed
            .rsplit_once('@')
            .ok_or(UserValidationError::InvalidEmail)?;
        if local.is_empty()
            || domain.is_empty()
            || local.contains('@')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(UserValidationError::InvalidEmail);
        }
        Ok(Self(format!("{local}@{}", domain.to_lowercase())))
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.0
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Relative storage path of an uploaded profile photo.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProfilePhoto(String);

impl ProfilePhoto {
    /// Accept a file name or a path under [`PROFILE_PHOTO_DIR`].
    ///
    /// Bare file names are placed under the photo directory. Absolute paths
    /// and parent-directory segments are rejected.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty()
            || trimmed.starts_with('/')
            || trimmed.contains('\\')
            || trimmed.split('/').any(|segment| segment == ".." || segment.is_empty())
        {
            return Err(UserValidationError::InvalidProfilePhoto);
        }
        let path = if trimmed.starts_with(PROFILE_PHOTO_DIR) {
            trimmed.to_owned()
        } else {
            format!("{PROFILE_PHOTO_DIR}{trimmed}")
        };
        if path.chars().count() > PROFILE_PHOTO_MAX {
            return Err(UserValidationError::InvalidProfilePhoto);
        }
        Ok(Self(path))
    }
}

impl AsRef<str> for ProfilePhoto {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl From<ProfilePhoto> for String {
    fn from(value: ProfilePhoto) -> Self {
        value.0
    }
}

impl TryFrom<String> for ProfilePhoto {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Account status flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountFlags {
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl AccountFlags {
    /// Flags of a regular, active account.
    pub const fn member() -> Self {
        Self {
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }
    }

    /// Flags forced on superuser accounts.
    pub const fn superuser() -> Self {
        Self {
            is_active: true,
            is_staff: true,
            is_superuser: true,
        }
    }
}

impl Default for AccountFlags {
    fn default() -> Self {
        Self::member()
    }
}

/// Application user.
///
/// ## Invariants
/// - `username` and `email` are validated on construction.
/// - A superuser is always active and staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[schema(value_type = String, example = "3fa85f64-5717-4562-b3fc-2c963f66afa6")]
    id: UserId,
    #[schema(value_type = String, example = "ada")]
    username: Username,
    #[schema(value_type = String, example = "ada@example.com")]
    email: EmailAddress,
    #[schema(value_type = Option<String>, format = Date, example = "1815-12-10")]
    date_of_birth: Option<NaiveDate>,
    #[schema(value_type = Option<String>, example = "profile_photos/ada.png")]
    profile_photo: Option<ProfilePhoto>,
    #[serde(flatten)]
    flags: AccountFlags,
}

impl User {
    /// Build an active, non-staff account.
    pub fn new(id: UserId, username: Username, email: EmailAddress) -> Self {
        Self {
            id,
            username,
            email,
            date_of_birth: None,
            profile_photo: None,
            flags: AccountFlags::member(),
        }
    }

    /// Build an account with superuser flags forced on.
    pub fn superuser(id: UserId, username: Username, email: EmailAddress) -> Self {
        Self::new(id, username, email).with_flags(AccountFlags::superuser())
    }

    /// Fallible constructor from raw strings.
    pub fn try_from_strings(
        id: impl AsRef<str>,
        username: impl AsRef<str>,
        email: impl AsRef<str>,
    ) -> Result<Self, UserValidationError> {
        Ok(Self::new(
            UserId::new(id)?,
            Username::new(username)?,
            EmailAddress::new(email)?,
        ))
    }

    /// Replace the date of birth.
    #[must_use]
    pub fn with_date_of_birth(mut self, date_of_birth: Option<NaiveDate>) -> Self {
        self.date_of_birth = date_of_birth;
        self
    }

    /// Replace the profile photo path.
    #[must_use]
    pub fn with_profile_photo(mut self, profile_photo: Option<ProfilePhoto>) -> Self {
        self.profile_photo = profile_photo;
        self
    }

    /// Replace the account flags. Superuser implies active staff.
    #[must_use]
    pub fn with_flags(mut self, flags: AccountFlags) -> Self {
        self.flags = if flags.is_superuser {
            AccountFlags::superuser()
        } else {
            flags
        };
        self
    }

    /// Replace the email address.
    #[must_use]
    pub fn with_email(mut self, email: EmailAddress) -> Self {
        self.email = email;
        self
    }

    pub fn id(&self) -> &UserId {
        &self.id
    }

    pub fn username(&self) -> &Username {
        &self.username
    }

    pub fn email(&self) -> &EmailAddress {
        &self.email
    }

    pub fn date_of_birth(&self) -> Option<NaiveDate> {
        self.date_of_birth
    }

    pub fn profile_photo(&self) -> Option<&ProfilePhoto> {
        self.profile_photo.as_ref()
    }

    pub fn flags(&self) -> AccountFlags {
        self.flags
    }

    /// Whether the account may authenticate at all.
    pub fn is_active(&self) -> bool {
        self.flags.is_active
    }
}
