//! Account registration and self-service update forms.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use zeroize::Zeroizing;

use super::{
    EmailAddress, Error, FieldErrors, PASSWORD_MIN, PasswordDigest, PasswordError, ProfilePhoto,
    Role, User, UserId, UserProfile, Username,
};

const DATE_FORMAT: &str = "%Y-%m-%d";

fn parse_date(errors: &mut FieldErrors, raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw.map(str::trim).filter(|value| !value.is_empty())?;
    errors.check(
        "date_of_birth",
        NaiveDate::parse_from_str(raw, DATE_FORMAT)
            .map_err(|_| "Enter a valid date in YYYY-MM-DD format."),
    )
}

fn parse_photo(errors: &mut FieldErrors, raw: Option<&str>) -> Option<ProfilePhoto> {
    let raw = raw.filter(|value| !value.trim().is_empty())?;
    errors.check("profile_photo", ProfilePhoto::new(raw))
}

/// A user together with the role from their profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountView {
    #[serde(flatten)]
    pub user: User,
    pub role: Role,
}

impl AccountView {
    pub fn new(user: User, profile: &UserProfile) -> Self {
        Self {
            user,
            role: profile.role(),
        }
    }
}

/// Account ready to be inserted, with its password digest.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub user: User,
    pub password: PasswordDigest,
}

impl NewAccount {
    /// Hash `password` for `user`.
    pub fn new(user: User, password: &str) -> Result<Self, Error> {
        let password = PasswordDigest::create(password).map_err(|err| match err {
            PasswordError::TooShort { .. } => {
                let mut errors = FieldErrors::default();
                errors.add("password", err.to_string());
                errors.into_error()
            }
            other => Error::internal(other.to_string()),
        })?;
        Ok(Self { user, password })
    }
}

/// Raw self-registration input.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: String,
    pub email: String,
    pub password: Zeroizing<String>,
    pub password_confirmation: Zeroizing<String>,
    pub date_of_birth: Option<String>,
    pub profile_photo: Option<String>,
}

impl RegistrationForm {
    /// Validate every field and hash the password.
    ///
    /// New accounts are active, non-staff members with a fresh random id.
    pub fn validate(self) -> Result<NewAccount, Error> {
        let mut errors = FieldErrors::default();
        let username = errors.check("username", Username::new(&self.username));
        let email = errors.check("email", EmailAddress::new(&self.email));
        if self.password.chars().count() < PASSWORD_MIN {
            errors.add(
                "password",
                format!("password must be at least {PASSWORD_MIN} characters"),
            );
        }
        if self.password.as_str() != self.password_confirmation.as_str() {
            errors.add("password_confirmation", "The two password fields didn't match.");
        }
        let date_of_birth = parse_date(&mut errors, self.date_of_birth.as_deref());
        let profile_photo = parse_photo(&mut errors, self.profile_photo.as_deref());

        let (Some(username), Some(email)) = (username, email) else {
            return Err(errors.into_error());
        };
        let user = errors.into_result(
            User::new(UserId::random(), username, email)
                .with_date_of_birth(date_of_birth)
                .with_profile_photo(profile_photo),
        )?;
        NewAccount::new(user, &self.password)
    }
}

/// Raw self-service profile changes. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountUpdateForm {
    pub email: Option<String>,
    pub date_of_birth: Option<String>,
    pub profile_photo: Option<String>,
}

impl AccountUpdateForm {
    /// Validate and apply the changes to `current`.
    pub fn apply(self, current: User) -> Result<User, Error> {
        let mut errors = FieldErrors::default();
        let email = match self.email.as_deref() {
            Some(raw) => errors.check("email", EmailAddress::new(raw)),
            None => Some(current.email().clone()),
        };
        let date_of_birth = match self.date_of_birth.as_deref() {
            Some(raw) => parse_date(&mut errors, Some(raw)),
            None => current.date_of_birth(),
        };
        let profile_photo = match self.profile_photo.as_deref() {
            Some(raw) => parse_photo(&mut errors, Some(raw)),
            None => current.profile_photo().cloned(),
        };
        let Some(email) = email else {
            return Err(errors.into_error());
        };
        errors.into_result(
            current
                .with_email(email)
                .with_date_of_birth(date_of_birth)
                .with_profile_photo(profile_photo),
        )
    }
}
