//! Authentication primitives: login credentials, password digests and API
//! token keys.
//!
//! Plaintext secrets are held in [`Zeroizing`] buffers and never leave this
//! module in a form that would be persisted.

use std::fmt;

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::Rng;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use zeroize::Zeroizing;

use crate::domain::{EmailAddress, Username};

/// Minimum accepted password length in characters.
pub const PASSWORD_MIN: usize = 8;

/// Number of random bytes in an API token key.
const TOKEN_KEY_BYTES: usize = 20;

/// Domain error returned when login payload values are invalid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginValidationError {
    /// Username was missing or blank once trimmed.
    EmptyUsername,
    /// Password was blank.
    EmptyPassword,
}

impl fmt::Display for LoginValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUsername => write!(f, "username must not be empty"),
            Self::EmptyPassword => write!(f, "password must not be empty"),
        }
    }
}

impl std::error::Error for LoginValidationError {}

/// Account key a login names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Email(EmailAddress),
    Username(Username),
}

/// Validated login credentials used by authentication services.
///
/// Accounts log in with their email address; the username is accepted too.
///
/// ## Invariants
/// - `username` is trimmed and must not be empty after trimming.
/// - `password` is non-empty and keeps caller-provided whitespace.
///
/// # Examples
/// ```
/// use backend::domain::LoginCredentials;
///
/// let creds = LoginCredentials::try_from_parts("admin", "password").unwrap();
/// assert_eq!(creds.username(), "admin");
/// assert_eq!(creds.password(), "password");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    username: String,
    password: Zeroizing<String>,
}

impl LoginCredentials {
    /// Construct credentials from raw username/password inputs.
    pub fn try_from_parts(username: &str, password: &str) -> Result<Self, LoginValidationError> {
        let normalized = username.trim();
        if normalized.is_empty() {
            return Err(LoginValidationError::EmptyUsername);
        }

        if password.is_empty() {
            return Err(LoginValidationError::EmptyPassword);
        }

        Ok(Self {
            username: normalized.to_owned(),
            password: Zeroizing::new(password.to_owned()),
        })
    }

    /// Login name exactly as presented, trimmed.
    pub fn username(&self) -> &str {
        self.username.as_str()
    }

    /// Lookup keys in the order they are tried: email, then username.
    ///
    /// Usernames may contain `@`, so an email-shaped value is also tried as
    /// a username. Values that fit neither shape yield no keys.
    pub fn identifiers(&self) -> Vec<LoginIdentifier> {
        let email = EmailAddress::new(&self.username)
            .ok()
            .map(LoginIdentifier::Email);
        let username = Username::new(&self.username)
            .ok()
            .map(LoginIdentifier::Username);
        email.into_iter().chain(username).collect()
    }

    /// Password string provided by the caller.
    pub fn password(&self) -> &str {
        self.password.as_str()
    }
}

/// Errors raised while hashing or parsing password digests.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PasswordError {
    #[error("password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("password hashing failed: {message}")]
    Hashing { message: String },
    #[error("stored password digest is malformed")]
    MalformedDigest,
}

/// Argon2 password digest in PHC string format.
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Hash a plaintext password with a fresh salt.
    pub fn create(password: &str) -> Result<Self, PasswordError> {
        if password.chars().count() < PASSWORD_MIN {
            return Err(PasswordError::TooShort { min: PASSWORD_MIN });
        }
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| Self(hash.to_string()))
            .map_err(|err| PasswordError::Hashing {
                message: err.to_string(),
            })
    }

    /// Wrap a digest loaded from storage after checking it parses.
    pub fn from_stored(encoded: impl Into<String>) -> Result<Self, PasswordError> {
        let encoded = encoded.into();
        PasswordHash::new(&encoded).map_err(|_| PasswordError::MalformedDigest)?;
        Ok(Self(encoded))
    }

    /// Check a plaintext candidate against the digest.
    pub fn verify(&self, candidate: &str) -> bool {
        PasswordHash::new(&self.0)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(candidate.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }

    /// PHC-encoded representation for persistence.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// Plaintext API token key handed to the client exactly once.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiTokenKey(Zeroizing<String>);

impl ApiTokenKey {
    /// Generate a random 40-character hex key.
    pub fn generate() -> Self {
        let mut bytes = [0_u8; TOKEN_KEY_BYTES];
        OsRng.fill(&mut bytes);
        Self(Zeroizing::new(hex::encode(bytes)))
    }

    /// Parse a key presented by a client.
    ///
    /// Returns `None` for values that cannot be a key this service issued.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (trimmed.len() == TOKEN_KEY_BYTES * 2 && trimmed.chars().all(|c| c.is_ascii_hexdigit()))
            .then(|| Self(Zeroizing::new(trimmed.to_ascii_lowercase())))
    }

    /// Fingerprint stored in place of the key.
    pub fn fingerprint(&self) -> TokenFingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.0.as_bytes());
        TokenFingerprint(hex::encode(hasher.finalize()))
    }

    /// Plaintext key, for the issuance response only.
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for ApiTokenKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiTokenKey(..)")
    }
}

/// Hex-encoded SHA-256 digest of an [`ApiTokenKey`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenFingerprint(String);

impl TokenFingerprint {
    /// Wrap a fingerprint loaded from storage.
    pub fn from_stored(encoded: impl Into<String>) -> Self {
        Self(encoded.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", "pw", LoginValidationError::EmptyUsername)]
    #[case("   ", "pw", LoginValidationError::EmptyUsername)]
    #[case("user", "", LoginValidationError::EmptyPassword)]
    fn invalid_credentials(
        #[case] username: &str,
        #[case] password: &str,
        #[case] expected: LoginValidationError,
    ) {
        let err = LoginCredentials::try_from_parts(username, password)
            .expect_err("invalid inputs must fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn valid_credentials_trim_username() {
        let creds = LoginCredentials::try_from_parts("  admin  ", "secret").expect("valid");
        assert_eq!(creds.username(), "admin");
        assert_eq!(creds.password(), "secret");
    }

    #[rstest]
    #[case("Ada@Example.COM", vec![
        LoginIdentifier::Email(EmailAddress::new("Ada@example.com").expect("email")),
        LoginIdentifier::Username(Username::new("Ada@Example.COM").expect("username")),
    ])]
    #[case("ada", vec![LoginIdentifier::Username(Username::new("ada").expect("username"))])]
    #[case("no spaces", vec![])]
    fn identifiers_try_email_before_username(
        #[case] login: &str,
        #[case] expected: Vec<LoginIdentifier>,
    ) {
        let creds = LoginCredentials::try_from_parts(login, "secret").expect("valid");
        assert_eq!(creds.identifiers(), expected);
    }

    #[rstest]
    fn digest_verifies_only_the_original_password() {
        let digest = PasswordDigest::create("correct horse").expect("hash");
        assert!(digest.verify("correct horse"));
        assert!(!digest.verify("wrong horse"));
        assert!(digest.as_str().starts_with("$argon2"));
    }

    #[rstest]
    fn digest_rejects_short_passwords() {
        assert_eq!(
            PasswordDigest::create("short").expect_err("too short"),
            PasswordError::TooShort { min: PASSWORD_MIN }
        );
    }

    #[rstest]
    fn stored_digest_must_parse() {
        assert_eq!(
            PasswordDigest::from_stored("plaintext").expect_err("malformed"),
            PasswordError::MalformedDigest
        );
        let digest = PasswordDigest::create("long enough").expect("hash");
        let reloaded = PasswordDigest::from_stored(digest.as_str()).expect("parse");
        assert!(reloaded.verify("long enough"));
    }

    #[rstest]
    fn token_keys_are_random_hex_with_stable_fingerprints() {
        let first = ApiTokenKey::generate();
        let second = ApiTokenKey::generate();
        assert_ne!(first.expose(), second.expose());
        assert_eq!(first.expose().len(), TOKEN_KEY_BYTES * 2);

        let reparsed = ApiTokenKey::parse(first.expose()).expect("issued key parses");
        assert_eq!(reparsed.fingerprint(), first.fingerprint());
        assert_eq!(first.fingerprint().as_str().len(), 64);
    }

    #[rstest]
    #[case("")]
    #[case("not-hex-at-all")]
    #[case("abcd")]
    fn token_parse_rejects_foreign_values(#[case] raw: &str) {
        assert!(ApiTokenKey::parse(raw).is_none());
    }
}
