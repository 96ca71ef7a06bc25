//! Cookie session settings read from the environment.
//!
//! Release builds demand every toggle explicitly and refuse weak keys; debug
//! builds fall back to safe defaults and log a warning instead.

use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use sha2::{Digest, Sha256};
use tracing::warn;
use zeroize::Zeroize;

const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
const SAMESITE_ENV: &str = "SESSION_SAMESITE";
const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";
const KEY_DEFAULT_PATH: &str = "/var/run/secrets/library_session_key";
/// Release builds require at least this many bytes of key material.
pub const SESSION_KEY_MIN_LEN: usize = 64;
// `Key::derive_from` panics below this length.
const KEY_DERIVE_MIN_LEN: usize = 32;
const FINGERPRINT_BYTES: usize = 8;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";
const SAMESITE_EXPECTED: &str = "Strict|Lax|None";

/// How strictly settings are validated.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Missing or malformed toggles fall back to defaults with a warning.
    Debug,
    /// Missing or malformed toggles are fatal.
    Release,
}

impl BuildMode {
    /// Mode matching the current compilation profile.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use backend::inbound::http::session_config::BuildMode;
    ///
    /// let expected = if cfg!(debug_assertions) {
    ///     BuildMode::Debug
    /// } else {
    ///     BuildMode::Release
    /// };
    /// assert_eq!(BuildMode::from_debug_assertions(), expected);
    /// ```
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    const fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }

    /// Return `fallback` after warning in debug builds, `error` otherwise.
    fn tolerate<T>(
        self,
        fallback: T,
        error: SessionConfigError,
        warning: impl FnOnce(),
    ) -> Result<T, SessionConfigError> {
        if self.is_debug() {
            warning();
            Ok(fallback)
        } else {
            Err(error)
        }
    }
}

/// Validated cookie session settings.
pub struct SessionSettings {
    /// Signing and encryption key for the private session cookie.
    pub key: Key,
    /// Whether the cookie carries the `Secure` attribute.
    pub cookie_secure: bool,
    /// `SameSite` policy of the cookie.
    pub same_site: SameSite,
}

impl SessionSettings {
    /// Short hex digest of the signing key, safe to log.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use actix_web::cookie::{Key, SameSite};
    /// use backend::inbound::http::session_config::SessionSettings;
    ///
    /// let settings = SessionSettings {
    ///     key: Key::generate(),
    ///     cookie_secure: true,
    ///     same_site: SameSite::Strict,
    /// };
    /// assert_eq!(settings.key_fingerprint().len(), 16);
    /// ```
    #[must_use]
    pub fn key_fingerprint(&self) -> String {
        let digest = Sha256::digest(self.key.signing());
        digest
            .iter()
            .take(FINGERPRINT_BYTES)
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }
}

/// Why the session settings were rejected.
#[derive(thiserror::Error, Debug)]
pub enum SessionConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Read and validate the session settings.
///
/// # Examples
///
/// ```rust
/// use backend::inbound::http::session_config::{BuildMode, session_settings_from_env};
/// use mockable::MockEnv;
///
/// let mut env = MockEnv::new();
/// env.expect_string().returning(|_| None);
///
/// let settings = session_settings_from_env(&env, BuildMode::Debug).expect("debug defaults");
/// assert!(settings.cookie_secure);
/// ```
pub fn session_settings_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
) -> Result<SessionSettings, SessionConfigError> {
    let cookie_secure = read_bool(env, mode, COOKIE_SECURE_ENV, true)?;
    let same_site = read_same_site(env, mode, cookie_secure)?;
    let allow_ephemeral = read_bool(env, mode, ALLOW_EPHEMERAL_ENV, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(SessionConfigError::EphemeralNotAllowed);
    }
    let key = read_key(env, mode, allow_ephemeral)?;
    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn read_bool<E: Env>(
    env: &E,
    mode: BuildMode,
    name: &'static str,
    default: bool,
) -> Result<bool, SessionConfigError> {
    let Some(value) = env.string(name) else {
        return mode.tolerate(default, SessionConfigError::MissingEnv { name }, || {
            warn!(variable = name, default, "session toggle not set; using default");
        });
    };
    match parse_bool(&value) {
        Some(flag) => Ok(flag),
        None => {
            let error = SessionConfigError::InvalidEnv {
                name,
                value: value.clone(),
                expected: BOOL_EXPECTED,
            };
            mode.tolerate(default, error, || {
                warn!(variable = name, %value, default, "invalid session toggle; using default");
            })
        }
    }
}

fn read_same_site<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, SessionConfigError> {
    let default = if mode.is_debug() {
        SameSite::Lax
    } else {
        SameSite::Strict
    };
    let Some(value) = env.string(SAMESITE_ENV) else {
        return mode.tolerate(
            default,
            SessionConfigError::MissingEnv { name: SAMESITE_ENV },
            || warn!("SESSION_SAMESITE not set; using default"),
        );
    };
    match value.to_ascii_lowercase().as_str() {
        "lax" => Ok(SameSite::Lax),
        "strict" => Ok(SameSite::Strict),
        "none" if cookie_secure => Ok(SameSite::None),
        "none" => mode.tolerate(
            SameSite::None,
            SessionConfigError::InsecureSameSiteNone,
            || warn!("SESSION_SAMESITE=None without a secure cookie; browsers may drop it"),
        ),
        _ => {
            let error = SessionConfigError::InvalidEnv {
                name: SAMESITE_ENV,
                value: value.clone(),
                expected: SAMESITE_EXPECTED,
            };
            mode.tolerate(default, error, || {
                warn!(%value, "invalid SESSION_SAMESITE; using default");
            })
        }
    }
}

fn read_key<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, SessionConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| KEY_DEFAULT_PATH.to_owned()),
    );
    let mut bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(source) if mode.is_debug() || allow_ephemeral => {
            warn!(path = %path.display(), error = %source, "using ephemeral session key");
            return Ok(Key::generate());
        }
        Err(source) => return Err(SessionConfigError::KeyRead { path, source }),
    };
    let length = bytes.len();
    let min_len = match mode {
        BuildMode::Release => SESSION_KEY_MIN_LEN,
        BuildMode::Debug => KEY_DERIVE_MIN_LEN,
    };
    if length < min_len {
        bytes.zeroize();
        let error = SessionConfigError::KeyTooShort {
            path,
            length,
            min_len,
        };
        return mode.tolerate(Key::generate(), error, || {
            warn!(length, "session key file too short; using ephemeral key");
        });
    }
    let key = Key::derive_from(&bytes);
    bytes.zeroize();
    Ok(key)
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}
