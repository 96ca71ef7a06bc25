//! User profiles and the post-write synchronisation hook.
//!
//! Every user owns exactly one [`UserProfile`]. Stores never create profiles
//! on their own initiative; they call a [`UserWriteHook`] after each user
//! write, inside the same transaction, and apply the returned
//! [`ProfileAction`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{User, UserId};

/// Coarse role attached to a profile.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum Role {
    Admin,
    Librarian,
    #[default]
    Member,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Librarian, Role::Member];

    /// Stored representation.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "Admin",
            Self::Librarian => "Librarian",
            Self::Member => "Member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a stored or submitted role name is unknown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownRole(s.to_owned()))
    }
}

/// Profile attached one-to-one to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[schema(value_type = String)]
    user_id: UserId,
    role: Role,
}

impl UserProfile {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Default profile created alongside a new user.
    pub fn member(user_id: UserId) -> Self {
        Self::new(user_id, Role::Member)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn with_role(mut self, role: Role) -> Self {
        self.role = role;
        self
    }
}

/// Kind of user write that triggered the hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserWrite {
    Created,
    Updated,
}

/// What the store must do with the profile after a user write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileAction {
    /// Insert a new profile.
    Create(UserProfile),
    /// Re-persist the existing profile unchanged.
    Persist(UserProfile),
}

impl ProfileAction {
    /// Profile the store ends up holding.
    pub fn profile(&self) -> &UserProfile {
        match self {
            Self::Create(profile) | Self::Persist(profile) => profile,
        }
    }

    pub fn into_profile(self) -> UserProfile {
        match self {
            Self::Create(profile) | Self::Persist(profile) => profile,
        }
    }
}

/// Post-write hook invoked by user stores inside the write transaction.
#[cfg_attr(test, mockall::automock)]
pub trait UserWriteHook: Send + Sync {
    /// Decide the profile action for `user` given its current profile.
    fn after_user_write(
        &self,
        user: &User,
        write: UserWrite,
        existing: Option<UserProfile>,
    ) -> ProfileAction;
}

/// Keeps exactly one profile per user.
///
/// On create, a missing profile becomes a Member profile. On update, an
/// existing profile is persisted as is; a missing one is created.
///
/// # Examples
/// ```
/// use backend::domain::{ProfileAction, ProfileSync, Role, User, UserWrite, UserWriteHook};
///
/// let user = User::try_from_strings(
///     "3fa85f64-5717-4562-b3fc-2c963f66afa6",
///     "ada",
///     "ada@example.com",
/// )
/// .unwrap();
/// let action = ProfileSync.after_user_write(&user, UserWrite::Created, None);
/// assert!(matches!(action, ProfileAction::Create(ref p) if p.role() == Role::Member));
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct ProfileSync;

impl UserWriteHook for ProfileSync {
    fn after_user_write(
        &self,
        user: &User,
        write: UserWrite,
        existing: Option<UserProfile>,
    ) -> ProfileAction {
        match (write, existing) {
            // A create that finds a row already present keeps that row.
            (UserWrite::Created | UserWrite::Updated, Some(profile)) => {
                ProfileAction::Persist(profile)
            }
            (_, None) => ProfileAction::Create(UserProfile::member(user.id().clone())),
        }
    }
}
