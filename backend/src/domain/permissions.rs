//! Capability registry for catalogue entities.
//!
//! Capabilities are registered per entity type. Group grants may only name
//! capabilities present in the registry; anything else is a
//! [`ConfigurationError`].

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Entity types that carry registered capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Book,
}

impl EntityType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Book => "book",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named capability over an entity type.
///
/// Ordering follows declaration order, which is also the order capabilities
/// are listed in grants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum Capability {
    View,
    Create,
    Edit,
    Delete,
}

impl Capability {
    /// Every capability, in declaration order.
    pub const ALL: [Capability; 4] = [
        Capability::View,
        Capability::Create,
        Capability::Edit,
        Capability::Delete,
    ];

    /// Stable codename stored in grants.
    pub const fn codename(self) -> &'static str {
        match self {
            Self::View => "can_view",
            Self::Create => "can_create",
            Self::Edit => "can_edit",
            Self::Delete => "can_delete",
        }
    }

    /// Human-readable label registered alongside the codename.
    pub const fn label(self) -> &'static str {
        match self {
            Self::View => "Can view book",
            Self::Create => "Can create book",
            Self::Edit => "Can edit book",
            Self::Delete => "Can delete book",
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.codename())
    }
}

impl From<Capability> for &'static str {
    fn from(value: Capability) -> Self {
        value.codename()
    }
}

/// Raised when a codename does not name a known capability.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown capability codename: {0}")]
pub struct UnknownCapability(pub String);

impl FromStr for Capability {
    type Err = UnknownCapability;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|capability| capability.codename() == s)
            .ok_or_else(|| UnknownCapability(s.to_owned()))
    }
}

impl TryFrom<String> for Capability {
    type Error = UnknownCapability;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A capability registered against an entity type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Permission {
    pub entity: EntityType,
    pub capability: Capability,
}

impl Permission {
    pub const fn new(entity: EntityType, capability: Capability) -> Self {
        Self { entity, capability }
    }
}

/// Raised when provisioning needs a capability that is not registered.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    #[error("capability {codename} is not registered for entity type {entity}")]
    MissingCapability {
        entity: EntityType,
        codename: &'static str,
    },
}

/// Registered capabilities per entity type.
///
/// # Examples
/// ```
/// use backend::domain::{Capability, EntityType, PermissionRegistry};
///
/// let registry = PermissionRegistry::declared();
/// assert!(registry.lookup(EntityType::Book, Capability::Delete).is_ok());
///
/// let partial = PermissionRegistry::from_codenames(EntityType::Book, ["can_view"]);
/// assert!(partial.lookup(EntityType::Book, Capability::Delete).is_err());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionRegistry {
    entries: BTreeSet<Permission>,
}

impl PermissionRegistry {
    /// The four Book capabilities declared by the catalogue model.
    pub fn declared() -> Self {
        Self {
            entries: Capability::ALL
                .into_iter()
                .map(|capability| Permission::new(EntityType::Book, capability))
                .collect(),
        }
    }

    /// Build a registry from stored codenames, ignoring unknown ones.
    pub fn from_codenames<I, S>(entity: EntityType, codenames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            entries: codenames
                .into_iter()
                .filter_map(|codename| codename.as_ref().parse::<Capability>().ok())
                .map(|capability| Permission::new(entity, capability))
                .collect(),
        }
    }

    /// Find a registered permission.
    pub fn lookup(
        &self,
        entity: EntityType,
        capability: Capability,
    ) -> Result<Permission, ConfigurationError> {
        let permission = Permission::new(entity, capability);
        if self.entries.contains(&permission) {
            Ok(permission)
        } else {
            Err(ConfigurationError::MissingCapability {
                entity,
                codename: capability.codename(),
            })
        }
    }

    /// Registered capabilities for `entity`.
    pub fn capabilities(&self, entity: EntityType) -> CapabilitySet {
        self.entries
            .iter()
            .filter(|permission| permission.entity == entity)
            .map(|permission| permission.capability)
            .collect()
    }
}

/// Set of capabilities held by an identity or granted to a group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitySet(BTreeSet<Capability>);

impl CapabilitySet {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Every capability.
    pub fn all() -> Self {
        Capability::ALL.into_iter().collect()
    }

    pub fn contains(&self, capability: Capability) -> bool {
        self.0.contains(&capability)
    }

    pub fn insert(&mut self, capability: Capability) {
        self.0.insert(capability);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Capabilities in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = Capability> + '_ {
        self.0.iter().copied()
    }

    /// Codenames in declaration order.
    pub fn codenames(&self) -> Vec<&'static str> {
        self.iter().map(Capability::codename).collect()
    }
}

impl FromIterator<Capability> for CapabilitySet {
    fn from_iter<T: IntoIterator<Item = Capability>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Capability> for CapabilitySet {
    fn extend<T: IntoIterator<Item = Capability>>(&mut self, iter: T) {
        self.0.extend(iter);
    }
}
