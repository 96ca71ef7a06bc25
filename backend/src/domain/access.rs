//! Access gate for catalogue and administrative operations.
//!
//! The gate is a pure predicate: callers resolve the acting [`Identity`]
//! (including its effective capability set) fresh for every request and
//! pass it in. Nothing here is cached.

use std::fmt;

use super::{AccountFlags, Capability, CapabilitySet, Error, Role, UserId};

/// Authenticated principal with the grants resolved for this request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    user_id: UserId,
    flags: AccountFlags,
    role: Option<Role>,
    granted: CapabilitySet,
}

impl Identity {
    /// Build an identity from the account flags, profile role and the union
    /// of capabilities granted through group membership.
    pub fn new(
        user_id: UserId,
        flags: AccountFlags,
        role: Option<Role>,
        granted: CapabilitySet,
    ) -> Self {
        Self {
            user_id,
            flags,
            role,
            granted,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn flags(&self) -> AccountFlags {
        self.flags
    }

    pub fn role(&self) -> Option<Role> {
        if self.flags.is_active { self.role } else { None }
    }

    /// Capabilities the identity may exercise.
    ///
    /// Inactive accounts hold nothing; active superusers hold everything.
    pub fn effective_capabilities(&self) -> CapabilitySet {
        match (self.flags.is_active, self.flags.is_superuser) {
            (false, _) => CapabilitySet::empty(),
            (true, true) => CapabilitySet::all(),
            (true, false) => self.granted.clone(),
        }
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.effective_capabilities().contains(capability)
    }
}

/// Condition an operation places on the acting identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any active identity.
    Authenticated,
    /// Active identity with the staff flag.
    Staff,
    /// Active identity holding the capability.
    Capability(Capability),
    /// Active identity whose profile carries the role.
    Role(Role),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => f.write_str("authentication"),
            Self::Staff => f.write_str("staff access"),
            Self::Capability(capability) => write!(f, "capability {capability}"),
            Self::Role(role) => write!(f, "role {role}"),
        }
    }
}

/// Evaluates requirements against identities.
///
/// # Examples
/// ```
/// use backend::domain::{
///     AccessGate, AccountFlags, Capability, ErrorCode, Identity, Requirement, UserId,
/// };
///
/// let viewer = Identity::new(
///     UserId::random(),
///     AccountFlags::member(),
///     None,
///     [Capability::View].into_iter().collect(),
/// );
/// assert!(AccessGate::check(Some(&viewer), Requirement::Capability(Capability::View)).is_ok());
/// let denied = AccessGate::check(Some(&viewer), Requirement::Capability(Capability::Create));
/// assert_eq!(denied.unwrap_err().code(), ErrorCode::Forbidden);
/// let anonymous = AccessGate::check(None, Requirement::Authenticated);
/// assert_eq!(anonymous.unwrap_err().code(), ErrorCode::Unauthorized);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct AccessGate;

impl AccessGate {
    /// Whether `identity` satisfies `requirement`.
    pub fn permits(identity: &Identity, requirement: Requirement) -> bool {
        if !identity.flags.is_active {
            return false;
        }
        match requirement {
            Requirement::Authenticated => true,
            Requirement::Staff => identity.flags.is_staff,
            Requirement::Capability(capability) => identity.has_capability(capability),
            Requirement::Role(role) => identity.role() == Some(role),
        }
    }

    /// Reject anonymous callers with `Unauthorized` and insufficient
    /// identities with `Forbidden`.
    pub fn check(identity: Option<&Identity>, requirement: Requirement) -> Result<(), Error> {
        let identity =
            identity.ok_or_else(|| Error::unauthorized("authentication credentials were not provided"))?;
        if Self::permits(identity, requirement) {
            Ok(())
        } else {
            Err(Error::forbidden(format!("{requirement} required")))
        }
    }
}

/// Entry surface an operation arrives through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessSurface {
    /// Session-authenticated catalogue endpoints gated by capabilities.
    Catalogue,
    /// Token-authenticated REST endpoints gated by authentication and staff.
    RestApi,
}

/// Gated catalogue operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogueOperation {
    ListBooks,
    ViewBook,
    CreateBook,
    EditBook,
    DeleteBook,
    ViewLibrary,
    ManageLibrary,
}

impl CatalogueOperation {
    /// Requirement this operation imposes on the given surface.
    pub const fn requirement_for(self, surface: AccessSurface) -> Requirement {
        match (surface, self) {
            (AccessSurface::Catalogue, Self::ListBooks | Self::ViewBook | Self::ViewLibrary) => {
                Requirement::Capability(Capability::View)
            }
            (AccessSurface::Catalogue, Self::CreateBook) => {
                Requirement::Capability(Capability::Create)
            }
            (AccessSurface::Catalogue, Self::EditBook | Self::ManageLibrary) => {
                Requirement::Capability(Capability::Edit)
            }
            (AccessSurface::Catalogue, Self::DeleteBook) => {
                Requirement::Capability(Capability::Delete)
            }
            (AccessSurface::RestApi, Self::ListBooks | Self::ViewBook | Self::ViewLibrary) => {
                Requirement::Authenticated
            }
            (AccessSurface::RestApi, _) => Requirement::Staff,
        }
    }
}

/// Acting identity together with the surface it came through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    identity: Option<Identity>,
    surface: AccessSurface,
}

impl Actor {
    pub fn new(identity: Option<Identity>, surface: AccessSurface) -> Self {
        Self { identity, surface }
    }

    /// Unauthenticated caller.
    pub fn anonymous(surface: AccessSurface) -> Self {
        Self::new(None, surface)
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn surface(&self) -> AccessSurface {
        self.surface
    }

    /// Check the requirement `operation` imposes on this actor's surface.
    pub fn authorize(&self, operation: CatalogueOperation) -> Result<(), Error> {
        self.require(operation.requirement_for(self.surface))
    }

    /// Check an explicit requirement.
    pub fn require(&self, requirement: Requirement) -> Result<(), Error> {
        AccessGate::check(self.identity.as_ref(), requirement)
    }
}
