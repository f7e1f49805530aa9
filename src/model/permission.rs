/*!
 * Permissions
 * Opaque permission names and grant/revoke pairs
 */

use crate::core::errors::{PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::collections::BTreeSet;
use std::fmt;

pub const READ: &str = "READ";
pub const WRITE: &str = "WRITE";
pub const ADMINISTRATE: &str = "ADMINISTRATE";

/// A named capability checked per resource per subject
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(SmartString);

/// Unordered permission set (ordered storage for deterministic output only)
pub type Permissions = BTreeSet<Permission>;

impl Permission {
    pub fn new(name: impl Into<SmartString>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Check that the name is usable as a permission
    pub fn validate(&self) -> PolicyResult<()> {
        let valid = !self.0.is_empty()
            && !self.0.chars().any(|c| c.is_whitespace() || c.is_control());
        if valid {
            Ok(())
        } else {
            Err(PolicyError::UnknownPermission(self.0.clone()))
        }
    }
}

impl From<&str> for Permission {
    fn from(name: &str) -> Self {
        Self(name.into())
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build a permission set from names
pub fn permissions<I, S>(names: I) -> Permissions
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    names
        .into_iter()
        .map(|n| Permission::from(n.as_ref()))
        .collect()
}

/// Explicit grants and revokes for one (subject, resource) pair
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EffectedPermissions {
    #[serde(default)]
    pub grant: Permissions,
    #[serde(default)]
    pub revoke: Permissions,
}

impl EffectedPermissions {
    pub fn new(grant: Permissions, revoke: Permissions) -> Self {
        Self { grant, revoke }
    }

    pub fn granting<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(permissions(names), Permissions::new())
    }

    pub fn revoking<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(Permissions::new(), permissions(names))
    }

    /// Set union with another grant/revoke pair
    pub fn merge(&mut self, other: &EffectedPermissions) {
        self.grant.extend(other.grant.iter().cloned());
        self.revoke.extend(other.revoke.iter().cloned());
    }

    /// Permissions both granted and revoked; revoke wins for these
    pub fn conflicts(&self) -> impl Iterator<Item = &Permission> {
        self.grant.intersection(&self.revoke)
    }

    pub fn is_granted(&self, permission: &Permission) -> bool {
        self.grant.contains(permission) && !self.revoke.contains(permission)
    }

    pub fn is_revoked(&self, permission: &Permission) -> bool {
        self.revoke.contains(permission)
    }

    pub fn is_empty(&self) -> bool {
        self.grant.is_empty() && self.revoke.is_empty()
    }

    /// All permission names mentioned
    pub fn mentioned(&self) -> impl Iterator<Item = &Permission> {
        self.grant.union(&self.revoke)
    }
}
