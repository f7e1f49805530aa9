/*!
 * Legacy Flat Enforcer
 * Entity-wide access control lists from before hierarchical policies
 *
 * An ACL grants each subject a flat permission set covering the whole
 * entity. Without a path hierarchy there is no partial access, so the
 * unrestricted and partial checks always agree and resource paths are
 * ignored.
 */

use super::Enforcer;
use crate::core::config::EnforcerConfig;
use crate::core::errors::{PolicyError, PolicyResult};
use crate::model::{
    AuthorizationContext, EffectedSubjectIds, Permission, Permissions, ResourceKey, SubjectId,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

/// Subject to permission-set map
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessControlList {
    entries: BTreeMap<SubjectId, Permissions>,
}

impl AccessControlList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grant permissions to a subject, adding to any it already holds
    pub fn with_entry<I, S>(mut self, subject: impl Into<SubjectId>, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.entries
            .entry(subject.into())
            .or_default()
            .extend(names.into_iter().map(|n| Permission::from(n.as_ref())));
        self
    }

    /// Parse `{ "issuer:subject": { "READ": true, "WRITE": false } }`
    pub fn from_json(json: &str) -> PolicyResult<Self> {
        let raw: BTreeMap<SubjectId, BTreeMap<String, bool>> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(subject, flags)| {
                let granted = flags
                    .into_iter()
                    .filter(|(_, granted)| *granted)
                    .map(|(name, _)| Permission::from(name.as_str()))
                    .collect();
                (subject, granted)
            })
            .collect();
        Ok(Self { entries })
    }

    pub fn permissions_of(&self, subject: &SubjectId) -> Option<&Permissions> {
        self.entries.get(subject)
    }

    pub fn subjects(&self) -> impl Iterator<Item = &SubjectId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn validate_with(&self, config: &EnforcerConfig) -> PolicyResult<()> {
        for (subject, permissions) in &self.entries {
            subject.validate()?;
            for permission in permissions {
                permission.validate()?;
                if !config.accepts_permission(permission.as_str()) {
                    return Err(PolicyError::UnknownPermission(permission.as_str().into()));
                }
            }
        }
        Ok(())
    }
}

/// Enforcer over a flat ACL
#[derive(Debug, Clone)]
pub struct LegacyEnforcer {
    acl: AccessControlList,
}

impl LegacyEnforcer {
    pub fn build(acl: AccessControlList, config: &EnforcerConfig) -> PolicyResult<Self> {
        acl.validate_with(config)?;
        info!(subjects = acl.len(), "legacy enforcer built");
        Ok(Self { acl })
    }

    fn holds_all(&self, subject: &SubjectId, permissions: &Permissions) -> bool {
        !permissions.is_empty()
            && self
                .acl
                .permissions_of(subject)
                .map_or(false, |granted| permissions.is_subset(granted))
    }

    fn check(&self, key: &ResourceKey, context: &AuthorizationContext, permissions: &Permissions) -> bool {
        if permissions.is_empty() || context.is_empty() {
            return false;
        }
        let allowed = permissions.iter().all(|permission| {
            context.subjects().iter().any(|subject| {
                self.acl
                    .permissions_of(subject)
                    .map_or(false, |granted| granted.contains(permission))
            })
        });
        if !allowed {
            debug!(
                resource = %key,
                subjects = ?context.subjects(),
                permissions = ?permissions,
                "access denied by legacy ACL"
            );
        }
        allowed
    }
}

impl Enforcer for LegacyEnforcer {
    fn has_unrestricted_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> bool {
        self.check(key, context, permissions)
    }

    fn has_partial_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> bool {
        self.check(key, context, permissions)
    }

    fn subject_ids_with_permission(
        &self,
        _key: &ResourceKey,
        permissions: &Permissions,
    ) -> EffectedSubjectIds {
        let (granted, revoked) = self
            .acl
            .subjects()
            .cloned()
            .partition(|subject| self.holds_all(subject, permissions));
        EffectedSubjectIds { granted, revoked }
    }

    fn subject_ids_with_partial_permission(
        &self,
        _key: &ResourceKey,
        permissions: &Permissions,
    ) -> BTreeSet<SubjectId> {
        self.acl
            .subjects()
            .filter(|subject| self.holds_all(subject, permissions))
            .cloned()
            .collect()
    }
}
