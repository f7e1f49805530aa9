/*!
 * Permission Resolver
 * Nearest-ancestor resolution and subtree aggregation over resource trees
 *
 * Resolution walks from a path toward the root and stops at the first node
 * carrying an explicit grant or revoke for the subject and permission. The
 * most specific node wins regardless of entry order; within one node a
 * revoke wins over a grant.
 */

use crate::model::{
    AuthorizationContext, EffectedPermissions, EffectedSubjectIds, Permission, Permissions,
    ResourceKey, SubjectId,
};
use crate::strategy::IndexStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Outcome of resolving one permission for one subject at one path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Granted,
    Revoked,
    Undefined,
}

impl Verdict {
    /// Verdict of the explicit entry at a single node, if any
    pub fn of_local(effected: Option<&EffectedPermissions>, permission: &Permission) -> Option<Self> {
        let effected = effected?;
        if effected.is_revoked(permission) {
            Some(Verdict::Revoked)
        } else if effected.is_granted(permission) {
            Some(Verdict::Granted)
        } else {
            None
        }
    }

    pub fn is_granted(self) -> bool {
        self == Verdict::Granted
    }
}

/// Per-subject, per-permission resolution contract shared by all index strategies
///
/// Implementations are built once and read-only afterwards.
pub trait PermissionResolver: Send + Sync {
    /// Nearest explicit verdict on the ancestor chain of `key`, inclusive
    fn resolve(&self, subject: &SubjectId, key: &ResourceKey, permission: &Permission) -> Verdict;

    /// Granted at `key` and no node below `key` resolves to revoked
    fn is_unrestricted(&self, subject: &SubjectId, key: &ResourceKey, permission: &Permission)
        -> bool;

    /// At least one node in the subtree of `key`, inclusive, resolves to granted
    fn is_partially_granted(
        &self,
        subject: &SubjectId,
        key: &ResourceKey,
        permission: &Permission,
    ) -> bool;

    /// Every subject declared for the resource type
    fn declared_subjects(&self, resource_type: &str) -> Option<&BTreeSet<SubjectId>>;

    fn strategy(&self) -> IndexStrategy;
}

/// Every permission is unrestricted for at least one subject of the context
pub fn has_unrestricted_permissions<R: PermissionResolver + ?Sized>(
    resolver: &R,
    key: &ResourceKey,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> bool {
    if permissions.is_empty() || context.is_empty() {
        return false;
    }
    permissions.iter().all(|permission| {
        context
            .subjects()
            .iter()
            .any(|subject| resolver.is_unrestricted(subject, key, permission))
    })
}

/// Every permission is partially granted to at least one subject of the context
pub fn has_partial_permissions<R: PermissionResolver + ?Sized>(
    resolver: &R,
    key: &ResourceKey,
    context: &AuthorizationContext,
    permissions: &Permissions,
) -> bool {
    if permissions.is_empty() || context.is_empty() {
        return false;
    }
    permissions.iter().all(|permission| {
        context
            .subjects()
            .iter()
            .any(|subject| resolver.is_partially_granted(subject, key, permission))
    })
}

/// Partition the declared subjects into unrestricted and the rest
pub fn subject_ids_with_permission<R: PermissionResolver + ?Sized>(
    resolver: &R,
    key: &ResourceKey,
    permissions: &Permissions,
) -> EffectedSubjectIds {
    let mut result = EffectedSubjectIds::default();
    let Some(declared) = resolver.declared_subjects(key.resource_type()) else {
        return result;
    };
    for subject in declared {
        let granted = !permissions.is_empty()
            && permissions
                .iter()
                .all(|permission| resolver.is_unrestricted(subject, key, permission));
        if granted {
            result.granted.insert(subject.clone());
        } else {
            result.revoked.insert(subject.clone());
        }
    }
    result
}

/// Declared subjects partially granted every permission
pub fn subject_ids_with_partial_permission<R: PermissionResolver + ?Sized>(
    resolver: &R,
    key: &ResourceKey,
    permissions: &Permissions,
) -> BTreeSet<SubjectId> {
    if permissions.is_empty() {
        return BTreeSet::new();
    }
    resolver
        .declared_subjects(key.resource_type())
        .into_iter()
        .flatten()
        .filter(|subject| {
            permissions
                .iter()
                .all(|permission| resolver.is_partially_granted(subject, key, permission))
        })
        .cloned()
        .collect()
}
