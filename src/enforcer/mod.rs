/*!
 * Enforcer Module
 * Public query surface over a built policy
 *
 * ## Usage
 * ```ignore
 * use policy_enforcer::{build_enforcer, AuthorizationContext, EnforcerConfig, Policy, ResourceKey};
 * use policy_enforcer::model::{permissions, READ};
 *
 * let policy = Policy::from_json(document)?;
 * let enforcer = build_enforcer(&policy, &EnforcerConfig::default())?;
 *
 * let key: ResourceKey = "thing:/attributes".parse()?;
 * let ctx = AuthorizationContext::new(["google:alice"]);
 * if enforcer.has_unrestricted_permissions(&key, &ctx, &permissions([READ])) {
 *     // Serve the full attributes object
 * }
 * ```
 */

pub mod legacy;
pub mod policy_enforcer;
pub mod view;

pub use legacy::{AccessControlList, LegacyEnforcer};
pub use policy_enforcer::{build_enforcer, EnforcerKey, PolicyEnforcer};
pub use view::build_json_view;

use crate::model::{AuthorizationContext, EffectedSubjectIds, Permissions, ResourceKey, SubjectId};
use std::collections::BTreeSet;

/// JSON object as produced and consumed by the view builder
pub type JsonObject = serde_json::Map<String, serde_json::Value>;

/// Authorization queries against one immutable policy snapshot
///
/// Every method is a synchronous, lock-free read; denial is `false` or an
/// empty result.
pub trait Enforcer: Send + Sync {
    /// Every permission holds for the whole subtree of `key` for some subject of `context`
    fn has_unrestricted_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> bool;

    /// Every permission holds somewhere within the subtree of `key` for some subject
    fn has_partial_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> bool;

    /// Declared subjects split into unrestricted and everyone else
    fn subject_ids_with_permission(
        &self,
        key: &ResourceKey,
        permissions: &Permissions,
    ) -> EffectedSubjectIds;

    /// Declared subjects with partial access for every permission
    fn subject_ids_with_partial_permission(
        &self,
        key: &ResourceKey,
        permissions: &Permissions,
    ) -> BTreeSet<SubjectId>;

    /// Filter an entity's JSON at `key` down to what the context may see
    fn build_json_view(
        &self,
        key: &ResourceKey,
        fields: &JsonObject,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> JsonObject {
        view::build_json_view(self, key, fields, context, permissions)
    }
}
