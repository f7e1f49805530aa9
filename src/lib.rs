/*!
 * Policy Enforcer Library
 * Hierarchical resource-permission resolution for JSON entities
 *
 * Policies grant and revoke permissions to subjects on slash-separated paths
 * of an entity. An enforcer is built once per policy revision and answers
 * unrestricted/partial permission checks, subject-set queries and filtered
 * JSON views without locking.
 */

pub mod core;
pub mod enforcer;
pub mod model;
pub mod monitoring;
pub mod strategy;
pub mod tree;

// Re-exports
pub use crate::core::{EnforcerConfig, PolicyError, PolicyResult};
pub use enforcer::{
    build_enforcer, AccessControlList, Enforcer, EnforcerKey, JsonObject, LegacyEnforcer,
    PolicyEnforcer,
};
pub use model::{
    AuthorizationContext, EffectedPermissions, EffectedSubjectIds, Permission, Permissions,
    Policy, PolicyEntry, PolicyId, ResourceKey, ResourcePath, Subject, SubjectId,
};
pub use monitoring::init_tracing;
pub use strategy::{IndexStrategy, TreeIndex, TrieIndex};
pub use tree::{PermissionResolver, Verdict};
