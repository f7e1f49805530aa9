/*!
 * Policy Enforcer
 * Hierarchical enforcer built once from a policy snapshot
 */

use super::Enforcer;
use crate::core::config::EnforcerConfig;
use crate::core::errors::PolicyResult;
use crate::model::{
    AuthorizationContext, EffectedSubjectIds, Permission, Permissions, Policy, PolicyId,
    ResourceKey, SubjectId,
};
use crate::monitoring::BuildSpan;
use crate::strategy::{FromForest, IndexStrategy, TreeIndex, TrieIndex};
use crate::tree::{self, PermissionResolver, ResourceForest, Verdict};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::{debug, info, instrument};

/// Cache key under which callers may keep a built enforcer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EnforcerKey {
    pub policy_id: PolicyId,
    pub revision: u64,
}

/// Enforcer over one of the index strategies
#[derive(Debug, Clone)]
pub struct PolicyEnforcer<R> {
    key: EnforcerKey,
    resolver: R,
}

impl<R: FromForest> PolicyEnforcer<R> {
    /// Validate `policy` against `config` and build the index
    pub fn build(policy: &Policy, config: &EnforcerConfig) -> PolicyResult<Self> {
        Self::build_at(policy, config, SystemTime::now())
    }

    /// Build treating `now` as the current instant for subject expiry
    #[instrument(skip_all, fields(policy_id = %policy.id(), revision = policy.revision()))]
    pub fn build_at(policy: &Policy, config: &EnforcerConfig, now: SystemTime) -> PolicyResult<Self> {
        let span = BuildSpan::new(policy.id().as_str(), policy.revision(), &R::STRATEGY.to_string());
        let _entered = span.enter();

        if let Err(err) = policy.validate_with(config) {
            span.record_error(&err.to_string());
            return Err(err);
        }

        let effective = if config.drop_expired_subjects {
            Cow::Owned(policy.without_expired_subjects(now))
        } else {
            Cow::Borrowed(policy)
        };

        let forest = ResourceForest::build(&effective);
        let resolver = R::from_forest(&forest);

        let entries = effective.entries().count();
        span.record_size(entries, forest.node_count());
        info!(
            policy_id = %policy.id(),
            revision = policy.revision(),
            strategy = %R::STRATEGY,
            entries,
            nodes = forest.node_count(),
            "enforcer built"
        );

        Ok(Self {
            key: EnforcerKey {
                policy_id: policy.id().clone(),
                revision: policy.revision(),
            },
            resolver,
        })
    }
}

impl<R: PermissionResolver> PolicyEnforcer<R> {
    pub fn cache_key(&self) -> &EnforcerKey {
        &self.key
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    pub fn strategy(&self) -> IndexStrategy {
        self.resolver.strategy()
    }

    /// Nearest explicit verdict for one subject
    pub fn resolve(&self, subject: &SubjectId, key: &ResourceKey, permission: &Permission) -> Verdict {
        self.resolver.resolve(subject, key, permission)
    }

    fn log_denial(
        &self,
        check: &'static str,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) {
        let reason = if permissions.is_empty() {
            "empty permission set"
        } else if context.is_empty() {
            "empty authorization context"
        } else {
            "no subject holds every requested permission"
        };
        debug!(
            policy_id = %self.key.policy_id,
            revision = self.key.revision,
            resource = %key,
            subjects = ?context.subjects(),
            permissions = ?permissions,
            check,
            reason,
            "access denied"
        );
    }
}

impl<R: PermissionResolver> Enforcer for PolicyEnforcer<R> {
    fn has_unrestricted_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> bool {
        let allowed = tree::has_unrestricted_permissions(&self.resolver, key, context, permissions);
        if !allowed {
            self.log_denial("unrestricted", key, context, permissions);
        }
        allowed
    }

    fn has_partial_permissions(
        &self,
        key: &ResourceKey,
        context: &AuthorizationContext,
        permissions: &Permissions,
    ) -> bool {
        let allowed = tree::has_partial_permissions(&self.resolver, key, context, permissions);
        if !allowed {
            self.log_denial("partial", key, context, permissions);
        }
        allowed
    }

    fn subject_ids_with_permission(
        &self,
        key: &ResourceKey,
        permissions: &Permissions,
    ) -> EffectedSubjectIds {
        tree::subject_ids_with_permission(&self.resolver, key, permissions)
    }

    fn subject_ids_with_partial_permission(
        &self,
        key: &ResourceKey,
        permissions: &Permissions,
    ) -> BTreeSet<SubjectId> {
        tree::subject_ids_with_partial_permission(&self.resolver, key, permissions)
    }
}

/// Build an enforcer using the strategy selected in `config`
pub fn build_enforcer(policy: &Policy, config: &EnforcerConfig) -> PolicyResult<Arc<dyn Enforcer>> {
    Ok(match config.strategy {
        IndexStrategy::Trie => Arc::new(PolicyEnforcer::<TrieIndex>::build(policy, config)?),
        IndexStrategy::Tree => Arc::new(PolicyEnforcer::<TreeIndex>::build(policy, config)?),
    })
}
