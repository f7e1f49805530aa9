/*!
 * Shared fixtures for enforcer integration tests
 */

use policy_enforcer::strategy::FromForest;
use policy_enforcer::tree::ResourceForest;
use policy_enforcer::{
    build_enforcer, AuthorizationContext, Enforcer, EnforcerConfig, IndexStrategy,
    PermissionResolver, Policy, PolicyEntry, ResourceKey, Subject, SubjectId, TreeIndex,
    TrieIndex,
};
use std::sync::Arc;

pub const STRATEGIES: [IndexStrategy; 2] = [IndexStrategy::Trie, IndexStrategy::Tree];

/// One enforcer per index strategy
pub fn enforcers(policy: &Policy) -> Vec<(IndexStrategy, Arc<dyn Enforcer>)> {
    STRATEGIES
        .iter()
        .map(|&strategy| {
            let config = EnforcerConfig::default().with_strategy(strategy);
            (strategy, build_enforcer(policy, &config).unwrap())
        })
        .collect()
}

/// One bare resolver per index strategy
pub fn resolvers(policy: &Policy) -> Vec<Box<dyn PermissionResolver>> {
    let forest = ResourceForest::build(policy);
    vec![
        Box::new(TrieIndex::from_forest(&forest)),
        Box::new(TreeIndex::from_forest(&forest)),
    ]
}

pub fn thing(path: &str) -> ResourceKey {
    ResourceKey::new("thing", path).unwrap()
}

pub fn subject(name: &str) -> SubjectId {
    SubjectId::from(format!("test:{}", name))
}

pub fn ctx(names: &[&str]) -> AuthorizationContext {
    AuthorizationContext::new(names.iter().map(|n| subject(n)))
}

/// Entry with a single `test:<name>` subject
pub fn entry(label: &str, name: &str) -> PolicyEntry {
    PolicyEntry::new(label).with_subject(Subject::new(subject(name), "user"))
}
