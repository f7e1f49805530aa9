/*!
 * Enforcer Configuration
 * Strategy selection and validation vocabulary for enforcer construction
 */

use crate::core::errors::{PolicyError, PolicyResult};
use crate::strategy::IndexStrategy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Resource types accepted when no explicit configuration is given
pub const DEFAULT_RESOURCE_TYPES: &[&str] = &["thing", "policy", "message"];

/// Configuration consulted once, at enforcer-build time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct EnforcerConfig {
    /// Index representation used by hierarchical enforcers
    pub strategy: IndexStrategy,
    /// Accepted resource types; empty accepts any well-formed type
    pub resource_types: BTreeSet<String>,
    /// Accepted permission names; empty accepts any well-formed name
    pub permissions: BTreeSet<String>,
    /// Remove subjects whose expiry lies in the past before indexing
    pub drop_expired_subjects: bool,
}

impl Default for EnforcerConfig {
    fn default() -> Self {
        Self {
            strategy: IndexStrategy::default(),
            resource_types: DEFAULT_RESOURCE_TYPES.iter().map(|t| t.to_string()).collect(),
            permissions: BTreeSet::new(),
            drop_expired_subjects: true,
        }
    }
}

impl EnforcerConfig {
    /// Load configuration from the environment, falling back to defaults
    ///
    /// Environment variables:
    /// - ENFORCER_INDEX_STRATEGY: `trie` or `tree`
    /// - ENFORCER_RESOURCE_TYPES: comma separated resource types
    /// - ENFORCER_PERMISSIONS: comma separated permission names
    /// - ENFORCER_DROP_EXPIRED: `true`/`1` or `false`/`0`
    pub fn from_env() -> PolicyResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> PolicyResult<Self> {
        let mut config = Self::default();

        if let Some(strategy) = lookup("ENFORCER_INDEX_STRATEGY") {
            config.strategy = strategy.parse()?;
        }
        if let Some(types) = lookup("ENFORCER_RESOURCE_TYPES") {
            config.resource_types = split_list(&types);
        }
        if let Some(permissions) = lookup("ENFORCER_PERMISSIONS") {
            config.permissions = split_list(&permissions);
        }
        if let Some(flag) = lookup("ENFORCER_DROP_EXPIRED") {
            config.drop_expired_subjects = match flag.trim() {
                "1" | "true" => true,
                "0" | "false" => false,
                other => {
                    return Err(PolicyError::InvalidConfig(
                        format!("ENFORCER_DROP_EXPIRED={}", other).into(),
                    ))
                }
            };
        }

        Ok(config)
    }

    /// Use the given index strategy
    pub fn with_strategy(mut self, strategy: IndexStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Restrict accepted permission names
    pub fn with_permissions<I, S>(mut self, permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.permissions = permissions.into_iter().map(Into::into).collect();
        self
    }

    /// Restrict accepted resource types; an empty iterator accepts any type
    pub fn with_resource_types<I, S>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_types = types.into_iter().map(Into::into).collect();
        self
    }

    /// Keep expired subjects in the index
    pub fn keep_expired_subjects(mut self) -> Self {
        self.drop_expired_subjects = false;
        self
    }

    pub fn accepts_resource_type(&self, resource_type: &str) -> bool {
        self.resource_types.is_empty() || self.resource_types.contains(resource_type)
    }

    pub fn accepts_permission(&self, permission: &str) -> bool {
        self.permissions.is_empty() || self.permissions.contains(permission)
    }
}

fn split_list(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}
