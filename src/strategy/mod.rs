/*!
 * Index Strategies
 * Interchangeable read-only representations of resource trees
 *
 * ## Strategies
 * - `TrieIndex`: interned ids and precomputed subtree aggregates, O(depth)
 *   for every query at the cost of extra memory (default)
 * - `TreeIndex`: exact-path map with ancestor walks and range scans, less
 *   memory and more CPU per query
 *
 * Both produce identical verdicts for every input.
 */

pub mod tree;
pub mod trie;

pub use tree::TreeIndex;
pub use trie::TrieIndex;

use crate::core::errors::PolicyError;
use crate::tree::{PermissionResolver, ResourceForest};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Selects the index representation at enforcer-build time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexStrategy {
    /// Throughput-optimized prefix trie
    #[default]
    Trie,
    /// Memory-optimized path map
    Tree,
}

impl fmt::Display for IndexStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexStrategy::Trie => f.write_str("trie"),
            IndexStrategy::Tree => f.write_str("tree"),
        }
    }
}

impl FromStr for IndexStrategy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trie" => Ok(IndexStrategy::Trie),
            "tree" => Ok(IndexStrategy::Tree),
            other => Err(PolicyError::InvalidConfig(
                format!("unknown index strategy '{}'", other).into(),
            )),
        }
    }
}

/// Construction of a resolver from the built resource trees
pub trait FromForest: PermissionResolver + Sized {
    const STRATEGY: IndexStrategy;

    fn from_forest(forest: &ResourceForest) -> Self;
}
