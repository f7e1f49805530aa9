/*!
 * Tree Index
 * Memory-optimized strategy: exact path to local subject index
 *
 * Only paths carrying explicit permissions are stored. Ancestor walks strip
 * one segment at a time and look each parent up again; subtree questions
 * scan the contiguous range of descendant paths in the ordered map.
 */

use super::{FromForest, IndexStrategy};
use crate::model::resource::parent_of;
use crate::model::{EffectedPermissions, Permission, ResourceKey, SubjectId, ROOT};
use crate::tree::{PermissionResolver, ResourceForest, Verdict};
use ahash::AHashMap;
use smartstring::alias::String as SmartString;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Bound;

type LocalIndex = AHashMap<SubjectId, EffectedPermissions>;

/// Path-map index of every resource type
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    paths: AHashMap<SmartString, BTreeMap<String, LocalIndex>>,
    declared: BTreeMap<SmartString, BTreeSet<SubjectId>>,
}

impl TreeIndex {
    /// Number of stored paths across all resource types
    pub fn path_count(&self) -> usize {
        self.paths.values().map(BTreeMap::len).sum()
    }

    fn resolve_in(
        map: &BTreeMap<String, LocalIndex>,
        subject: &SubjectId,
        path: &str,
        permission: &Permission,
    ) -> Verdict {
        let mut current = Some(path);
        while let Some(path) = current {
            if let Some(verdict) = map
                .get(path)
                .and_then(|local| Verdict::of_local(local.get(subject), permission))
            {
                return verdict;
            }
            current = parent_of(path);
        }
        Verdict::Undefined
    }

    /// Whether any stored path strictly below `path` satisfies `predicate`
    fn any_descendant(
        map: &BTreeMap<String, LocalIndex>,
        path: &str,
        mut predicate: impl FnMut(&LocalIndex) -> bool,
    ) -> bool {
        if path == ROOT {
            return map
                .range::<str, _>((Bound::Excluded(ROOT), Bound::Unbounded))
                .any(|(_, local)| predicate(local));
        }
        let prefix = format!("{}/", path);
        map.range::<str, _>((Bound::Included(prefix.as_str()), Bound::Unbounded))
            .take_while(|(p, _)| p.starts_with(&prefix))
            .any(|(_, local)| predicate(local))
    }
}

impl FromForest for TreeIndex {
    const STRATEGY: IndexStrategy = IndexStrategy::Tree;

    fn from_forest(forest: &ResourceForest) -> Self {
        let mut paths = AHashMap::new();
        for tree in forest.trees() {
            let map: BTreeMap<String, LocalIndex> = tree
                .nodes()
                .filter(|(_, node)| node.has_permissions())
                .map(|(_, node)| (node.path().as_str().to_string(), node.permissions().clone()))
                .collect();
            paths.insert(SmartString::from(tree.resource_type()), map);
        }
        Self {
            paths,
            declared: forest.declared().clone(),
        }
    }
}

impl PermissionResolver for TreeIndex {
    fn resolve(&self, subject: &SubjectId, key: &ResourceKey, permission: &Permission) -> Verdict {
        match self.paths.get(key.resource_type()) {
            Some(map) => Self::resolve_in(map, subject, key.path().as_str(), permission),
            None => Verdict::Undefined,
        }
    }

    fn is_unrestricted(
        &self,
        subject: &SubjectId,
        key: &ResourceKey,
        permission: &Permission,
    ) -> bool {
        let Some(map) = self.paths.get(key.resource_type()) else {
            return false;
        };
        let path = key.path().as_str();
        if !Self::resolve_in(map, subject, path, permission).is_granted() {
            return false;
        }
        !Self::any_descendant(map, path, |local| {
            local
                .get(subject)
                .map_or(false, |effected| effected.is_revoked(permission))
        })
    }

    fn is_partially_granted(
        &self,
        subject: &SubjectId,
        key: &ResourceKey,
        permission: &Permission,
    ) -> bool {
        let Some(map) = self.paths.get(key.resource_type()) else {
            return false;
        };
        let path = key.path().as_str();
        if Self::resolve_in(map, subject, path, permission).is_granted() {
            return true;
        }
        Self::any_descendant(map, path, |local| {
            local
                .get(subject)
                .map_or(false, |effected| effected.is_granted(permission))
        })
    }

    fn declared_subjects(&self, resource_type: &str) -> Option<&BTreeSet<SubjectId>> {
        self.declared.get(resource_type)
    }

    fn strategy(&self) -> IndexStrategy {
        Self::STRATEGY
    }
}
