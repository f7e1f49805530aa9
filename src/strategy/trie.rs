/*!
 * Trie Index
 * Throughput-optimized strategy with precomputed subtree aggregates
 *
 * Subjects and permissions are interned to dense ids at build time. Every
 * trie node holds one slot per permission id with the subjects granted and
 * revoked at that node, plus the subjects granted or revoked anywhere in the
 * node's subtree. A query walks at most `depth` nodes and never traverses a
 * subtree.
 */

use super::{FromForest, IndexStrategy};
use crate::model::{Permission, ResourceKey, SubjectId};
use crate::tree::{PermissionResolver, ResourceForest, ResourceTree, Verdict};
use ahash::{AHashMap, AHashSet};
use smartstring::alias::String as SmartString;
use std::collections::{BTreeMap, BTreeSet};

type SubjectIdx = u32;
type PermissionIdx = usize;

/// Subject sets of one permission at one node
#[derive(Debug, Clone, Default)]
struct PermissionSlot {
    /// Explicitly granted here and not revoked here
    granted: AHashSet<SubjectIdx>,
    /// Explicitly revoked here
    revoked: AHashSet<SubjectIdx>,
    /// `granted` of this node or any descendant
    subtree_granted: AHashSet<SubjectIdx>,
    /// `revoked` of this node or any descendant
    subtree_revoked: AHashSet<SubjectIdx>,
}

impl PermissionSlot {
    fn local_verdict(&self, subject: SubjectIdx) -> Option<Verdict> {
        if self.revoked.contains(&subject) {
            Some(Verdict::Revoked)
        } else if self.granted.contains(&subject) {
            Some(Verdict::Granted)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone)]
struct TrieNode {
    children: AHashMap<SmartString, usize>,
    slots: Box<[PermissionSlot]>,
}

/// Prefix trie of one resource type; node 0 is the root
#[derive(Debug, Clone)]
struct Trie {
    nodes: Vec<TrieNode>,
}

/// Result of walking a path down the trie
struct Walk<'a> {
    /// Deepest explicit verdict on the walked chain
    verdict: Verdict,
    /// Node of the full path, `None` when the trie ends above it
    node: Option<&'a TrieNode>,
}

impl Trie {
    fn compile(
        tree: &ResourceTree,
        subject_ids: &AHashMap<SubjectId, SubjectIdx>,
        permission_ids: &AHashMap<Permission, PermissionIdx>,
    ) -> Self {
        let slot_count = permission_ids.len();
        let mut nodes: Vec<TrieNode> = tree
            .nodes()
            .map(|(_, source)| {
                let mut slots = vec![PermissionSlot::default(); slot_count].into_boxed_slice();
                for (subject, effected) in source.permissions() {
                    let s = subject_ids[subject];
                    for permission in &effected.revoke {
                        slots[permission_ids[permission]].revoked.insert(s);
                    }
                    for permission in &effected.grant {
                        let slot = &mut slots[permission_ids[permission]];
                        if !slot.revoked.contains(&s) {
                            slot.granted.insert(s);
                        }
                    }
                }
                for slot in slots.iter_mut() {
                    slot.subtree_granted = slot.granted.clone();
                    slot.subtree_revoked = slot.revoked.clone();
                }
                TrieNode {
                    children: source
                        .children()
                        .map(|(segment, child)| (SmartString::from(segment), child))
                        .collect(),
                    slots,
                }
            })
            .collect();

        // Children always follow their parent in the arena, so a reverse sweep
        // folds every subtree into its parent after the subtree is complete.
        for (id, source) in tree.nodes().collect::<Vec<_>>().into_iter().rev() {
            let Some(parent) = source.parent() else {
                continue;
            };
            let (head, tail) = nodes.split_at_mut(id);
            let child = &tail[0];
            for (parent_slot, child_slot) in head[parent].slots.iter_mut().zip(child.slots.iter()) {
                parent_slot
                    .subtree_granted
                    .extend(child_slot.subtree_granted.iter().copied());
                parent_slot
                    .subtree_revoked
                    .extend(child_slot.subtree_revoked.iter().copied());
            }
        }

        Self { nodes }
    }

    fn walk<'a>(
        &'a self,
        key: &ResourceKey,
        subject: SubjectIdx,
        permission: PermissionIdx,
    ) -> Walk<'a> {
        let mut node = &self.nodes[0];
        let mut verdict = node.slots[permission]
            .local_verdict(subject)
            .unwrap_or(Verdict::Undefined);
        for segment in key.path().segments() {
            match node.children.get(segment) {
                Some(&child) => {
                    node = &self.nodes[child];
                    if let Some(local) = node.slots[permission].local_verdict(subject) {
                        verdict = local;
                    }
                }
                None => return Walk { verdict, node: None },
            }
        }
        Walk {
            verdict,
            node: Some(node),
        }
    }
}

/// Interned prefix-trie index of every resource type
#[derive(Debug, Clone, Default)]
pub struct TrieIndex {
    tries: AHashMap<SmartString, Trie>,
    subject_ids: AHashMap<SubjectId, SubjectIdx>,
    permission_ids: AHashMap<Permission, PermissionIdx>,
    declared: BTreeMap<SmartString, BTreeSet<SubjectId>>,
}

impl TrieIndex {
    /// Number of trie nodes across all resource types
    pub fn node_count(&self) -> usize {
        self.tries.values().map(|t| t.nodes.len()).sum()
    }

    fn ids(
        &self,
        subject: &SubjectId,
        permission: &Permission,
    ) -> Option<(SubjectIdx, PermissionIdx)> {
        Some((
            *self.subject_ids.get(subject)?,
            *self.permission_ids.get(permission)?,
        ))
    }

    /// Walk `key` for interned ids; `None` when the type, subject or permission is unknown
    fn walk(
        &self,
        subject: &SubjectId,
        key: &ResourceKey,
        permission: &Permission,
    ) -> Option<(Walk<'_>, SubjectIdx, PermissionIdx)> {
        let trie = self.tries.get(key.resource_type())?;
        let (s, p) = self.ids(subject, permission)?;
        Some((trie.walk(key, s, p), s, p))
    }
}

impl FromForest for TrieIndex {
    const STRATEGY: IndexStrategy = IndexStrategy::Trie;

    fn from_forest(forest: &ResourceForest) -> Self {
        let mut subject_ids = AHashMap::new();
        let mut permission_ids = AHashMap::new();
        for tree in forest.trees() {
            for (_, node) in tree.nodes() {
                for (subject, effected) in node.permissions() {
                    let next = subject_ids.len() as SubjectIdx;
                    subject_ids.entry(subject.clone()).or_insert(next);
                    for permission in effected.mentioned() {
                        let next = permission_ids.len();
                        permission_ids.entry(permission.clone()).or_insert(next);
                    }
                }
            }
        }

        let tries = forest
            .trees()
            .map(|tree| {
                (
                    SmartString::from(tree.resource_type()),
                    Trie::compile(tree, &subject_ids, &permission_ids),
                )
            })
            .collect();

        Self {
            tries,
            subject_ids,
            permission_ids,
            declared: forest.declared().clone(),
        }
    }
}

impl PermissionResolver for TrieIndex {
    fn resolve(&self, subject: &SubjectId, key: &ResourceKey, permission: &Permission) -> Verdict {
        self.walk(subject, key, permission)
            .map_or(Verdict::Undefined, |(walk, _, _)| walk.verdict)
    }

    fn is_unrestricted(
        &self,
        subject: &SubjectId,
        key: &ResourceKey,
        permission: &Permission,
    ) -> bool {
        let Some((walk, s, p)) = self.walk(subject, key, permission) else {
            return false;
        };
        if !walk.verdict.is_granted() {
            return false;
        }
        walk.node
            .map_or(true, |node| !node.slots[p].subtree_revoked.contains(&s))
    }

    fn is_partially_granted(
        &self,
        subject: &SubjectId,
        key: &ResourceKey,
        permission: &Permission,
    ) -> bool {
        let Some((walk, s, p)) = self.walk(subject, key, permission) else {
            return false;
        };
        if walk.verdict.is_granted() {
            return true;
        }
        walk.node
            .map_or(false, |node| node.slots[p].subtree_granted.contains(&s))
    }

    fn declared_subjects(&self, resource_type: &str) -> Option<&BTreeSet<SubjectId>> {
        self.declared.get(resource_type)
    }

    fn strategy(&self) -> IndexStrategy {
        Self::STRATEGY
    }
}
