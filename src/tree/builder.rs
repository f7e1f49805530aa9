/*!
 * Resource Tree Builder
 * Arena-backed path trees, one per resource type, built once per policy
 *
 * Permissions are attached only to the node a resource names. Intermediate
 * nodes exist for structure and never receive materialized permissions.
 */

use crate::model::{EffectedPermissions, Policy, ResourcePath, SubjectId, ROOT};
use ahash::AHashMap;
use smartstring::alias::String as SmartString;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{trace, warn};

/// Index of a node within its tree's arena
pub type NodeId = usize;

/// Root node id of every tree
pub const ROOT_NODE: NodeId = 0;

/// One path segment in a resource tree
#[derive(Debug, Clone)]
pub struct TreeNode {
    path: ResourcePath,
    parent: Option<NodeId>,
    children: BTreeMap<SmartString, NodeId>,
    permissions: AHashMap<SubjectId, EffectedPermissions>,
}

impl TreeNode {
    fn new(path: ResourcePath, parent: Option<NodeId>) -> Self {
        Self {
            path,
            parent,
            children: BTreeMap::new(),
            permissions: AHashMap::new(),
        }
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> impl Iterator<Item = (&str, NodeId)> {
        self.children.iter().map(|(segment, id)| (segment.as_str(), *id))
    }

    /// Explicit grants/revokes attached at exactly this node
    pub fn permissions(&self) -> &AHashMap<SubjectId, EffectedPermissions> {
        &self.permissions
    }

    pub fn has_permissions(&self) -> bool {
        !self.permissions.is_empty()
    }
}

/// Path tree of a single resource type
///
/// Parents are always allocated before their children, so every child id is
/// greater than its parent id.
#[derive(Debug, Clone)]
pub struct ResourceTree {
    resource_type: SmartString,
    nodes: Vec<TreeNode>,
    index: AHashMap<String, NodeId>,
}

impl ResourceTree {
    pub fn new(resource_type: &str) -> Self {
        let mut index = AHashMap::new();
        index.insert(ROOT.to_string(), ROOT_NODE);
        Self {
            resource_type: resource_type.into(),
            nodes: vec![TreeNode::new(ResourcePath::root(), None)],
            index,
        }
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    /// Find or create the node for `path` and all of its ancestors
    pub fn insert_path(&mut self, path: &ResourcePath) -> NodeId {
        if let Some(&id) = self.index.get(path.as_str()) {
            return id;
        }
        let mut current = ROOT_NODE;
        let mut current_path = ResourcePath::root();
        for segment in path.segments() {
            current_path = current_path.child(segment);
            current = match self.nodes[current].children.get(segment) {
                Some(&child) => child,
                None => {
                    let child = self.nodes.len();
                    self.nodes
                        .push(TreeNode::new(current_path.clone(), Some(current)));
                    self.nodes[current].children.insert(segment.into(), child);
                    self.index.insert(current_path.as_str().to_string(), child);
                    child
                }
            };
        }
        current
    }

    /// Attach grants/revokes for a subject at a node, combining by set union
    pub fn attach(&mut self, node: NodeId, subject: &SubjectId, effected: &EffectedPermissions) {
        self.nodes[node]
            .permissions
            .entry(subject.clone())
            .or_default()
            .merge(effected);
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id]
    }

    pub fn root(&self) -> &TreeNode {
        &self.nodes[ROOT_NODE]
    }

    pub fn find(&self, path: &str) -> Option<NodeId> {
        self.index.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.len() == 1 && !self.nodes[ROOT_NODE].has_permissions()
    }

    /// Nodes in allocation order (parents before children)
    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &TreeNode)> {
        self.nodes.iter().enumerate()
    }

    /// Node ids from `id` up to the root, inclusive
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        std::iter::successors(Some(id), move |&n| self.nodes[n].parent)
    }

    fn warn_conflicts(&self) {
        for node in &self.nodes {
            for (subject, effected) in &node.permissions {
                for permission in effected.conflicts() {
                    warn!(
                        resource_type = %self.resource_type,
                        path = %node.path,
                        subject = %subject,
                        permission = %permission,
                        "permission both granted and revoked, revoke wins"
                    );
                }
            }
        }
    }
}

/// All resource trees of a policy plus the subjects declared per resource type
#[derive(Debug, Clone, Default)]
pub struct ResourceForest {
    trees: BTreeMap<SmartString, ResourceTree>,
    subjects: BTreeMap<SmartString, BTreeSet<SubjectId>>,
}

impl ResourceForest {
    /// Build trees for every resource type mentioned in the policy
    ///
    /// The policy is expected to be validated already.
    pub fn build(policy: &Policy) -> Self {
        let mut forest = Self::default();
        for entry in policy.entries() {
            for resource in entry.resources() {
                let resource_type = resource.key.resource_type();
                let tree = forest
                    .trees
                    .entry(resource_type.into())
                    .or_insert_with(|| ResourceTree::new(resource_type));
                let node = tree.insert_path(resource.key.path());
                trace!(
                    label = entry.label(),
                    resource = %resource.key,
                    node,
                    "attaching resource"
                );
                let declared = forest.subjects.entry(resource_type.into()).or_default();
                for subject in entry.subject_ids() {
                    tree.attach(node, subject, &resource.permissions);
                    declared.insert(subject.clone());
                }
            }
        }
        for tree in forest.trees.values() {
            tree.warn_conflicts();
        }
        forest
    }

    pub fn tree(&self, resource_type: &str) -> Option<&ResourceTree> {
        self.trees.get(resource_type)
    }

    pub fn trees(&self) -> impl Iterator<Item = &ResourceTree> {
        self.trees.values()
    }

    /// Subjects mentioned by any entry that has a resource of this type
    pub fn declared_subjects(&self, resource_type: &str) -> Option<&BTreeSet<SubjectId>> {
        self.subjects.get(resource_type)
    }

    pub fn declared(&self) -> &BTreeMap<SmartString, BTreeSet<SubjectId>> {
        &self.subjects
    }

    /// Total number of nodes across all trees
    pub fn node_count(&self) -> usize {
        self.trees.values().map(ResourceTree::len).sum()
    }
}
