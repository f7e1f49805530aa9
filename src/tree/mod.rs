/*!
 * Resource Trees
 * Construction of per-type path trees and the resolution contract over them
 */

pub mod builder;
pub mod resolver;

pub use builder::{NodeId, ResourceForest, ResourceTree, TreeNode, ROOT_NODE};
pub use resolver::{
    has_partial_permissions, has_unrestricted_permissions, subject_ids_with_partial_permission,
    subject_ids_with_permission, PermissionResolver, Verdict,
};
