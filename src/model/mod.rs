/*!
 * Resource Model
 * Immutable value types for subjects, permissions, resources and policies
 */

pub mod context;
pub mod document;
pub mod permission;
pub mod policy;
pub mod resource;
pub mod subject;

pub use context::{AuthorizationContext, EffectedSubjectIds};
pub use document::PolicyDocument;
pub use permission::{
    permissions, EffectedPermissions, Permission, Permissions, ADMINISTRATE, READ, WRITE,
};
pub use policy::{Label, Policy, PolicyEntry, PolicyId, Resource};
pub use resource::{ResourceKey, ResourcePath, ROOT};
pub use subject::{Subject, SubjectId};
