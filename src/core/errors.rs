/*!
 * Error Types
 * Policy validation errors with thiserror, miette, and serde support
 *
 * Only construction can fail. Query operations express denial as `false`
 * or an empty result, never as an error.
 */

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use thiserror::Error;

/// Result type for policy construction and validation
pub type PolicyResult<T> = Result<T, PolicyError>;

/// Configuration errors detected while validating a policy or building an enforcer
#[derive(Error, Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Diagnostic)]
#[serde(tag = "error_type", content = "details", rename_all = "snake_case")]
pub enum PolicyError {
    #[error("Malformed resource path: {0}")]
    #[diagnostic(
        code(policy::malformed_path),
        help("Paths are slash separated and must not contain control characters.")
    )]
    MalformedPath(SmartString),

    #[error("Malformed resource key: {0}")]
    #[diagnostic(
        code(policy::malformed_resource_key),
        help("Resource keys have the form `type:/path`, e.g. `thing:/attributes`.")
    )]
    MalformedResourceKey(SmartString),

    #[error("Unknown resource type: {0}")]
    #[diagnostic(
        code(policy::unknown_resource_type),
        help("Add the type to the enforcer configuration or fix the policy entry.")
    )]
    UnknownResourceType(SmartString),

    #[error("Unresolvable permission: {0}")]
    #[diagnostic(
        code(policy::unknown_permission),
        help("Permission names are non-empty, contain no whitespace and must be configured.")
    )]
    UnknownPermission(SmartString),

    #[error("Malformed subject id: {0}")]
    #[diagnostic(
        code(policy::malformed_subject),
        help("Subject ids have the form `issuer:name`.")
    )]
    MalformedSubjectId(SmartString),

    #[error("Policy entry '{0}' has no subjects")]
    #[diagnostic(
        code(policy::empty_subjects),
        help("Every policy entry needs at least one subject.")
    )]
    EmptySubjects(SmartString),

    #[error("Malformed policy document: {0}")]
    #[diagnostic(
        code(policy::malformed_document),
        help("Check the document against the policy JSON format.")
    )]
    MalformedDocument(SmartString),

    #[error("Invalid configuration: {0}")]
    #[diagnostic(
        code(policy::invalid_config),
        help("Check the ENFORCER_* environment variables.")
    )]
    InvalidConfig(SmartString),
}

impl From<serde_json::Error> for PolicyError {
    fn from(err: serde_json::Error) -> Self {
        PolicyError::MalformedDocument(err.to_string().into())
    }
}
