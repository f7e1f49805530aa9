/*!
 * Subjects
 * Authenticated identities that permissions are granted to or revoked from
 */

use crate::core::errors::{PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use smartstring::alias::String as SmartString;
use std::fmt;
use std::time::SystemTime;

/// Globally unique `issuer:name` subject identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(SmartString);

impl SubjectId {
    pub fn new(id: impl Into<SmartString>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Issuer part before the first `:`
    pub fn issuer(&self) -> Option<&str> {
        self.0.split_once(':').map(|(issuer, _)| issuer)
    }

    /// Check the `issuer:name` shape
    pub fn validate(&self) -> PolicyResult<()> {
        match self.0.split_once(':') {
            Some((issuer, name)) if !issuer.is_empty() && !name.is_empty() => Ok(()),
            _ => Err(PolicyError::MalformedSubjectId(self.0.clone())),
        }
    }
}

impl From<&str> for SubjectId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl From<String> for SubjectId {
    fn from(id: String) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for SubjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for SubjectId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// A subject declared in a policy entry
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Subject {
    pub id: SubjectId,
    /// Descriptive only, never consulted during resolution
    #[serde(rename = "type", default)]
    pub subject_type: String,
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<SystemTime>,
}

impl Subject {
    pub fn new(id: impl Into<SubjectId>, subject_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject_type: subject_type.into(),
            expiry: None,
        }
    }

    pub fn with_expiry(mut self, expiry: SystemTime) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Whether the subject expired before `now`
    pub fn is_expired(&self, now: SystemTime) -> bool {
        self.expiry.map_or(false, |expiry| expiry <= now)
    }
}
