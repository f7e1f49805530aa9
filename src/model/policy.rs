/*!
 * Policy Aggregate
 * Labeled entries binding subjects to grants and revokes on resources
 */

use super::document::PolicyDocument;
use super::permission::{permissions, EffectedPermissions};
use super::resource::ResourceKey;
use super::subject::{Subject, SubjectId};
use crate::core::config::EnforcerConfig;
use crate::core::errors::{PolicyError, PolicyResult};
use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::collections::BTreeMap;
use std::fmt;
use std::time::SystemTime;
use tracing::warn;

/// Identifier of a policy, e.g. `org.example:my-policy`
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PolicyId(SmartString);

impl PolicyId {
    pub fn new(id: impl Into<SmartString>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PolicyId {
    fn from(id: &str) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for PolicyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique key of an entry within a policy
pub type Label = SmartString;

/// A resource key with the grants and revokes an entry attaches to it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resource {
    pub key: ResourceKey,
    pub permissions: EffectedPermissions,
}

/// One labeled entry of a policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyEntry {
    label: Label,
    subjects: BTreeMap<SubjectId, Subject>,
    resources: BTreeMap<ResourceKey, EffectedPermissions>,
}

impl PolicyEntry {
    pub fn new(label: impl Into<Label>) -> Self {
        Self {
            label: label.into(),
            subjects: BTreeMap::new(),
            resources: BTreeMap::new(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subjects.insert(subject.id.clone(), subject);
        self
    }

    /// Attach permissions to a resource; repeated keys combine by set union
    pub fn with_resource(mut self, key: ResourceKey, effected: EffectedPermissions) -> Self {
        self.resources.entry(key).or_default().merge(&effected);
        self
    }

    /// Grant permissions on a `type:/path` key
    pub fn grant<I, S>(self, key: &str, names: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = key.parse()?;
        Ok(self.with_resource(key, EffectedPermissions::granting(names)))
    }

    /// Revoke permissions on a `type:/path` key
    pub fn revoke<I, S>(self, key: &str, names: I) -> PolicyResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let key = key.parse()?;
        Ok(self.with_resource(key, EffectedPermissions::revoking(names)))
    }

    pub fn subjects(&self) -> impl Iterator<Item = &Subject> {
        self.subjects.values()
    }

    pub fn subject_ids(&self) -> impl Iterator<Item = &SubjectId> {
        self.subjects.keys()
    }

    pub fn resources(&self) -> impl Iterator<Item = Resource> + '_ {
        self.resources.iter().map(|(key, permissions)| Resource {
            key: key.clone(),
            permissions: permissions.clone(),
        })
    }

    pub(crate) fn resource_map(&self) -> &BTreeMap<ResourceKey, EffectedPermissions> {
        &self.resources
    }

    /// Structural checks independent of any configuration
    pub fn validate(&self) -> PolicyResult<()> {
        if self.subjects.is_empty() {
            return Err(PolicyError::EmptySubjects(self.label.clone()));
        }
        for id in self.subjects.keys() {
            id.validate()?;
        }
        for effected in self.resources.values() {
            for permission in effected.mentioned() {
                permission.validate()?;
            }
        }
        Ok(())
    }
}

/// Immutable snapshot of a policy at one revision
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "PolicyDocument", into = "PolicyDocument")]
pub struct Policy {
    id: PolicyId,
    revision: u64,
    entries: BTreeMap<Label, PolicyEntry>,
}

impl Policy {
    pub fn new(id: impl Into<PolicyId>, revision: u64) -> Self {
        Self {
            id: id.into(),
            revision,
            entries: BTreeMap::new(),
        }
    }

    /// Add an entry, replacing any entry with the same label
    pub fn with_entry(mut self, entry: PolicyEntry) -> Self {
        self.entries.insert(entry.label.clone(), entry);
        self
    }

    /// Parse the JSON policy document format
    pub fn from_json(json: &str) -> PolicyResult<Self> {
        let document: PolicyDocument = serde_json::from_str(json)?;
        Self::try_from(document)
    }

    pub fn to_json(&self) -> PolicyResult<String> {
        Ok(serde_json::to_string(&PolicyDocument::from(self.clone()))?)
    }

    pub fn id(&self) -> &PolicyId {
        &self.id
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entries(&self) -> impl Iterator<Item = &PolicyEntry> {
        self.entries.values()
    }

    pub fn entry(&self, label: &str) -> Option<&PolicyEntry> {
        self.entries.get(label)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Structural checks on every entry
    pub fn validate(&self) -> PolicyResult<()> {
        self.entries.values().try_for_each(PolicyEntry::validate)
    }

    /// Structural checks plus the resource types and permissions a configuration accepts
    pub fn validate_with(&self, config: &EnforcerConfig) -> PolicyResult<()> {
        self.validate()?;
        for entry in self.entries.values() {
            for (key, effected) in &entry.resources {
                if !config.accepts_resource_type(key.resource_type()) {
                    return Err(PolicyError::UnknownResourceType(key.resource_type().into()));
                }
                if let Some(permission) = effected
                    .mentioned()
                    .find(|p| !config.accepts_permission(p.as_str()))
                {
                    return Err(PolicyError::UnknownPermission(permission.as_str().into()));
                }
            }
        }
        Ok(())
    }

    /// Copy without subjects expired at `now`
    ///
    /// Entries left without any subject are removed.
    pub fn without_expired_subjects(&self, now: SystemTime) -> Self {
        let mut entries = BTreeMap::new();
        for (label, entry) in &self.entries {
            let mut kept = entry.clone();
            kept.subjects.retain(|id, subject| {
                let expired = subject.is_expired(now);
                if expired {
                    warn!(policy_id = %self.id, label = %label, subject = %id, "dropping expired subject");
                }
                !expired
            });
            if !kept.subjects.is_empty() {
                entries.insert(label.clone(), kept);
            }
        }
        Self {
            id: self.id.clone(),
            revision: self.revision,
            entries,
        }
    }
}

impl TryFrom<PolicyDocument> for Policy {
    type Error = PolicyError;

    fn try_from(document: PolicyDocument) -> Result<Self, Self::Error> {
        let mut policy = Policy::new(document.policy_id, document.revision);
        for (label, entry_doc) in document.entries {
            let mut entry = PolicyEntry::new(label);
            for (id, subject_doc) in entry_doc.subjects {
                entry = entry.with_subject(Subject {
                    id,
                    subject_type: subject_doc.subject_type,
                    expiry: subject_doc.expiry,
                });
            }
            for (key, resource_doc) in entry_doc.resources {
                entry = entry.with_resource(
                    key,
                    EffectedPermissions::new(
                        permissions(resource_doc.grant),
                        permissions(resource_doc.revoke),
                    ),
                );
            }
            policy = policy.with_entry(entry);
        }
        policy.validate()?;
        Ok(policy)
    }
}
