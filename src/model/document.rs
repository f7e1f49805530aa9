/*!
 * Policy Documents
 * JSON wire shape of policies as stored by the persistence layer
 */

use super::policy::{Label, Policy, PolicyId};
use super::resource::ResourceKey;
use super::subject::SubjectId;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, TimestampSeconds};
use std::collections::{BTreeMap, BTreeSet};
use std::time::SystemTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyDocument {
    pub policy_id: PolicyId,
    #[serde(default)]
    pub revision: u64,
    #[serde(default)]
    pub entries: BTreeMap<Label, EntryDocument>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntryDocument {
    #[serde(default)]
    pub subjects: BTreeMap<SubjectId, SubjectDocument>,
    #[serde(default)]
    pub resources: BTreeMap<ResourceKey, ResourceDocument>,
}

#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectDocument {
    #[serde(rename = "type", default)]
    pub subject_type: String,
    #[serde_as(as = "Option<TimestampSeconds<i64>>")]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<SystemTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceDocument {
    #[serde(default)]
    pub grant: BTreeSet<String>,
    #[serde(default)]
    pub revoke: BTreeSet<String>,
}

impl From<Policy> for PolicyDocument {
    fn from(policy: Policy) -> Self {
        let entries = policy
            .entries()
            .map(|entry| {
                let subjects = entry
                    .subjects()
                    .map(|s| {
                        (
                            s.id.clone(),
                            SubjectDocument {
                                subject_type: s.subject_type.clone(),
                                expiry: s.expiry,
                            },
                        )
                    })
                    .collect();
                let resources = entry
                    .resource_map()
                    .iter()
                    .map(|(key, effected)| {
                        (
                            key.clone(),
                            ResourceDocument {
                                grant: effected.grant.iter().map(|p| p.to_string()).collect(),
                                revoke: effected.revoke.iter().map(|p| p.to_string()).collect(),
                            },
                        )
                    })
                    .collect();
                (entry.label().into(), EntryDocument { subjects, resources })
            })
            .collect();

        PolicyDocument {
            policy_id: policy.id().clone(),
            revision: policy.revision(),
            entries,
        }
    }
}
