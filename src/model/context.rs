/*!
 * Authorization Context
 * Caller identities and subject-set query results
 */

use super::subject::SubjectId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Subject ids a request executes under
///
/// Order is kept for diagnostics only; resolution treats the ids as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationContext {
    subjects: Vec<SubjectId>,
}

impl AuthorizationContext {
    pub fn new<I, S>(subjects: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SubjectId>,
    {
        let mut seen = BTreeSet::new();
        let subjects = subjects
            .into_iter()
            .map(Into::into)
            .filter(|id: &SubjectId| seen.insert(id.clone()))
            .collect();
        Self { subjects }
    }

    pub fn subjects(&self) -> &[SubjectId] {
        &self.subjects
    }

    pub fn is_empty(&self) -> bool {
        self.subjects.is_empty()
    }

    pub fn len(&self) -> usize {
        self.subjects.len()
    }

    pub fn contains(&self, id: &SubjectId) -> bool {
        self.subjects.contains(id)
    }
}

/// Subjects granted and revoked for a resource and permission set
///
/// `granted` and `revoked` are disjoint; together they cover every subject
/// declared for the resource type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EffectedSubjectIds {
    pub granted: BTreeSet<SubjectId>,
    pub revoked: BTreeSet<SubjectId>,
}

impl EffectedSubjectIds {
    pub fn is_granted(&self, id: &SubjectId) -> bool {
        self.granted.contains(id)
    }

    /// Every subject covered by this result
    pub fn all(&self) -> BTreeSet<SubjectId> {
        self.granted.union(&self.revoked).cloned().collect()
    }
}
