/*!
 * Resource Keys
 * Normalized slash-separated paths scoped to a resource type
 */

use crate::core::errors::{PolicyError, PolicyResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use smartstring::alias::String as SmartString;
use std::fmt;
use std::str::FromStr;

/// Root path of every resource tree
pub const ROOT: &str = "/";

/// Normalized resource path
///
/// Always starts with `/`, never ends with `/` (except the root itself) and
/// never contains empty segments. Comparison is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourcePath(String);

impl ResourcePath {
    /// The root path `/`
    pub fn root() -> Self {
        Self(ROOT.to_string())
    }

    /// Parse and normalize a path
    ///
    /// `attributes//location/` normalizes to `/attributes/location`.
    pub fn parse(raw: &str) -> PolicyResult<Self> {
        if raw.chars().any(char::is_control) {
            return Err(PolicyError::MalformedPath(raw.into()));
        }
        let mut normalized = String::with_capacity(raw.len() + 1);
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            normalized.push('/');
            normalized.push_str(segment);
        }
        if normalized.is_empty() {
            normalized.push('/');
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT
    }

    /// Path segments, empty for the root
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments below the root
    pub fn depth(&self) -> usize {
        self.segments().count()
    }

    /// Parent path, `None` for the root
    pub fn parent(&self) -> Option<Self> {
        parent_of(&self.0).map(|p| Self(p.to_string()))
    }

    /// Child path with the given field appended
    ///
    /// Slashes inside `field` introduce further segments.
    pub fn child(&self, field: &str) -> Self {
        let mut path = self.0.clone();
        for segment in field.split('/').filter(|s| !s.is_empty()) {
            if !path.ends_with('/') {
                path.push('/');
            }
            path.push_str(segment);
        }
        Self(path)
    }

    /// Whether `self` equals `other` or lies below it
    pub fn is_within(&self, other: &ResourcePath) -> bool {
        is_within(&self.0, &other.0)
    }
}

/// Parent of a normalized path string, `None` for the root
pub(crate) fn parent_of(path: &str) -> Option<&str> {
    if path == ROOT {
        return None;
    }
    match path.rfind('/') {
        Some(0) => Some(ROOT),
        Some(idx) => Some(&path[..idx]),
        None => None,
    }
}

/// Whether normalized `path` equals `ancestor` or lies below it
pub(crate) fn is_within(path: &str, ancestor: &str) -> bool {
    if ancestor == ROOT {
        return true;
    }
    match path.strip_prefix(ancestor) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

impl Default for ResourcePath {
    fn default() -> Self {
        Self::root()
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ResourcePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resource type plus path, e.g. `thing:/attributes/location`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceKey {
    resource_type: SmartString,
    path: ResourcePath,
}

impl ResourceKey {
    /// Create a key, validating the type and normalizing the path
    pub fn new(resource_type: &str, path: &str) -> PolicyResult<Self> {
        validate_resource_type(resource_type)?;
        Ok(Self {
            resource_type: resource_type.into(),
            path: ResourcePath::parse(path)?,
        })
    }

    /// Create a key from an already normalized path
    pub fn from_parts(resource_type: &str, path: ResourcePath) -> PolicyResult<Self> {
        validate_resource_type(resource_type)?;
        Ok(Self {
            resource_type: resource_type.into(),
            path,
        })
    }

    /// Root key of a resource type
    pub fn root(resource_type: &str) -> PolicyResult<Self> {
        Self::from_parts(resource_type, ResourcePath::root())
    }

    pub fn resource_type(&self) -> &str {
        &self.resource_type
    }

    pub fn path(&self) -> &ResourcePath {
        &self.path
    }

    /// Key of a child field under this key
    pub fn child(&self, field: &str) -> Self {
        Self {
            resource_type: self.resource_type.clone(),
            path: self.path.child(field),
        }
    }

    /// Key of the parent path, `None` at the root
    pub fn parent(&self) -> Option<Self> {
        self.path.parent().map(|path| Self {
            resource_type: self.resource_type.clone(),
            path,
        })
    }
}

fn validate_resource_type(resource_type: &str) -> PolicyResult<()> {
    let valid = !resource_type.is_empty()
        && resource_type
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PolicyError::MalformedResourceKey(resource_type.into()))
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.resource_type, self.path)
    }
}

impl FromStr for ResourceKey {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (resource_type, path) = s
            .split_once(':')
            .ok_or_else(|| PolicyError::MalformedResourceKey(s.into()))?;
        Self::new(resource_type, path)
    }
}

impl Serialize for ResourceKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ResourceKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
