use crate::error::{FieldSyncError, FieldSyncResult};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator between traversal segments
pub const PATH_SEPARATOR: char = '.';

/// Dotted field path such as `Owner.Email`.
///
/// Only structure is checked: at least one segment, no empty segments, no
/// whitespace. Whether the path exists in a schema is the resolver's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    segments: Vec<String>,
}

impl FieldPath {
    pub fn from_segments<I, S>(segments: I) -> FieldSyncResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(FieldSyncError::invalid_path("", "path has no segments"));
        }
        for segment in &segments {
            check_segment(segment).map_err(|reason| {
                FieldSyncError::invalid_path(segments.join("."), reason)
            })?;
        }
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Number of traversals, equal to the navigation depth that produced it
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// The leaf attribute name
    pub fn terminal(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    /// Whether the path hops across at least one reference
    pub fn is_traversal(&self) -> bool {
        self.segments.len() > 1
    }
}

fn check_segment(segment: &str) -> Result<(), String> {
    if segment.is_empty() {
        return Err("empty segment".to_string());
    }
    if segment.contains(PATH_SEPARATOR) {
        return Err(format!("segment '{}' contains a separator", segment));
    }
    if segment.chars().any(char::is_whitespace) {
        return Err(format!("segment '{}' contains whitespace", segment));
    }
    Ok(())
}

impl FromStr for FieldPath {
    type Err = FieldSyncError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(FieldSyncError::invalid_path(s, "path is empty"));
        }
        let segments: Vec<&str> = s.split(PATH_SEPARATOR).collect();
        for segment in &segments {
            check_segment(segment).map_err(|reason| FieldSyncError::invalid_path(s, reason))?;
        }
        Ok(Self {
            segments: segments.into_iter().map(str::to_string).collect(),
        })
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segments.join("."))
    }
}

impl Serialize for FieldPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
