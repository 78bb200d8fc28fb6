use serde::{Deserialize, Serialize};
use std::fmt;

/// Enumeration over all field kinds a schema can report.
///
/// Each kind carries the metadata the consumers need for it: maximum length
/// for strings, precision and scale for numbers, target objects for
/// references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "dataType", rename_all = "lowercase")]
pub enum FieldKind {
    Boolean,
    String {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        length: Option<u32>,
    },
    Numeric {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        precision: Option<u32>,
        #[serde(default)]
        scale: u32,
    },
    Date,
    #[serde(rename = "datetime")]
    DateTime,
    /// Relationship to records of other objects, in declaration order
    Reference { targets: Vec<String> },
    /// Any type the directory reports that has no dedicated handling
    Other {
        #[serde(rename = "typeName")]
        type_name: String,
    },
}

impl FieldKind {
    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference { .. })
    }

    /// Declared reference targets; empty for non-reference kinds.
    #[must_use]
    pub fn reference_targets(&self) -> &[String] {
        match self {
            Self::Reference { targets } => targets,
            _ => &[],
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &str {
        match self {
            Self::Boolean => "boolean",
            Self::String { .. } => "string",
            Self::Numeric { .. } => "numeric",
            Self::Date => "date",
            Self::DateTime => "datetime",
            Self::Reference { .. } => "reference",
            Self::Other { type_name } => type_name,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String { length: Some(length) } => write!(f, "string({})", length),
            Self::Numeric {
                precision: Some(precision),
                scale,
            } => write!(f, "numeric({}, {})", precision, scale),
            Self::Reference { targets } => write!(f, "reference -> {}", targets.join(" | ")),
            other => f.write_str(other.type_name()),
        }
    }
}
