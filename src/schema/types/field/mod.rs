mod kind;

pub use kind::FieldKind;

use serde::{Deserialize, Serialize};

/// Metadata of one field as reported by the schema directory.
///
/// Snapshots are never mutated by the resolver or the managers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// API name, the segment used in dotted paths
    pub api_name: String,
    /// Display label
    pub label: String,
    #[serde(flatten)]
    pub kind: FieldKind,
}

impl FieldDefinition {
    pub fn new(api_name: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            api_name: api_name.into(),
            label: label.into(),
            kind,
        }
    }

    /// Reference field pointing at the given objects
    pub fn reference<I, S>(api_name: impl Into<String>, label: impl Into<String>, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            api_name,
            label,
            FieldKind::Reference {
                targets: targets.into_iter().map(Into::into).collect(),
            },
        )
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        self.kind.is_reference()
    }

    /// Custom fields carry the `__c` suffix
    #[must_use]
    pub fn is_custom(&self) -> bool {
        self.api_name.ends_with("__c")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_catalog_entries() {
        let fields: Vec<FieldDefinition> = serde_json::from_value(json!([
            {"apiName": "Name", "label": "Name", "dataType": "string", "length": 80},
            {"apiName": "Amount__c", "label": "Amount", "dataType": "numeric", "precision": 18, "scale": 2},
            {"apiName": "Paid__c", "label": "Paid", "dataType": "boolean"},
            {"apiName": "Owner", "label": "Owner", "dataType": "reference", "targets": ["User", "Group"]},
            {"apiName": "Location", "label": "Location", "dataType": "other", "typeName": "Address"}
        ]))
        .unwrap();

        assert_eq!(fields[0].kind, FieldKind::String { length: Some(80) });
        assert_eq!(
            fields[1].kind,
            FieldKind::Numeric {
                precision: Some(18),
                scale: 2
            }
        );
        assert!(fields[1].is_custom());
        assert!(!fields[0].is_custom());
        assert_eq!(fields[3].kind.reference_targets(), ["User", "Group"]);
        assert_eq!(fields[4].kind.type_name(), "Address");
    }

    #[test]
    fn test_missing_optional_metadata() {
        let field: FieldDefinition = serde_json::from_value(json!(
            {"apiName": "Memo", "label": "Memo", "dataType": "string"}
        ))
        .unwrap();
        assert_eq!(field.kind, FieldKind::String { length: None });
        assert!(serde_json::from_value::<FieldDefinition>(json!(
            {"apiName": "X", "label": "X", "dataType": "blob"}
        ))
        .is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            FieldDefinition::reference("Owner", "Owner", ["User"]).kind.to_string(),
            "reference -> User"
        );
        assert_eq!(FieldKind::DateTime.to_string(), "datetime");
    }
}
