use crate::schema::types::{FieldDefinition, FieldKind};
use chrono::{DateTime, NaiveDate};
use serde::Serialize;
use serde_json::Value;

/// Input widget a settings field is edited with
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum InputControl {
    Checkbox,
    Text { max_length: Option<u32> },
    /// `step` is the smallest increment allowed by the field's scale
    Number { step: f64, scale: u32 },
    Date,
    DateTime,
    /// Displayed but not editable
    ReadOnlyText,
}

impl InputControl {
    pub fn for_field(field: &FieldDefinition) -> Self {
        match &field.kind {
            FieldKind::Boolean => Self::Checkbox,
            FieldKind::String { length } => Self::Text { max_length: *length },
            FieldKind::Numeric { scale, .. } => Self::Number {
                step: 10f64.powi(-(i32::try_from(*scale).unwrap_or(i32::MAX))),
                scale: *scale,
            },
            FieldKind::Date => Self::Date,
            FieldKind::DateTime => Self::DateTime,
            FieldKind::Reference { .. } | FieldKind::Other { .. } => Self::ReadOnlyText,
        }
    }

    pub fn is_editable(&self) -> bool {
        !matches!(self, Self::ReadOnlyText)
    }

    /// Check `value` against the control. Null is always accepted.
    pub fn check(&self, value: &Value) -> Result<(), String> {
        if value.is_null() {
            return Ok(());
        }
        match self {
            Self::Checkbox => match value {
                Value::Bool(_) => Ok(()),
                other => Err(format!("expected true or false, got {}", other)),
            },
            Self::Text { max_length } => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected text, got {}", value))?;
                match max_length {
                    Some(max) if text.chars().count() > *max as usize => {
                        Err(format!("text longer than {} characters", max))
                    }
                    _ => Ok(()),
                }
            }
            Self::Number { scale, .. } => {
                let number = value
                    .as_f64()
                    .ok_or_else(|| format!("expected a number, got {}", value))?;
                let factor = 10f64.powi(i32::try_from(*scale).unwrap_or(i32::MAX));
                let scaled = number * factor;
                if (scaled - scaled.round()).abs() > 1e-6 {
                    Err(format!("at most {} decimal places allowed", scale))
                } else {
                    Ok(())
                }
            }
            Self::Date => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected a date, got {}", value))?;
                NaiveDate::parse_from_str(text, "%Y-%m-%d")
                    .map(|_| ())
                    .map_err(|e| format!("invalid date '{}': {}", text, e))
            }
            Self::DateTime => {
                let text = value
                    .as_str()
                    .ok_or_else(|| format!("expected a date-time, got {}", value))?;
                DateTime::parse_from_rfc3339(text)
                    .map(|_| ())
                    .map_err(|e| format!("invalid date-time '{}': {}", text, e))
            }
            Self::ReadOnlyText => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn control(kind: FieldKind) -> InputControl {
        InputControl::for_field(&FieldDefinition::new("F__c", "F", kind))
    }

    #[test]
    fn test_control_per_kind() {
        assert_eq!(control(FieldKind::Boolean), InputControl::Checkbox);
        assert_eq!(
            control(FieldKind::String { length: Some(10) }),
            InputControl::Text { max_length: Some(10) }
        );
        match control(FieldKind::Numeric { precision: Some(8), scale: 2 }) {
            InputControl::Number { step, scale } => {
                assert!((step - 0.01).abs() < 1e-12);
                assert_eq!(scale, 2);
            }
            other => panic!("unexpected control {other:?}"),
        }
        assert_eq!(control(FieldKind::Date), InputControl::Date);
        assert_eq!(control(FieldKind::DateTime), InputControl::DateTime);
        let read_only = control(FieldKind::Other { type_name: "Address".to_string() });
        assert!(!read_only.is_editable());
        assert_eq!(
            control(FieldKind::Reference { targets: vec!["User".to_string()] }),
            InputControl::ReadOnlyText
        );
    }

    #[test]
    fn test_value_checks() {
        assert!(InputControl::Checkbox.check(&json!(true)).is_ok());
        assert!(InputControl::Checkbox.check(&json!("yes")).is_err());

        let text = InputControl::Text { max_length: Some(3) };
        assert!(text.check(&json!("abc")).is_ok());
        assert!(text.check(&json!("abcd")).is_err());
        assert!(text.check(&Value::Null).is_ok());

        let number = InputControl::Number { step: 0.01, scale: 2 };
        assert!(number.check(&json!(12.5)).is_ok());
        assert!(number.check(&json!(12.345)).is_err());
        assert!(number.check(&json!("12")).is_err());

        assert!(InputControl::Date.check(&json!("2021-04-25")).is_ok());
        assert!(InputControl::Date.check(&json!("25.4.2021")).is_err());
        assert!(InputControl::DateTime
            .check(&json!("2021-04-25T10:00:00Z"))
            .is_ok());
        assert!(InputControl::DateTime.check(&json!("2021-04-25")).is_err());
    }
}
