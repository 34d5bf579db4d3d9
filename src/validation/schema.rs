use std::collections::HashMap;

use serde_json::Value;

use super::error::ValidationError;
use super::rules::{Check, FieldRule};
use crate::statement::{FieldFilter, Record};

/// Declarative request schema for one operation.
#[derive(Debug)]
pub struct Schema {
    pub fields: &'static [FieldRule],
    pub checks: &'static [Check],
}

impl Schema {
    /// Validate a JSON body into a [`Record`] in declaration order.
    ///
    /// Unknown keys are dropped. Optional fields sent as `null` or `""` are
    /// passed through untouched so the field filter can discard them.
    pub fn validate(&self, body: &Value) -> Result<Record, ValidationError> {
        let object = body
            .as_object()
            .ok_or_else(|| ValidationError::body("Request body must be a JSON object"))?;

        let mut record = Record::new();
        let mut errors = HashMap::new();

        for rule in self.fields {
            let value = match object.get(rule.name) {
                Some(value) => value,
                None => {
                    if rule.required {
                        errors.insert(rule.name.to_string(), "This field is required".to_string());
                    }
                    continue;
                }
            };

            if !FieldFilter::is_provided(value) || is_blank(value) {
                if rule.required {
                    errors.insert(rule.name.to_string(), "This field is required".to_string());
                } else if is_blank(value) {
                    record.insert(rule.name, Value::from(""));
                } else {
                    record.insert(rule.name, value.clone());
                }
                continue;
            }

            match rule.kind.coerce(value) {
                Ok(coerced) => record.insert(rule.name, coerced),
                Err(message) => {
                    errors.insert(rule.name.to_string(), message);
                }
            }
        }

        for check in self.checks {
            apply_check(check, &record, &mut errors);
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(ValidationError::fields(errors))
        }
    }

    pub fn field(&self, name: &str) -> Option<&FieldRule> {
        self.fields.iter().find(|rule| rule.name == name)
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str().map(|s| s.trim().is_empty()).unwrap_or(false)
}

fn present<'r>(record: &'r Record, field: &str) -> Option<&'r Value> {
    record.get(field).filter(|value| FieldFilter::is_provided(value))
}

/// Both ends of a range when present and individually valid. Normalized ISO
/// strings of the same kind order lexically.
fn range<'r>(
    record: &'r Record,
    errors: &HashMap<String, String>,
    start: &str,
    end: &str,
) -> Option<(&'r str, &'r str)> {
    if errors.contains_key(start) || errors.contains_key(end) {
        return None;
    }
    match (present(record, start), present(record, end)) {
        (Some(Value::String(from)), Some(Value::String(to))) => Some((from.as_str(), to.as_str())),
        _ => None,
    }
}

fn apply_check(check: &Check, record: &Record, errors: &mut HashMap<String, String>) {
    match check {
        Check::Before { start, end } => {
            if let Some((from, to)) = range(record, errors, start, end) {
                if from >= to {
                    errors.insert(end.to_string(), format!("{} must be after {}", end, start));
                }
            }
        }
        Check::NotAfter { start, end } => {
            if let Some((from, to)) = range(record, errors, start, end) {
                if from > to {
                    errors.insert(end.to_string(), format!("{} must not be before {}", end, start));
                }
            }
        }
        Check::RequiredWhen { field, equals, required } => {
            let triggered = present(record, field).and_then(Value::as_str) == Some(*equals);
            if !triggered {
                return;
            }
            for name in required.iter() {
                if present(record, name).is_none() && !errors.contains_key(*name) {
                    errors.insert(name.to_string(), format!("Required when {} is '{}'", field, equals));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::rules::{FieldKind, ID, PRICE, TEXT};
    use serde_json::json;

    static STAY: Schema = Schema {
        fields: &[
            FieldRule::required("nom", TEXT),
            FieldRule::optional("description", TEXT),
            FieldRule::required("prix", PRICE),
            FieldRule::required("date_debut", FieldKind::Date),
            FieldRule::required("date_fin", FieldKind::Date),
            FieldRule::required("evenement_id", ID),
        ],
        checks: &[Check::Before { start: "date_debut", end: "date_fin" }],
    };

    static ACCOUNT: Schema = Schema {
        fields: &[
            FieldRule::required("type", FieldKind::OneOf(&["permanent", "temporaire"])),
            FieldRule::optional("activation_date", FieldKind::Date),
            FieldRule::optional("deactivation_date", FieldKind::Date),
        ],
        checks: &[Check::RequiredWhen {
            field: "type",
            equals: "temporaire",
            required: &["activation_date", "deactivation_date"],
        }],
    };

    #[test]
    fn produces_record_in_schema_order() {
        let body = json!({
            "evenement_id": "7",
            "date_fin": "2025-01-05",
            "nom": "  Acme Hall ",
            "prix": 100,
            "date_debut": "2025-01-01",
            "unexpected": "dropped"
        });
        let record = STAY.validate(&body).unwrap();
        let fields: Vec<&str> = record.fields().collect();
        assert_eq!(fields, vec!["nom", "prix", "date_debut", "date_fin", "evenement_id"]);
        assert_eq!(record.get("nom"), Some(&json!("Acme Hall")));
        assert_eq!(record.get("evenement_id"), Some(&json!(7)));
        assert!(!record.contains("unexpected"));
    }

    #[test]
    fn collects_every_field_error() {
        let err = STAY.validate(&json!({"nom": "", "prix": -3})).unwrap_err();
        assert!(err.field_errors.contains_key("nom"));
        assert!(err.field_errors.contains_key("prix"));
        assert!(err.field_errors.contains_key("date_debut"));
        assert!(err.field_errors.contains_key("evenement_id"));
    }

    #[test]
    fn optional_null_passes_through() {
        let body = json!({
            "nom": "Hall", "description": null, "prix": 0,
            "date_debut": "2025-01-01", "date_fin": "2025-01-02", "evenement_id": 1
        });
        let record = STAY.validate(&body).unwrap();
        assert_eq!(record.get("description"), Some(&Value::Null));
        assert_eq!(record.get("prix"), Some(&json!(0)));
    }

    #[test]
    fn start_must_precede_end() {
        let body = json!({
            "nom": "Hall", "prix": 10,
            "date_debut": "2025-01-05", "date_fin": "2025-01-01", "evenement_id": 1
        });
        let err = STAY.validate(&body).unwrap_err();
        assert_eq!(
            err.field_errors.get("date_fin").map(String::as_str),
            Some("date_fin must be after date_debut")
        );
    }

    #[test]
    fn inclusive_range_accepts_same_day() {
        static BOOKING: Schema = Schema {
            fields: &[
                FieldRule::required("date_debut", FieldKind::Date),
                FieldRule::required("date_fin", FieldKind::Date),
            ],
            checks: &[Check::NotAfter { start: "date_debut", end: "date_fin" }],
        };
        assert!(BOOKING.validate(&json!({"date_debut": "2025-01-01", "date_fin": "2025-01-01"})).is_ok());

        let err = BOOKING
            .validate(&json!({"date_debut": "2025-01-02", "date_fin": "2025-01-01"}))
            .unwrap_err();
        assert_eq!(
            err.field_errors.get("date_fin").map(String::as_str),
            Some("date_fin must not be before date_debut")
        );
    }

    #[test]
    fn conditional_requirements() {
        let err = ACCOUNT.validate(&json!({"type": "temporaire"})).unwrap_err();
        assert_eq!(err.field_errors.len(), 2);
        assert!(ACCOUNT.validate(&json!({"type": "permanent"})).is_ok());
        assert!(ACCOUNT
            .validate(&json!({"type": "temporaire", "activation_date": "2025-01-01", "deactivation_date": "2025-02-01"}))
            .is_ok());
    }

    #[test]
    fn body_must_be_an_object() {
        let err = STAY.validate(&json!([1, 2])).unwrap_err();
        assert_eq!(err.message, "Request body must be a JSON object");
    }
}
