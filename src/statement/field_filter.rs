use serde_json::Value;

use super::error::StatementError;
use super::types::Record;

/// Drops fields the client did not really provide: absent, `null` or `""`.
/// `0` and `false` are values and stay.
pub struct FieldFilter;

impl FieldFilter {
    pub fn is_provided(value: &Value) -> bool {
        match value {
            Value::Null => false,
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }

    pub fn present(record: &Record) -> Record {
        record
            .iter()
            .filter(|(_, value)| Self::is_provided(value))
            .map(|(field, value)| (field.to_string(), value.clone()))
            .collect()
    }

    /// Like [`present`](Self::present) but an empty result is an error, so no
    /// no-op statement is ever issued.
    pub fn apply(record: &Record) -> Result<Record, StatementError> {
        let filtered = Self::present(record);
        if filtered.is_empty() {
            return Err(StatementError::NoFieldsProvided);
        }
        Ok(filtered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn keeps_zero_and_false() {
        let record = Record::new()
            .with("nbr_invite", 0)
            .with("available", false)
            .with("description", "")
            .with("agence_id", Value::Null)
            .with("nom", "Salle A");

        let filtered = FieldFilter::apply(&record).unwrap();
        let fields: Vec<&str> = filtered.fields().collect();
        assert_eq!(fields, vec!["nbr_invite", "available", "nom"]);
        assert_eq!(filtered.get("nbr_invite"), Some(&json!(0)));
        assert_eq!(filtered.get("available"), Some(&json!(false)));
    }

    #[test]
    fn preserves_input_order() {
        let record = Record::new().with("z", 1).with("a", 2).with("m", 3);
        let filtered = FieldFilter::present(&record);
        assert_eq!(filtered.fields().collect::<Vec<_>>(), vec!["z", "a", "m"]);
    }

    #[test]
    fn empty_result_is_no_fields_provided() {
        let record = Record::new().with("nom", "").with("email", Value::Null);
        assert_eq!(FieldFilter::apply(&record), Err(StatementError::NoFieldsProvided));
        assert_eq!(FieldFilter::apply(&Record::new()), Err(StatementError::NoFieldsProvided));
    }

    #[test]
    fn whitespace_is_a_value() {
        let record = Record::new().with("details", " ");
        assert_eq!(FieldFilter::apply(&record).unwrap().len(), 1);
    }
}
