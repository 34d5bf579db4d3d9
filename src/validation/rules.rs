use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde_json::{Number, Value};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldKind {
    Text { min: usize },
    Email,
    Integer { min: Option<i64> },
    Number { min: Option<f64> },
    Boolean,
    /// Calendar date, normalized to `YYYY-MM-DD`.
    Date,
    /// Date and time, normalized to `YYYY-MM-DDTHH:MM:SS`.
    Timestamp,
    /// `HH:MM` or `HH:MM:SS`, normalized to the latter.
    Time,
    OneOf(&'static [&'static str]),
    IntegerList { min_len: usize },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRule {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldRule {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: true }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self { name, kind, required: false }
    }
}

/// Cross-field rules evaluated after every field has been coerced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Check {
    /// `start` strictly earlier than `end`.
    Before {
        start: &'static str,
        end: &'static str,
    },
    /// `start` earlier than or equal to `end`; a range may cover one day.
    NotAfter {
        start: &'static str,
        end: &'static str,
    },
    RequiredWhen {
        field: &'static str,
        equals: &'static str,
        required: &'static [&'static str],
    },
}

pub const TEXT: FieldKind = FieldKind::Text { min: 1 };
pub const ID: FieldKind = FieldKind::Integer { min: Some(1) };
pub const COUNT: FieldKind = FieldKind::Integer { min: Some(0) };
pub const PRICE: FieldKind = FieldKind::Number { min: Some(0.0) };
pub const PHONE: FieldKind = FieldKind::Integer { min: Some(0) };

impl FieldKind {
    /// Coerce a non-empty JSON value, or describe why it is rejected.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        match self {
            FieldKind::Text { min } => {
                let text = value.as_str().ok_or("Expected a string")?.trim();
                if text.chars().count() < *min {
                    return Err(format!("Must be at least {} characters", min));
                }
                Ok(Value::from(text))
            }
            FieldKind::Email => {
                let text = value.as_str().ok_or("Expected a string")?.trim();
                if !is_email(text) {
                    return Err("Invalid email address".to_string());
                }
                Ok(Value::from(text))
            }
            FieldKind::Integer { min } => {
                let n = as_integer(value).ok_or("Expected an integer")?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("Must be at least {}", min));
                    }
                }
                Ok(Value::from(n))
            }
            FieldKind::Number { min } => {
                let number = as_number(value).ok_or("Expected a number")?;
                let n = number.as_f64().ok_or("Expected a number")?;
                if let Some(min) = min {
                    if n < *min {
                        return Err(format!("Must be at least {}", min));
                    }
                }
                Ok(Value::Number(number))
            }
            FieldKind::Boolean => match value {
                Value::Bool(b) => Ok(Value::Bool(*b)),
                Value::String(s) if s == "true" => Ok(Value::Bool(true)),
                Value::String(s) if s == "false" => Ok(Value::Bool(false)),
                _ => Err("Expected a boolean".to_string()),
            },
            FieldKind::Date => {
                let text = value.as_str().ok_or("Expected a date string")?.trim();
                let date = parse_datetime(text)
                    .map(|dt| dt.date())
                    .ok_or("Invalid date, expected YYYY-MM-DD")?;
                Ok(Value::from(date.format("%Y-%m-%d").to_string()))
            }
            FieldKind::Timestamp => {
                let text = value.as_str().ok_or("Expected a date-time string")?.trim();
                let dt = parse_datetime(text).ok_or("Invalid date-time")?;
                Ok(Value::from(dt.format("%Y-%m-%dT%H:%M:%S").to_string()))
            }
            FieldKind::Time => {
                let text = value.as_str().ok_or("Expected a time string")?.trim();
                let time = NaiveTime::parse_from_str(text, "%H:%M:%S")
                    .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
                    .map_err(|_| "Invalid time, expected HH:MM or HH:MM:SS")?;
                Ok(Value::from(time.format("%H:%M:%S").to_string()))
            }
            FieldKind::OneOf(allowed) => {
                let text = value.as_str().ok_or("Expected a string")?.trim();
                if !allowed.contains(&text) {
                    return Err(format!("Must be one of: {}", allowed.join(", ")));
                }
                Ok(Value::from(text))
            }
            FieldKind::IntegerList { min_len } => {
                let items = value.as_array().ok_or("Expected an array of integers")?;
                let ids = items
                    .iter()
                    .map(as_integer)
                    .collect::<Option<Vec<i64>>>()
                    .ok_or("Expected an array of integers")?;
                if ids.len() < *min_len {
                    return Err(format!("Must contain at least {} item(s)", min_len));
                }
                Ok(Value::from(ids))
            }
        }
    }
}

fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                .map(|f| f as i64)
        }),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_number(value: &Value) -> Option<Number> {
    match value {
        Value::Number(n) => Some(n.clone()),
        Value::String(s) => {
            let s = s.trim();
            match s.parse::<i64>() {
                Ok(i) => Some(Number::from(i)),
                Err(_) => s.parse::<f64>().ok().and_then(Number::from_f64),
            }
        }
        _ => None,
    }
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn is_email(text: &str) -> bool {
    let mut parts = text.split('@');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(local), Some(domain), None) => {
            !local.is_empty()
                && !text.contains(char::is_whitespace)
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        _ => false,
    }
}
