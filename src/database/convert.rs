use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde_json::{Map, Number, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::query::Query;
use sqlx::types::BigDecimal;
use sqlx::{Column, Postgres, Row, TypeInfo};

/// Postgres column types grouped by how they map to JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PgKind {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Numeric,
    Text,
    Date,
    Time,
    Timestamp,
    TimestampTz,
    Json,
    IntArray,
    BigIntArray,
    TextArray,
    Other,
}

impl PgKind {
    pub fn from_type_name(name: &str) -> Self {
        match name {
            "BOOL" => PgKind::Bool,
            "INT2" => PgKind::Int2,
            "INT4" => PgKind::Int4,
            "INT8" => PgKind::Int8,
            "FLOAT4" => PgKind::Float4,
            "FLOAT8" => PgKind::Float8,
            "NUMERIC" => PgKind::Numeric,
            "TEXT" | "VARCHAR" | "BPCHAR" | "NAME" | "CHAR" => PgKind::Text,
            "DATE" => PgKind::Date,
            "TIME" => PgKind::Time,
            "TIMESTAMP" => PgKind::Timestamp,
            "TIMESTAMPTZ" => PgKind::TimestampTz,
            "JSON" | "JSONB" => PgKind::Json,
            "INT4[]" | "INT2[]" => PgKind::IntArray,
            "INT8[]" => PgKind::BigIntArray,
            "TEXT[]" | "VARCHAR[]" => PgKind::TextArray,
            _ => PgKind::Other,
        }
    }
}

pub fn row_to_json(row: &PgRow) -> Map<String, Value> {
    let mut map = Map::new();
    for column in row.columns() {
        let kind = PgKind::from_type_name(column.type_info().name());
        map.insert(column.name().to_string(), column_value(row, column.ordinal(), kind));
    }
    map
}

fn column_value(row: &PgRow, i: usize, kind: PgKind) -> Value {
    let value = match kind {
        PgKind::Bool => row.try_get::<Option<bool>, _>(i).ok().flatten().map(Value::Bool),
        PgKind::Int2 => row.try_get::<Option<i16>, _>(i).ok().flatten().map(Value::from),
        PgKind::Int4 => row.try_get::<Option<i32>, _>(i).ok().flatten().map(Value::from),
        PgKind::Int8 => row.try_get::<Option<i64>, _>(i).ok().flatten().map(Value::from),
        PgKind::Float4 => row
            .try_get::<Option<f32>, _>(i)
            .ok()
            .flatten()
            .map(|f| float_value(f as f64)),
        PgKind::Float8 => row.try_get::<Option<f64>, _>(i).ok().flatten().map(float_value),
        PgKind::Numeric => row
            .try_get::<Option<BigDecimal>, _>(i)
            .ok()
            .flatten()
            .map(|d| numeric_value(&d.to_string())),
        PgKind::Text => row.try_get::<Option<String>, _>(i).ok().flatten().map(Value::String),
        PgKind::Date => row
            .try_get::<Option<NaiveDate>, _>(i)
            .ok()
            .flatten()
            .map(|d| Value::String(d.format("%Y-%m-%d").to_string())),
        PgKind::Time => row
            .try_get::<Option<NaiveTime>, _>(i)
            .ok()
            .flatten()
            .map(|t| Value::String(t.format("%H:%M:%S").to_string())),
        PgKind::Timestamp => row
            .try_get::<Option<NaiveDateTime>, _>(i)
            .ok()
            .flatten()
            .map(|t| Value::String(t.format("%Y-%m-%dT%H:%M:%S").to_string())),
        PgKind::TimestampTz => row
            .try_get::<Option<DateTime<Utc>>, _>(i)
            .ok()
            .flatten()
            .map(|t| Value::String(t.to_rfc3339())),
        PgKind::Json => row.try_get::<Option<Value>, _>(i).ok().flatten(),
        PgKind::IntArray => row.try_get::<Option<Vec<i32>>, _>(i).ok().flatten().map(Value::from),
        PgKind::BigIntArray => row.try_get::<Option<Vec<i64>>, _>(i).ok().flatten().map(Value::from),
        PgKind::TextArray => row.try_get::<Option<Vec<String>>, _>(i).ok().flatten().map(Value::from),
        // Enums and other labels arrive as text.
        PgKind::Other => row
            .try_get_unchecked::<Option<String>, _>(i)
            .ok()
            .flatten()
            .map(Value::String),
    };
    value.unwrap_or(Value::Null)
}

fn float_value(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// NUMERIC keeps integers exact and falls back to the decimal string when the
/// value does not fit an f64.
pub fn numeric_value(text: &str) -> Value {
    if let Ok(i) = text.parse::<i64>() {
        return Value::from(i);
    }
    match text.parse::<f64>().ok().and_then(Number::from_f64) {
        Some(n) => Value::Number(n),
        None => Value::String(text.to_string()),
    }
}

pub fn bind_param<'q>(
    q: Query<'q, Postgres, PgArguments>,
    v: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match v {
        Value::Null => q.bind(None::<String>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(items) => {
            if !items.is_empty() && items.iter().all(Value::is_i64) {
                let ints: Vec<i64> = items.iter().filter_map(Value::as_i64).collect();
                q.bind(ints)
            } else if items.iter().all(Value::is_string) {
                let texts: Vec<String> = items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect();
                q.bind(texts)
            } else {
                q.bind(v.clone())
            }
        }
        Value::Object(_) => q.bind(v.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn classifies_type_names() {
        assert_eq!(PgKind::from_type_name("INT4"), PgKind::Int4);
        assert_eq!(PgKind::from_type_name("NUMERIC"), PgKind::Numeric);
        assert_eq!(PgKind::from_type_name("VARCHAR"), PgKind::Text);
        assert_eq!(PgKind::from_type_name("TIMESTAMPTZ"), PgKind::TimestampTz);
        assert_eq!(PgKind::from_type_name("equipment_type"), PgKind::Other);
    }

    #[test]
    fn numeric_prefers_integers() {
        assert_eq!(numeric_value("100"), json!(100));
        assert_eq!(numeric_value("12.50"), json!(12.5));
        assert_eq!(numeric_value("NaN"), json!("NaN"));
    }
}
