use std::borrow::Cow;

use serde_json::Value;

/// Ordered field map. Order decides placeholder numbering downstream, so it is
/// kept as a vector rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    entries: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a field. Replacing keeps the original position.
    pub fn insert(&mut self, field: impl Into<String>, value: Value) {
        let field = field.into();
        match self.entries.iter_mut().find(|(name, _)| *name == field) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((field, value)),
        }
    }

    pub fn with(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(field, value.into());
        self
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        let index = self.entries.iter().position(|(name, _)| name == field)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.get(field).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Record::new();
        for (field, value) in iter {
            record.insert(field, value);
        }
        record
    }
}

/// One WHERE condition. `?` markers in the template are numbered when the
/// statement is rendered; `values` supplies them left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct ScopePredicate {
    pub template: Cow<'static, str>,
    pub values: Vec<Value>,
}

impl ScopePredicate {
    pub fn new(template: impl Into<Cow<'static, str>>, values: Vec<Value>) -> Self {
        Self {
            template: template.into(),
            values,
        }
    }

    /// A condition without parameters, e.g. `available = true`.
    pub fn fixed(template: &'static str) -> Self {
        Self::new(template, Vec::new())
    }
}

/// Conjunction of predicates a statement must satisfy.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScopeSpec {
    predicates: Vec<ScopePredicate>,
}

impl ScopeSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn and(mut self, predicate: ScopePredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn push(&mut self, predicate: ScopePredicate) {
        self.predicates.push(predicate);
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ScopePredicate> {
        self.predicates.iter()
    }
}

/// Column whose value is an SQL expression over bound parameters rather than
/// a request field, e.g. the tenant id looked up from the caller's account.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    pub column: &'static str,
    pub template: Cow<'static, str>,
    pub values: Vec<Value>,
}

impl DerivedColumn {
    pub fn new(column: &'static str, template: impl Into<Cow<'static, str>>, values: Vec<Value>) -> Self {
        Self {
            column,
            template: template.into(),
            values,
        }
    }

    /// Plain bound value, `column = $n`.
    pub fn value(column: &'static str, value: impl Into<Value>) -> Self {
        Self::new(column, "?", vec![value.into()])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub column: &'static str,
    pub direction: Direction,
}

impl OrderBy {
    pub const fn asc(column: &'static str) -> Self {
        Self { column, direction: Direction::Asc }
    }

    pub const fn desc(column: &'static str) -> Self {
        Self { column, direction: Direction::Desc }
    }
}

/// SQL text plus the values for its `$n` placeholders, in order.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Append a RETURNING clause. `columns` must be static SQL (`*` or an
    /// allow-listed column list).
    pub fn returning(mut self, columns: &str) -> Self {
        self.sql.push_str(" RETURNING ");
        self.sql.push_str(columns);
        self
    }

    pub fn for_update(mut self) -> Self {
        self.sql.push_str(" FOR UPDATE");
        self
    }

    pub fn placeholder_count(&self) -> usize {
        count_placeholders(&self.sql)
    }
}

/// Highest `$n` index present in the SQL text.
fn count_placeholders(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut highest = 0;
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'$' {
            let start = i + 1;
            let mut end = start;
            while end < bytes.len() && bytes[end].is_ascii_digit() {
                end += 1;
            }
            if let Ok(n) = sql[start..end].parse::<usize>() {
                highest = highest.max(n);
            }
            i = end.max(start);
        } else {
            i += 1;
        }
    }
    highest
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_keeps_insertion_order_on_replace() {
        let mut record = Record::new().with("b", 1).with("a", 2);
        record.insert("b", json!(3));
        let fields: Vec<&str> = record.fields().collect();
        assert_eq!(fields, vec!["b", "a"]);
        assert_eq!(record.get("b"), Some(&json!(3)));
    }

    #[test]
    fn counts_highest_placeholder() {
        let statement = Statement::new("UPDATE t SET a=$1, b=$2::date WHERE \"ID\"=$3", vec![]);
        assert_eq!(statement.placeholder_count(), 3);
        assert_eq!(Statement::new("SELECT 1", vec![]).placeholder_count(), 0);
    }
}
