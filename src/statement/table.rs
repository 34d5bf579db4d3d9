use std::borrow::Cow;

use serde_json::Value;

use super::error::StatementError;
use super::types::ScopePredicate;

/// Storage type of a column. Temporal types get an explicit cast on their
/// placeholder since values travel as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Numeric,
    Boolean,
    Date,
    Timestamp,
    Time,
}

impl ColumnType {
    pub fn cast(&self) -> Option<&'static str> {
        match self {
            ColumnType::Date => Some("date"),
            ColumnType::Timestamp => Some("timestamp"),
            ColumnType::Time => Some("time"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: &'static str,
    pub kind: ColumnType,
    /// Hidden columns (password hashes) are never selected by listings.
    pub readable: bool,
}

impl ColumnSpec {
    pub const fn new(name: &'static str, kind: ColumnType) -> Self {
        Self { name, kind, readable: true }
    }

    pub const fn hidden(name: &'static str, kind: ColumnType) -> Self {
        Self { name, kind, readable: false }
    }
}

/// Allow-list for one table. Every identifier the builder writes comes from here.
#[derive(Debug)]
pub struct TableSpec {
    pub name: &'static str,
    pub key: &'static str,
    pub columns: &'static [ColumnSpec],
}

impl TableSpec {
    pub fn column(&self, name: &str) -> Result<&ColumnSpec, StatementError> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .ok_or_else(|| StatementError::UnknownColumn {
                table: self.name.to_string(),
                column: name.to_string(),
            })
    }

    pub fn ident(&self) -> Cow<'static, str> {
        quote_ident(self.name)
    }

    /// `"ID"=?` bound to `id`.
    pub fn key_equals(&self, id: impl Into<Value>) -> ScopePredicate {
        ScopePredicate::new(format!("{}=?", quote_ident(self.key)), vec![id.into()])
    }

    /// `"ID" = ANY(?)` bound to an id list.
    pub fn key_in(&self, ids: &[i64]) -> ScopePredicate {
        ScopePredicate::new(format!("{} = ANY(?)", quote_ident(self.key)), vec![Value::from(ids.to_vec())])
    }

    pub fn readable_columns(&self) -> Vec<&'static str> {
        self.columns
            .iter()
            .filter(|column| column.readable)
            .map(|column| column.name)
            .collect()
    }

    /// Comma separated, quoted list of readable columns for SELECT / RETURNING.
    pub fn readable_list(&self) -> String {
        self.readable_columns()
            .into_iter()
            .map(quote_ident)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Quote an identifier unless it is already a plain lower-case name.
pub fn quote_ident(name: &'static str) -> Cow<'static, str> {
    let mut chars = name.chars();
    let plain = match chars.next() {
        Some(first) if first.is_ascii_lowercase() || first == '_' => {
            chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        }
        _ => false,
    };

    if plain {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!("\"{}\"", name.replace('"', "\"\"")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static ROOMS: TableSpec = TableSpec {
        name: "accomodation",
        key: "ID",
        columns: &[
            ColumnSpec::new("ID", ColumnType::Integer),
            ColumnSpec::new("nom", ColumnType::Text),
            ColumnSpec::new("date_debut", ColumnType::Date),
            ColumnSpec::hidden("secret", ColumnType::Text),
        ],
    };

    #[test]
    fn quotes_only_when_needed() {
        assert_eq!(quote_ident("nom"), "nom");
        assert_eq!(quote_ident("date_debut"), "date_debut");
        assert_eq!(quote_ident("ID"), "\"ID\"");
        assert_eq!(quote_ident("Clients"), "\"Clients\"");
        assert_eq!(quote_ident("Q&A"), "\"Q&A\"");
    }

    #[test]
    fn rejects_unlisted_column() {
        let err = ROOMS.column("nom; DROP TABLE accounts").unwrap_err();
        assert!(matches!(err, StatementError::UnknownColumn { .. }));
        assert!(ROOMS.column("date_debut").is_ok());
    }

    #[test]
    fn readable_list_skips_hidden_columns() {
        assert_eq!(ROOMS.readable_list(), "\"ID\", nom, date_debut");
    }
}
