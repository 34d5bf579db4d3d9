use serde_json::Value;

use super::error::StatementError;
use super::table::{quote_ident, ColumnType, TableSpec};
use super::types::{DerivedColumn, OrderBy, Record, ScopeSpec, Statement};

/// Hands out `$n` placeholders strictly in push order.
#[derive(Default)]
struct Placeholders {
    params: Vec<Value>,
}

impl Placeholders {
    fn param(&mut self, value: Value) -> String {
        self.params.push(value);
        format!("${}", self.params.len())
    }

    fn typed(&mut self, value: Value, kind: ColumnType) -> String {
        let placeholder = self.param(value);
        match kind.cast() {
            Some(cast) => format!("{}::{}", placeholder, cast),
            None => placeholder,
        }
    }

    /// Replace each `?` in `template` with the next placeholder.
    fn render(&mut self, template: &str, values: &[Value]) -> Result<String, StatementError> {
        let markers = template.matches('?').count();
        if markers != values.len() {
            return Err(StatementError::SchemaMismatch {
                template: template.to_string(),
                markers,
                values: values.len(),
            });
        }

        let mut values = values.iter();
        let mut sql = String::with_capacity(template.len() + markers * 2);
        for ch in template.chars() {
            match ch {
                '?' => {
                    // Counted above, so the iterator cannot run dry here.
                    let value = values.next().cloned().unwrap_or(Value::Null);
                    sql.push_str(&self.param(value));
                }
                _ => sql.push(ch),
            }
        }
        Ok(sql)
    }

    fn scope(&mut self, scope: &ScopeSpec) -> Result<String, StatementError> {
        let mut parts = Vec::new();
        for predicate in scope.iter() {
            parts.push(self.render(&predicate.template, &predicate.values)?);
        }
        Ok(parts.join(" AND "))
    }

    fn finish(self, sql: String) -> Statement {
        Statement::new(sql, self.params)
    }
}

/// Builds single-table statements against an allow-listed [`TableSpec`].
pub struct StatementBuilder<'t> {
    table: &'t TableSpec,
}

impl<'t> StatementBuilder<'t> {
    pub fn new(table: &'t TableSpec) -> Self {
        Self { table }
    }

    /// `INSERT INTO t (cols) VALUES (...)`, or with a non-empty `guard`,
    /// `INSERT INTO t (cols) SELECT * FROM (VALUES (...)) AS v(cols) WHERE guard`
    /// so that nothing is written when the guard does not hold.
    pub fn insert(
        &self,
        fields: &Record,
        derived: &[DerivedColumn],
        guard: &ScopeSpec,
    ) -> Result<Statement, StatementError> {
        if fields.is_empty() && derived.is_empty() {
            return Err(StatementError::NoFieldsProvided);
        }

        let mut placeholders = Placeholders::default();
        let mut columns = Vec::with_capacity(fields.len() + derived.len());
        let mut values = Vec::with_capacity(fields.len() + derived.len());

        for (field, value) in fields.iter() {
            let column = self.table.column(field)?;
            columns.push(quote_ident(column.name));
            values.push(placeholders.typed(value.clone(), column.kind));
        }
        for derived in derived {
            let column = self.table.column(derived.column)?;
            columns.push(quote_ident(column.name));
            values.push(placeholders.render(&derived.template, &derived.values)?);
        }

        let column_list = columns.join(", ");
        let value_list = values.join(", ");
        let sql = if guard.is_empty() {
            format!("INSERT INTO {} ({}) VALUES ({})", self.table.ident(), column_list, value_list)
        } else {
            let condition = placeholders.scope(guard)?;
            format!(
                "INSERT INTO {table} ({columns}) SELECT * FROM (VALUES ({values})) AS v({columns}) WHERE {condition}",
                table = self.table.ident(),
                columns = column_list,
                values = value_list,
                condition = condition,
            )
        };

        Ok(placeholders.finish(sql))
    }

    /// `UPDATE t SET c1=$1, c2=$2 WHERE scope`. An empty scope is refused.
    pub fn update(
        &self,
        fields: &Record,
        derived: &[DerivedColumn],
        scope: &ScopeSpec,
    ) -> Result<Statement, StatementError> {
        if fields.is_empty() && derived.is_empty() {
            return Err(StatementError::NoFieldsProvided);
        }
        if scope.is_empty() {
            return Err(StatementError::EmptyScope("UPDATE"));
        }

        let mut placeholders = Placeholders::default();
        let mut assignments = Vec::with_capacity(fields.len() + derived.len());

        for (field, value) in fields.iter() {
            let column = self.table.column(field)?;
            let placeholder = placeholders.typed(value.clone(), column.kind);
            assignments.push(format!("{}={}", quote_ident(column.name), placeholder));
        }
        for derived in derived {
            let column = self.table.column(derived.column)?;
            let expression = placeholders.render(&derived.template, &derived.values)?;
            assignments.push(format!("{}={}", quote_ident(column.name), expression));
        }

        let condition = placeholders.scope(scope)?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            self.table.ident(),
            assignments.join(", "),
            condition
        );
        Ok(placeholders.finish(sql))
    }

    pub fn delete(&self, scope: &ScopeSpec) -> Result<Statement, StatementError> {
        if scope.is_empty() {
            return Err(StatementError::EmptyScope("DELETE"));
        }
        let mut placeholders = Placeholders::default();
        let condition = placeholders.scope(scope)?;
        let sql = format!("DELETE FROM {} WHERE {}", self.table.ident(), condition);
        Ok(placeholders.finish(sql))
    }

    pub fn select(
        &self,
        columns: &[&'static str],
        scope: &ScopeSpec,
        order: Option<OrderBy>,
    ) -> Result<Statement, StatementError> {
        let mut selected = Vec::with_capacity(columns.len());
        for name in columns {
            let column = self.table.column(name)?;
            selected.push(quote_ident(column.name));
        }
        let column_list = if selected.is_empty() {
            "*".to_string()
        } else {
            selected.join(", ")
        };

        let mut placeholders = Placeholders::default();
        let mut sql = format!("SELECT {} FROM {}", column_list, self.table.ident());
        if !scope.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&placeholders.scope(scope)?);
        }
        if let Some(order) = order {
            let column = self.table.column(order.column)?;
            sql.push_str(&format!(" ORDER BY {} {}", quote_ident(column.name), order.direction.as_sql()));
        }
        Ok(placeholders.finish(sql))
    }

    /// SELECT of every readable column.
    pub fn select_readable(&self, scope: &ScopeSpec, order: Option<OrderBy>) -> Result<Statement, StatementError> {
        self.select(&self.table.readable_columns(), scope, order)
    }
}

/// Render a static query template (joins, aggregates) with `?` markers.
pub fn query(template: &'static str, values: Vec<Value>) -> Result<Statement, StatementError> {
    let mut placeholders = Placeholders::default();
    let sql = placeholders.render(template, &values)?;
    Ok(placeholders.finish(sql))
}
