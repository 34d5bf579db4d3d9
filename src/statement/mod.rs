//! Parameterized SQL for single-table writes and reads.
//!
//! Values only ever travel as `$n` parameters. Identifiers come from static
//! [`TableSpec`] allow-lists, never from request input.

pub mod builder;
pub mod error;
pub mod field_filter;
pub mod table;
pub mod types;

pub use builder::{query, StatementBuilder};
pub use error::StatementError;
pub use field_filter::FieldFilter;
pub use table::{quote_ident, ColumnSpec, ColumnType, TableSpec};
pub use types::{DerivedColumn, Direction, OrderBy, Record, ScopePredicate, ScopeSpec, Statement};
