use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StatementError {
    #[error("No fields provided")]
    NoFieldsProvided,

    #[error("Unknown column '{column}' for table '{table}'")]
    UnknownColumn { table: String, column: String },

    #[error("Placeholder mismatch in '{template}': {markers} markers for {values} values")]
    SchemaMismatch {
        template: String,
        markers: usize,
        values: usize,
    },

    #[error("Refusing to build {0} without a WHERE clause")]
    EmptyScope(&'static str),
}
