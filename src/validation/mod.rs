//! Per-operation request schemas.

pub mod error;
pub mod rules;
pub mod schema;

pub use error::ValidationError;
pub use rules::{Check, FieldKind, FieldRule, COUNT, ID, PHONE, PRICE, TEXT};
pub use schema::Schema;
