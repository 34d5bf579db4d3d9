pub mod convert;
pub mod executor;
pub mod manager;
pub mod postgres;

pub use executor::{Database, QueryOutcome, Transaction};
pub use manager::{DatabaseError, DatabaseManager};
pub use postgres::PgDatabase;
