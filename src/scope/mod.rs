//! Tenant and role scoping for every read and write.

pub mod error;
pub mod guard;
pub mod ownership;
pub mod role;

pub use error::ScopeError;
pub use guard::ScopingGuard;
pub use ownership::{Ownership, Reference};
pub use role::{Role, ROLE_NAMES};

/// Caller decoded from the session token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub role: String,
}
