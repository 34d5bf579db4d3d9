use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ScopeError {
    #[error("{0}")]
    InsufficientPrivilege(String),
}
