pub mod auth;
pub mod payload;
pub mod response;

pub use auth::session_middleware;
pub use payload::Payload;
pub use response::{ApiResponse, ApiResult, WriteKind};
