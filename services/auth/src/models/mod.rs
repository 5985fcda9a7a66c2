//! Session layer models

pub mod role;
pub mod session;
pub mod user;

// Re-export for convenience
pub use role::{Action, Role};
pub use session::Session;
pub use user::{LoginRequest, LogoutRequest, RegisterRequest, TokenPair};
