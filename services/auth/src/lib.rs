//! Client-side session layer
//!
//! Decodes bearer tokens into claims, keeps the single current session in a
//! [`SessionStore`] and answers role-based authorization questions locally.
//! Claims are never verified here; every decision taken from them is a UI hint
//! that the server re-checks.

pub mod error;
pub mod models;
pub mod session;
pub mod token;
pub mod transport;
pub mod validation;

pub use error::{AuthenticationError, DecodeError, RegistrationError};
pub use models::{Action, Role, Session};
pub use session::{SessionState, SessionStore};
pub use token::{Claims, TokenCodec, TokenType};
pub use transport::{AuthTransport, HttpAuthTransport};
