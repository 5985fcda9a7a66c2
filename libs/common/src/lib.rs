//! Common library for the streaming client
//!
//! This crate provides functionality shared by the session and media crates:
//! transport and storage error types, persistent credential storage, client
//! configuration and tracing setup.
//!
//! ```rust,no_run
//! use common::config::ClientConfig;
//! use common::storage::{CredentialStore, FileStore, TokenSlot};
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ClientConfig::from_env()?;
//!     let store = FileStore::open(&config.credentials_path);
//!     let token = store.get(TokenSlot::Access)?;
//!     println!("Stored access token present: {}", token.is_some());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http;
pub mod storage;
pub mod telemetry;

pub use storage::{CredentialStore, TokenSlot};
