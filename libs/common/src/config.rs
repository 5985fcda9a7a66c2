//! Client configuration
//!
//! Addresses of the remote collaborators and the location of the credential
//! storage, layered from built-in defaults, an optional `stream-client.toml`
//! file and `STREAM_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:8000/api";
const DEFAULT_LIVE_BASE_URL: &str = "http://127.0.0.1:8000";
const DEFAULT_REQUEST_TIMEOUT_SECS: i64 = 30;
const CONFIG_FILE: &str = "stream-client";

/// Configuration for the client
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ClientConfig {
    /// Base address of the REST API (auth and videos endpoints)
    pub api_base_url: String,
    /// Base address of the push-subscription endpoint
    pub live_base_url: String,
    /// File holding the persisted access and refresh tokens
    pub credentials_path: PathBuf,
    /// Timeout applied to every request/response call
    pub request_timeout_secs: u64,
}

impl ClientConfig {
    /// Create a new ClientConfig from defaults, config file and environment
    ///
    /// # Environment Variables
    /// - `STREAM_API_BASE_URL`: REST API base (default: "http://127.0.0.1:8000/api")
    /// - `STREAM_LIVE_BASE_URL`: live update base (default: "http://127.0.0.1:8000")
    /// - `STREAM_CREDENTIALS_PATH`: credential file (default: `<config dir>/stream-client/credentials.json`)
    /// - `STREAM_REQUEST_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    pub fn from_env() -> Result<Self> {
        let settings = Config::builder()
            .set_default("api_base_url", DEFAULT_API_BASE_URL)?
            .set_default("live_base_url", DEFAULT_LIVE_BASE_URL)?
            .set_default(
                "credentials_path",
                default_credentials_path().to_string_lossy().into_owned(),
            )?
            .set_default("request_timeout_secs", DEFAULT_REQUEST_TIMEOUT_SECS)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("STREAM").try_parsing(true))
            .build()?;

        let config: ClientConfig = settings.try_deserialize()?;
        Ok(config)
    }

    /// Request timeout as a duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn default_credentials_path() -> PathBuf {
    let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push("stream-client");
    path.push("credentials.json");
    path
}
