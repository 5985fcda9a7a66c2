//! Auth endpoints of the remote API

use std::time::Duration;

use async_trait::async_trait;
use common::error::TransportResult;
use common::http::{build_client, check_status, endpoint, parse_base_url};
use reqwest::{Client, Url};
use tracing::info;

use crate::models::{LoginRequest, LogoutRequest, RegisterRequest, TokenPair};

/// Remote collaborator owning accounts and token issuance
#[async_trait]
pub trait AuthTransport: Send + Sync {
    /// Exchange a username and password for an access/refresh token pair
    async fn login(&self, request: &LoginRequest) -> TransportResult<TokenPair>;

    /// Create an account; does not log in
    async fn register(&self, request: &RegisterRequest) -> TransportResult<()>;

    /// Revoke a refresh token
    async fn logout(&self, request: &LogoutRequest) -> TransportResult<()>;
}

/// [`AuthTransport`] over the JSON REST API
#[derive(Clone)]
pub struct HttpAuthTransport {
    client: Client,
    base_url: Url,
}

impl HttpAuthTransport {
    /// Create a transport for the API at `base_url`
    pub fn new(base_url: &str, timeout: Duration) -> TransportResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

#[async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn login(&self, request: &LoginRequest) -> TransportResult<TokenPair> {
        let url = endpoint(&self.base_url, "auth/login/")?;
        info!("Login request for user: {}", request.username);

        let response = self.client.post(url).json(request).send().await?;
        let tokens = check_status(response).await?.json::<TokenPair>().await?;
        Ok(tokens)
    }

    async fn register(&self, request: &RegisterRequest) -> TransportResult<()> {
        let url = endpoint(&self.base_url, "auth/register/")?;
        info!(
            "Registration request for user: {} ({})",
            request.username, request.role
        );

        let response = self.client.post(url).json(request).send().await?;
        check_status(response).await?;
        Ok(())
    }

    async fn logout(&self, request: &LogoutRequest) -> TransportResult<()> {
        let url = endpoint(&self.base_url, "auth/logout/")?;
        info!("Logout request");

        let response = self.client.post(url).json(request).send().await?;
        check_status(response).await?;
        Ok(())
    }
}
