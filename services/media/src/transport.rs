//! Video endpoints of the remote API

use std::time::Duration;

use async_trait::async_trait;
use common::error::TransportResult;
use common::http::{build_client, check_status, endpoint, parse_base_url};
use reqwest::{Client, Url};
use tracing::{debug, info};
use uuid::Uuid;

use crate::models::MediaItem;

/// Remote collaborator holding the authoritative video list
#[async_trait]
pub trait MediaTransport: Send + Sync {
    /// Every video visible to the bearer of `token`
    async fn list(&self, token: &str) -> TransportResult<Vec<MediaItem>>;

    async fn delete(&self, token: &str, id: Uuid) -> TransportResult<()>;

    /// Address a player can stream the video from
    fn stream_url(&self, token: &str, id: Uuid) -> TransportResult<Url>;
}

/// [`MediaTransport`] over the JSON REST API
#[derive(Clone)]
pub struct HttpMediaTransport {
    client: Client,
    base_url: Url,
}

impl HttpMediaTransport {
    pub fn new(base_url: &str, timeout: Duration) -> TransportResult<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: parse_base_url(base_url)?,
        })
    }
}

#[async_trait]
impl MediaTransport for HttpMediaTransport {
    async fn list(&self, token: &str) -> TransportResult<Vec<MediaItem>> {
        let url = endpoint(&self.base_url, "videos/")?;

        let response = self.client.get(url).bearer_auth(token).send().await?;
        let items = check_status(response)
            .await?
            .json::<Vec<MediaItem>>()
            .await?;

        debug!("Listed {} videos", items.len());
        Ok(items)
    }

    async fn delete(&self, token: &str, id: Uuid) -> TransportResult<()> {
        let url = endpoint(&self.base_url, &format!("videos/{}/", id))?;
        info!("Deleting video: {}", id);

        let response = self.client.delete(url).bearer_auth(token).send().await?;
        check_status(response).await?;
        Ok(())
    }

    fn stream_url(&self, token: &str, id: Uuid) -> TransportResult<Url> {
        let mut url = endpoint(&self.base_url, &format!("videos/{}/stream/", id))?;
        url.query_pairs_mut().append_pair("token", token);
        Ok(url)
    }
}
