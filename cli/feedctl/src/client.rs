//! HTTP client for the feed server.

use std::sync::Arc;

use anyhow::{Context, Result};
use esfeed_atom::{EventDocument, Feed};
use esfeed_envelope::KeyService;
use reqwest::StatusCode;

use crate::error::CliError;

/// Client for the feed and event endpoints.
pub struct FeedClient {
    client: reqwest::Client,
    base_url: String,
    key_service: Option<Arc<dyn KeyService>>,
}

impl FeedClient {
    /// Create a client. With a key service, every response body is treated as
    /// an encrypted envelope and opened before parsing.
    pub fn new(base_url: &str, key_service: Option<Arc<dyn KeyService>>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            key_service,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Fetch a document, decrypting it when a key service is configured.
    pub async fn get_document(&self, path: &str) -> Result<String, CliError> {
        let response = self.client.get(self.url(path)).send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CliError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(CliError::api(status.as_u16(), path));
        }

        let body = response.bytes().await?;
        let plain = match &self.key_service {
            Some(key_service) => esfeed_envelope::decrypt(key_service.as_ref(), &body).await?,
            None => body.to_vec(),
        };

        String::from_utf8(plain).map_err(|_| CliError::NotUtf8(path.to_string()))
    }

    /// Serialized feed page.
    pub async fn feed_xml(&self, feed_id: &str) -> Result<String, CliError> {
        self.get_document(&format!("/notifications/{feed_id}")).await
    }

    /// Parsed feed page.
    pub async fn feed(&self, feed_id: &str) -> Result<Feed, CliError> {
        let xml = self.feed_xml(feed_id).await?;
        Ok(Feed::from_xml(&xml)?)
    }

    /// Serialized event document.
    pub async fn event_xml(&self, aggregate_id: &str, version: u32) -> Result<String, CliError> {
        self.get_document(&format!("/events/{aggregate_id}/{version}"))
            .await
    }

    /// Parsed event document.
    pub async fn event(&self, aggregate_id: &str, version: u32) -> Result<EventDocument, CliError> {
        let xml = self.event_xml(aggregate_id, version).await?;
        Ok(EventDocument::from_xml(&xml)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use esfeed_atom::{rel, Link};
    use esfeed_envelope::{LocalKeyService, DATA_KEY_BYTES};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const ALIAS: &str = "alias/feed";

    fn key_service() -> LocalKeyService {
        LocalKeyService::new().with_master_key(ALIAS, [7u8; DATA_KEY_BYTES])
    }

    fn decrypting() -> Option<Arc<dyn KeyService>> {
        Some(Arc::new(key_service()))
    }

    fn feed_xml(feed_id: &str) -> String {
        let mut feed = Feed::new(feed_id);
        feed.links.push(Link::new(
            rel::SELF,
            format!("https://feed.example.com/notifications/{feed_id}"),
        ));
        feed.to_xml().unwrap()
    }

    async fn serve(server: &MockServer, route: &str, response: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(response)
            .mount(server)
            .await;
    }

    #[test]
    fn test_url_building() {
        let client = FeedClient::new("http://localhost:8080/", None).unwrap();
        assert_eq!(
            client.url("/notifications/recent"),
            "http://localhost:8080/notifications/recent"
        );
    }

    #[tokio::test]
    async fn test_fetch_plain_feed() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/notifications/feed-1",
            ResponseTemplate::new(200).set_body_string(feed_xml("feed-1")),
        )
        .await;

        let client = FeedClient::new(&server.uri(), None).unwrap();
        let feed = client.feed("feed-1").await.unwrap();

        assert_eq!(feed.id, "feed-1");
    }

    #[tokio::test]
    async fn test_not_found() {
        let server = MockServer::start().await;
        serve(&server, "/events/agg1/9", ResponseTemplate::new(404)).await;

        let client = FeedClient::new(&server.uri(), None).unwrap();
        let err = client.event("agg1", 9).await.unwrap_err();

        assert!(matches!(err, CliError::NotFound(path) if path == "/events/agg1/9"));
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/notifications/recent",
            ResponseTemplate::new(500).set_body_string("Error retrieving feed items"),
        )
        .await;

        let client = FeedClient::new(&server.uri(), None).unwrap();
        let err = client.feed("recent").await.unwrap_err();

        assert!(matches!(err, CliError::Api { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_encrypted_feed_is_opened() {
        let envelope =
            esfeed_envelope::encrypt(&key_service(), ALIAS, feed_xml("feed-1").as_bytes())
                .await
                .unwrap();

        let server = MockServer::start().await;
        serve(
            &server,
            "/notifications/feed-1",
            ResponseTemplate::new(200).set_body_string(envelope.encode()),
        )
        .await;

        let client = FeedClient::new(&server.uri(), decrypting()).unwrap();
        let feed = client.feed("feed-1").await.unwrap();
        assert_eq!(feed.id, "feed-1");

        let without_key = FeedClient::new(&server.uri(), None).unwrap();
        assert!(matches!(
            without_key.feed("feed-1").await,
            Err(CliError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_plain_feed_with_key_service_fails_to_decrypt() {
        let server = MockServer::start().await;
        serve(
            &server,
            "/notifications/feed-1",
            ResponseTemplate::new(200).set_body_string(feed_xml("feed-1")),
        )
        .await;

        let client = FeedClient::new(&server.uri(), decrypting()).unwrap();
        assert!(matches!(
            client.feed("feed-1").await,
            Err(CliError::Decrypt(_))
        ));
    }
}
