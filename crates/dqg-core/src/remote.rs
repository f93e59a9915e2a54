//! Remote quote source.
//!
//! The remote endpoint returns arbitrary JSON posts (`{id, title, ...}`);
//! each post maps 1:1 into a server quote with a `srv-` prefixed id.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::ids::{Clock, SystemClock};
use crate::models::{Quote, QuoteId, QuoteSource};
use crate::util::body_excerpt;

/// Text used for posts without a usable title.
pub const UNTITLED: &str = "(untitled)";

/// Trait for fetching quotes from the remote side.
pub trait RemoteSource: Send + Sync {
    /// Fetch the current remote batch. Fails with a network or parse error.
    fn fetch(&self) -> impl Future<Output = Result<Vec<Quote>>> + Send;
}

impl<R: RemoteSource> RemoteSource for Arc<R> {
    fn fetch(&self) -> impl Future<Output = Result<Vec<Quote>>> + Send {
        self.as_ref().fetch()
    }
}

/// Remote source backed by an HTTP JSON endpoint.
#[derive(Clone)]
pub struct HttpRemoteSource {
    url: String,
    category: String,
    client: reqwest::Client,
    clock: Arc<dyn Clock>,
}

impl HttpRemoteSource {
    pub fn new(url: impl Into<String>, category: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            url: url.into(),
            category: category.into(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Self::new(
            config.server_url.clone(),
            config.server_category.clone(),
            config.request_timeout(),
        )
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl RemoteSource for HttpRemoteSource {
    async fn fetch(&self) -> Result<Vec<Quote>> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Network(format!(
                "Server fetch failed: HTTP {status} {}",
                body_excerpt(&body)
            )));
        }

        let body = response.text().await?;
        map_posts(&body, &self.category, self.clock.now_ms())
    }
}

#[derive(Debug, Deserialize)]
struct RemotePost {
    #[serde(default)]
    id: Option<Value>,
    #[serde(default)]
    title: Option<Value>,
}

/// Map a raw posts payload into server quotes stamped with `fetched_at`.
///
/// Posts without a string or numeric id are skipped.
pub fn map_posts(payload: &str, category: &str, fetched_at: i64) -> Result<Vec<Quote>> {
    let posts: Vec<RemotePost> = serde_json::from_str(payload)?;

    let quotes = posts
        .into_iter()
        .filter_map(|post| {
            let remote_id = match post.id? {
                Value::Number(number) => number.to_string(),
                Value::String(text) if !text.trim().is_empty() => text.trim().to_string(),
                _ => return None,
            };
            let text = post
                .title
                .as_ref()
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|title| !title.is_empty())
                .unwrap_or(UNTITLED);
            Quote::new(
                QuoteId::remote(remote_id),
                text,
                category,
                fetched_at,
                QuoteSource::Server,
            )
            .ok()
        })
        .collect();

    Ok(quotes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn map_posts_builds_server_quotes() {
        let payload = r#"[
            {"userId": 1, "id": 1, "title": "  sunt aut facere  ", "body": "..."},
            {"id": "abc", "title": ""},
            {"id": 3}
        ]"#;

        let quotes = map_posts(payload, "Server", 1_234).unwrap();

        assert_eq!(quotes.len(), 3);
        assert_eq!(quotes[0].id.as_str(), "srv-1");
        assert_eq!(quotes[0].text, "sunt aut facere");
        assert_eq!(quotes[0].category, "Server");
        assert_eq!(quotes[0].updated_at, 1_234);
        assert_eq!(quotes[0].source, QuoteSource::Server);
        assert_eq!(quotes[1].id.as_str(), "srv-abc");
        assert_eq!(quotes[1].text, UNTITLED);
        assert_eq!(quotes[2].text, UNTITLED);
    }

    #[test]
    fn map_posts_skips_posts_without_id() {
        let quotes = map_posts(r#"[{"title": "x"}, {"id": null}, {"id": 2, "title": "y"}]"#, "S", 0)
            .unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].id.as_str(), "srv-2");
    }

    #[test]
    fn map_posts_rejects_malformed_payload() {
        assert!(matches!(map_posts("{", "S", 0), Err(Error::Parse(_))));
        assert!(matches!(map_posts(r#"{"id": 1}"#, "S", 0), Err(Error::Parse(_))));
    }

    #[test]
    fn map_posts_ids_are_stable() {
        let first = map_posts(r#"[{"id": 5, "title": "t"}]"#, "S", 1).unwrap();
        let second = map_posts(r#"[{"id": 5, "title": "t"}]"#, "S", 2).unwrap();
        assert_eq!(first[0].id, second[0].id);
    }

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status: &'static str, body: &'static str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buffer = [0_u8; 1024];
            while !request.windows(4).any(|window| window == b"\r\n\r\n") {
                let read = socket.read(&mut buffer).await.unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buffer[..read]);
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });
        format!("http://{address}/posts")
    }

    fn source(url: String) -> HttpRemoteSource {
        HttpRemoteSource::new(url, "Server", Duration::from_secs(5)).unwrap()
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_maps_posts_from_server() {
        let url = serve_once("200 OK", r#"[{"id": 1, "title": "hello"}]"#).await;

        let quotes = source(url).fetch().await.unwrap();
        assert_eq!(quotes.len(), 1);
        assert_eq!(quotes[0].id.as_str(), "srv-1");
        assert_eq!(quotes[0].text, "hello");
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_non_success_status_is_network_error() {
        let url = serve_once("503 Service Unavailable", "down for maintenance").await;

        match source(url).fetch().await {
            Err(Error::Network(message)) => {
                assert!(message.contains("503"), "{message}");
                assert!(message.contains("down for maintenance"), "{message}");
            }
            other => panic!("expected network error, got {other:?}"),
        }
    }

    #[tokio::test(flavor = "current_thread")]
    async fn fetch_malformed_body_is_parse_error() {
        let url = serve_once("200 OK", "{not json").await;

        assert!(matches!(source(url).fetch().await, Err(Error::Parse(_))));
    }
}
