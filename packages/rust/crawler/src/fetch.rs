//! Single-shot page fetcher with failure classification.
//!
//! One GET per call, no retries. HTTP 403/429 are reported as
//! [`FounderFuelError::Blocked`] so callers can tell a site-side block from a
//! generic origin failure.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use tracing::{debug, instrument, warn};
use url::Url;

use founderfuel_shared::{FetchConfig, FounderFuelError, Result};

/// `Accept` header sent with every page request.
const ACCEPT_HTML: &str = "text/html,application/xhtml+xml";

/// HTTP client for fetching raw page HTML.
///
/// Cheap to share: the inner `reqwest::Client` pools connections and is safe
/// for concurrent use.
#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    timeout_secs: u64,
}

impl PageFetcher {
    /// Create a fetcher from the `[fetch]` config section.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| FounderFuelError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            timeout_secs: config.timeout_secs,
        })
    }

    /// Fetch `url` and return the response body as text.
    ///
    /// `url` must already have passed [`crate::validate_url`].
    #[instrument(skip_all, fields(url = %url))]
    pub async fn fetch(&self, url: &Url) -> Result<String> {
        debug!("fetching page");

        let response = self
            .client
            .get(url.as_str())
            .header(reqwest::header::ACCEPT, ACCEPT_HTML)
            .send()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        let status = response.status();
        classify_status(url, status)?;

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(url, e))?;

        debug!(status = status.as_u16(), bytes = body.len(), "page fetched");
        Ok(body)
    }

    fn transport_error(&self, url: &Url, err: reqwest::Error) -> FounderFuelError {
        if err.is_timeout() {
            warn!(%url, timeout_secs = self.timeout_secs, "fetch timed out");
            FounderFuelError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout_secs,
            }
        } else {
            FounderFuelError::Network(format!("{url}: {err}"))
        }
    }
}

/// Map a response status to the error taxonomy. 2xx passes through.
fn classify_status(url: &Url, status: StatusCode) -> Result<()> {
    if status == StatusCode::FORBIDDEN || status == StatusCode::TOO_MANY_REQUESTS {
        warn!(%url, status = status.as_u16(), "origin blocked the request");
        return Err(FounderFuelError::Blocked {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    if !status.is_success() {
        return Err(FounderFuelError::Fetch {
            status: status.as_u16(),
            status_text: status.canonical_reason().unwrap_or("Unknown Status").to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> PageFetcher {
        PageFetcher::new(&FetchConfig::default()).expect("build fetcher")
    }

    async fn serve_status(server: &MockServer, status: u16) {
        Mock::given(method("GET"))
            .and(path("/page"))
            .respond_with(ResponseTemplate::new(status).set_body_string("nope"))
            .mount(server)
            .await;
    }

    fn page_url(server: &MockServer) -> Url {
        Url::parse(&format!("{}/page", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn returns_body_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("accept", ACCEPT_HTML))
            .respond_with(
                ResponseTemplate::new(200).set_body_string("<html><title>Hi</title></html>"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = fetcher().fetch(&page_url(&server)).await.unwrap();
        assert_eq!(body, "<html><title>Hi</title></html>");
    }

    #[tokio::test]
    async fn sends_configured_user_agent() {
        let server = MockServer::start().await;
        let config = FetchConfig {
            user_agent: "FounderFuel Test Agent".into(),
            ..FetchConfig::default()
        };
        Mock::given(method("GET"))
            .and(header("user-agent", "FounderFuel Test Agent"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&config).unwrap();
        assert_eq!(fetcher.fetch(&page_url(&server)).await.unwrap(), "ok");
    }

    #[tokio::test]
    async fn follows_redirect_chains() {
        let server = MockServer::start().await;
        for hop in 0..6 {
            Mock::given(method("GET"))
                .and(path(format!("/hop{hop}")))
                .respond_with(
                    ResponseTemplate::new(302)
                        .insert_header("Location", format!("{}/hop{}", server.uri(), hop + 1)),
                )
                .mount(&server)
                .await;
        }
        Mock::given(method("GET"))
            .and(path("/hop6"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>landed</p>"))
            .mount(&server)
            .await;

        let url = Url::parse(&format!("{}/hop0", server.uri())).unwrap();
        let body = fetcher().fetch(&url).await.expect("redirects followed");
        assert_eq!(body, "<p>landed</p>");
    }

    #[tokio::test]
    async fn status_429_is_blocked() {
        let server = MockServer::start().await;
        serve_status(&server, 429).await;

        match fetcher().fetch(&page_url(&server)).await {
            Err(FounderFuelError::Blocked { url, status }) => {
                assert_eq!(status, 429);
                assert!(url.ends_with("/page"));
            }
            other => panic!("expected Blocked, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_403_is_blocked() {
        let server = MockServer::start().await;
        serve_status(&server, 403).await;

        let err = fetcher().fetch(&page_url(&server)).await.unwrap_err();
        assert!(matches!(err, FounderFuelError::Blocked { status: 403, .. }));
    }

    #[tokio::test]
    async fn status_500_is_generic_fetch_error() {
        let server = MockServer::start().await;
        serve_status(&server, 500).await;

        match fetcher().fetch(&page_url(&server)).await {
            Err(FounderFuelError::Fetch {
                status,
                status_text,
            }) => {
                assert_eq!(status, 500);
                assert_eq!(status_text, "Internal Server Error");
            }
            other => panic!("expected Fetch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn status_404_is_generic_fetch_error() {
        let server = MockServer::start().await;
        serve_status(&server, 404).await;

        let err = fetcher().fetch(&page_url(&server)).await.unwrap_err();
        assert!(matches!(err, FounderFuelError::Fetch { status: 404, .. }));
    }

    #[tokio::test]
    async fn slow_origin_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("late")
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout_secs: 1,
            ..FetchConfig::default()
        };
        let fetcher = PageFetcher::new(&config).unwrap();

        match fetcher.fetch(&page_url(&server)).await {
            Err(FounderFuelError::Timeout { timeout_secs, .. }) => assert_eq!(timeout_secs, 1),
            other => panic!("expected Timeout, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Port 9 (discard) on loopback is closed in test environments.
        let url = Url::parse("http://127.0.0.1:9/").unwrap();
        let err = fetcher().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FounderFuelError::Network(_)));
    }
}
