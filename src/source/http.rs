//! HTTP feed fetcher.

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::{debug, warn};

use super::FeedFetcher;
use crate::config::Credentials;
use crate::error::FetchError;

/// Client settings shared by the fetcher and the notifier.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    pub timeout: Duration,
    /// Skip TLS certificate verification on feed fetches.  Off unless the
    /// operator asks for it.
    pub accept_invalid_certs: bool,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            accept_invalid_certs: false,
        }
    }
}

/// Fetches feeds over HTTP(S) with a blocking [`reqwest`] client.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(options: &HttpOptions) -> reqwest::Result<Self> {
        if options.accept_invalid_certs {
            warn!("TLS certificate verification is disabled for feed fetches");
        }

        let client = Client::builder()
            .user_agent(crate::USER_AGENT)
            .timeout(options.timeout)
            .danger_accept_invalid_certs(options.accept_invalid_certs)
            .build()?;

        Ok(Self { client })
    }
}

impl FeedFetcher for HttpFetcher {
    fn fetch(&self, url: &str, credentials: Option<&Credentials>) -> Result<Vec<u8>, FetchError> {
        let request_err = |source| FetchError::Request {
            url: url.to_string(),
            source,
        };

        let mut request = self.client.get(url);
        if let Some(creds) = credentials {
            request = request.basic_auth(&creds.username, Some(&creds.password));
        }

        let response = request.send().map_err(request_err)?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().map_err(request_err)?;
        debug!("Fetched {} bytes from {}", body.len(), url);
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    // The blocking client owns its own runtime, so it has to be built, used
    // and dropped off the async test runtime.
    async fn fetch_blocking(
        url: String,
        credentials: Option<Credentials>,
    ) -> Result<Vec<u8>, FetchError> {
        tokio::task::spawn_blocking(move || {
            let fetcher = HttpFetcher::new(&HttpOptions::default()).unwrap();
            fetcher.fetch(&url, credentials.as_ref())
        })
        .await
        .unwrap()
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn returns_body_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/feed"))
            .and(header("user-agent", crate::USER_AGENT))
            .respond_with(ResponseTemplate::new(200).set_body_string("<rss/>"))
            .expect(1)
            .mount(&server)
            .await;

        let body = fetch_blocking(format!("{}/feed", server.uri()), None)
            .await
            .unwrap();
        assert_eq!(body, b"<rss/>");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn sends_basic_auth() {
        let server = MockServer::start().await;
        // base64("alice:secret")
        Mock::given(method("GET"))
            .and(header("authorization", "Basic YWxpY2U6c2VjcmV0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .expect(1)
            .mount(&server)
            .await;

        let creds = Credentials {
            username: "alice".into(),
            password: "secret".into(),
        };
        let body = fetch_blocking(server.uri(), Some(creds)).await.unwrap();
        assert_eq!(body, b"ok");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn omits_auth_without_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("anon"))
            .mount(&server)
            .await;

        let body = fetch_blocking(server.uri(), None).await.unwrap();
        assert_eq!(body, b"anon");
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = fetch_blocking(server.uri(), None).await.unwrap_err();
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn connection_failure_is_an_error() {
        let server = MockServer::start().await;
        let url = server.uri();
        drop(server);

        let err = fetch_blocking(url, None).await.unwrap_err();
        assert!(matches!(err, FetchError::Request { .. }));
    }
}
