//! Mocked key-discovery endpoint
//!
//! Wraps a `wiremock::MockServer` serving `GET /.well-known/jwks.json`.
//! Expectations set with the `*_expecting` helpers are verified when the
//! server is dropped.

use crate::crypto_fixtures::jwks_json;
use serde_json::Value;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Path the mock serves the key set on.
pub const JWKS_PATH: &str = "/.well-known/jwks.json";

/// A running mock identity provider exposing only its key set.
pub struct MockJwksServer {
    server: MockServer,
}

impl MockJwksServer {
    /// Start a server with nothing mounted (every request is a 404).
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Full URL of the key-discovery endpoint.
    pub fn jwks_url(&self) -> String {
        format!("{}{}", self.server.uri(), JWKS_PATH)
    }

    /// Serve `keys` as a discovery document.
    pub async fn mount_keys(&self, keys: &[Value]) {
        self.mount(ResponseTemplate::new(200).set_body_json(jwks_json(keys)), None, None)
            .await;
    }

    /// Serve `keys` and require exactly `calls` fetches.
    pub async fn mount_keys_expecting(&self, keys: &[Value], calls: u64) {
        self.mount(
            ResponseTemplate::new(200).set_body_json(jwks_json(keys)),
            None,
            Some(calls),
        )
        .await;
    }

    /// Serve `keys` after `delay`, requiring exactly `calls` fetches.
    pub async fn mount_slow_keys_expecting(&self, keys: &[Value], delay: Duration, calls: u64) {
        self.mount(
            ResponseTemplate::new(200)
                .set_body_json(jwks_json(keys))
                .set_delay(delay),
            None,
            Some(calls),
        )
        .await;
    }

    /// Answer the next `times` fetches with `status`. Mount before the
    /// success mock so it takes precedence while it lasts.
    pub async fn mount_failure(&self, status: u16, times: u64) {
        self.mount(ResponseTemplate::new(status), Some(times), None)
            .await;
    }

    /// Answer every fetch with a raw body.
    pub async fn mount_raw_body(&self, body: &str) {
        self.mount(
            ResponseTemplate::new(200).set_body_raw(body.to_owned(), "application/json"),
            None,
            None,
        )
        .await;
    }

    /// Number of key-set fetches received so far.
    pub async fn fetch_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map_or(0, |requests| {
                requests
                    .iter()
                    .filter(|request| request.url.path() == JWKS_PATH)
                    .count()
            })
    }

    async fn mount(&self, response: ResponseTemplate, up_to: Option<u64>, expect: Option<u64>) {
        let mut mock = Mock::given(method("GET"))
            .and(path(JWKS_PATH))
            .respond_with(response);
        if let Some(times) = up_to {
            mock = mock.up_to_n_times(times);
        }
        if let Some(calls) = expect {
            mock = mock.expect(calls);
        }
        mock.mount(&self.server).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto_fixtures::primary_keypair;

    async fn get_status(url: &str) -> u16 {
        reqwest::get(url).await.unwrap().status().as_u16()
    }

    #[tokio::test]
    async fn test_failure_precedes_success() {
        let server = MockJwksServer::start().await;
        server.mount_failure(503, 1).await;
        server.mount_keys(&[primary_keypair().jwk_json()]).await;

        assert_eq!(get_status(&server.jwks_url()).await, 503);
        assert_eq!(get_status(&server.jwks_url()).await, 200);
        assert_eq!(server.fetch_count().await, 2);
    }

    #[tokio::test]
    async fn test_unmounted_server_returns_404() {
        let server = MockJwksServer::start().await;
        assert_eq!(get_status(&server.jwks_url()).await, 404);
    }
}
