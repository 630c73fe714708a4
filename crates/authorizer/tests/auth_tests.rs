//! Authorization integration tests.
//!
//! Drives `POST /v1/authorize` on a real server whose key set comes from a
//! mocked key-discovery endpoint.

// Test code is allowed to use expect/unwrap for assertions
#![allow(clippy::unwrap_used, clippy::expect_used)]

use anyhow::Result;
use authorizer::auth::Authorizer;
use authorizer::config::Config;
use authorizer::observability::metrics::init_metrics_recorder;
use authorizer::routes::{self, AppState};
use authz_test_utils::{primary_keypair, secondary_keypair, MockJwksServer, TestTokenBuilder};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

fn get_test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

/// Authorizer server backed by a mocked identity provider.
struct TestAuthzServer {
    addr: SocketAddr,
    authorizer: Arc<Authorizer>,
    _server_handle: JoinHandle<()>,
}

impl TestAuthzServer {
    async fn spawn(jwks: &MockJwksServer) -> Result<Self> {
        let vars = HashMap::from([
            ("BIND_ADDRESS".to_string(), "127.0.0.1:0".to_string()),
            ("JWKS_URL".to_string(), jwks.jwks_url()),
            ("JWKS_FETCH_TIMEOUT_SECONDS".to_string(), "2".to_string()),
        ]);

        let config = Config::from_vars(&vars)
            .map_err(|e| anyhow::anyhow!("Failed to create config: {}", e))?;

        let authorizer = Arc::new(Authorizer::from_config(&config));
        let state = Arc::new(AppState {
            authorizer: authorizer.clone(),
        });

        let app = routes::build_routes(state, get_test_metrics_handle());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind test server: {}", e))?;

        let addr = listener
            .local_addr()
            .map_err(|e| anyhow::anyhow!("Failed to get local address: {}", e))?;

        let server_handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                eprintln!("Test server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            authorizer,
            _server_handle: server_handle,
        })
    }

    fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    async fn authorize(&self, authorization_token: Option<&str>) -> Result<Value> {
        let mut body = json!({
            "type": "TOKEN",
            "methodArn": "arn:aws:execute-api:us-east-1:123456789012:abcdef/dev/GET/todos"
        });
        if let Some(token) = authorization_token {
            body["authorizationToken"] = Value::from(token);
        }

        let response = reqwest::Client::new()
            .post(format!("{}/v1/authorize", self.url()))
            .json(&body)
            .send()
            .await?;

        assert_eq!(response.status(), 200, "authorize always answers 200");
        Ok(response.json().await?)
    }
}

impl Drop for TestAuthzServer {
    fn drop(&mut self) {
        self._server_handle.abort();
    }
}

fn effect(decision: &Value) -> &str {
    decision["policyDocument"]["Statement"][0]["Effect"]
        .as_str()
        .unwrap()
}

fn assert_deny(decision: &Value) {
    assert_eq!(effect(decision), "Deny");
    assert_eq!(decision["principalId"], "anonymous");
    assert!(decision.get("context").is_none());
}

// =============================================================================
// Tests
// =============================================================================

/// A valid token is allowed with its subject as principal.
#[tokio::test]
async fn test_valid_token_is_allowed() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_keys(&[primary_keypair().jwk_json()]).await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new()
        .subject("auth0|alice")
        .issuer("https://idp.example.com/")
        .sign(&primary_keypair());

    let decision = server.authorize(Some(&format!("Bearer {token}"))).await?;

    assert_eq!(
        decision,
        json!({
            "principalId": "auth0|alice",
            "policyDocument": {
                "Version": "2012-10-17",
                "Statement": [{
                    "Action": "execute-api:Invoke",
                    "Effect": "Allow",
                    "Resource": "*"
                }]
            },
            "context": { "issuer": "https://idp.example.com/" }
        })
    );

    Ok(())
}

/// A key published only as an x5c certificate verifies tokens.
#[tokio::test]
async fn test_certificate_only_key_is_usable() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_keys(&[primary_keypair().certificate_jwk_json()])
        .await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new().sign(&primary_keypair());
    let decision = server.authorize(Some(&format!("bearer {token}"))).await?;

    assert_eq!(effect(&decision), "Allow");
    Ok(())
}

/// Missing, empty, and non-bearer headers are denied.
#[tokio::test]
async fn test_bad_credentials_are_denied() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_keys(&[primary_keypair().jwk_json()]).await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new().sign(&primary_keypair());
    let basic = format!("Basic {token}");

    for header in [None, Some(""), Some(basic.as_str()), Some(token.as_str())] {
        assert_deny(&server.authorize(header).await?);
    }

    // None of these needed the key set
    assert!(!server.authorizer.key_cache().is_populated());
    Ok(())
}

/// Expired, wrongly signed, and unknown-kid tokens are denied identically.
#[tokio::test]
async fn test_invalid_tokens_are_denied() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_keys(&[primary_keypair().jwk_json()]).await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let expired = TestTokenBuilder::new()
        .expires_in_seconds(-3600)
        .sign(&primary_keypair());
    let forged = TestTokenBuilder::new()
        .kid(primary_keypair().kid)
        .sign(&secondary_keypair());
    let unknown_kid = TestTokenBuilder::new().sign(&secondary_keypair());

    let mut decisions = Vec::new();
    for token in [expired, forged, unknown_kid, "not.a.jwt".to_string()] {
        let decision = server.authorize(Some(&format!("Bearer {token}"))).await?;
        assert_deny(&decision);
        decisions.push(decision);
    }

    assert!(decisions.windows(2).all(|pair| pair.first() == pair.last()));
    Ok(())
}

/// The key set is fetched once and served from memory afterwards.
#[tokio::test]
async fn test_key_set_fetched_once() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_keys_expecting(&[primary_keypair().jwk_json()], 1)
        .await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    for _ in 0..5 {
        let token = TestTokenBuilder::new().sign(&primary_keypair());
        let decision = server.authorize(Some(&format!("Bearer {token}"))).await?;
        assert_eq!(effect(&decision), "Allow");
    }

    // A kid rotated in after warm-up is not picked up
    let rotated = TestTokenBuilder::new().sign(&secondary_keypair());
    assert_deny(&server.authorize(Some(&format!("Bearer {rotated}"))).await?);

    assert_eq!(jwks.fetch_count().await, 1);
    assert_eq!(server.authorizer.key_cache().key_count(), 1);
    Ok(())
}

/// Concurrent first requests share a single fetch.
#[tokio::test]
async fn test_concurrent_cold_requests_fetch_once() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_slow_keys_expecting(
        &[primary_keypair().jwk_json()],
        Duration::from_millis(200),
        1,
    )
    .await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new().sign(&primary_keypair());
    let header = format!("Bearer {token}");

    let decisions =
        futures::future::join_all((0..10).map(|_| server.authorize(Some(&header)))).await;

    for decision in decisions {
        assert_eq!(effect(&decision?), "Allow");
    }
    assert_eq!(jwks.fetch_count().await, 1);
    Ok(())
}

/// A failed fetch denies and leaves the cache cold; the next request retries.
#[tokio::test]
async fn test_failed_fetch_is_retried() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_failure(503, 1).await;
    jwks.mount_keys(&[primary_keypair().jwk_json()]).await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new().sign(&primary_keypair());
    let header = format!("Bearer {token}");

    assert_deny(&server.authorize(Some(&header)).await?);
    assert!(!server.authorizer.key_cache().is_populated());

    assert_eq!(effect(&server.authorize(Some(&header)).await?), "Allow");
    assert!(server.authorizer.key_cache().is_populated());
    assert_eq!(jwks.fetch_count().await, 2);
    Ok(())
}

/// An unparsable discovery document denies.
#[tokio::test]
async fn test_unparsable_key_set_is_denied() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_raw_body("<html>not json</html>").await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new().sign(&primary_keypair());
    assert_deny(&server.authorize(Some(&format!("Bearer {token}"))).await?);
    assert!(!server.authorizer.key_cache().is_populated());
    Ok(())
}

/// A discovery document without a `keys` member is an empty key set.
#[tokio::test]
async fn test_key_set_without_keys_member_denies_everything() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    jwks.mount_raw_body("{}").await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let token = TestTokenBuilder::new().sign(&primary_keypair());
    assert_deny(&server.authorize(Some(&format!("Bearer {token}"))).await?);

    assert!(server.authorizer.key_cache().is_populated());
    assert_eq!(server.authorizer.key_cache().key_count(), 0);
    Ok(())
}

/// A body that is not a valid event is a 400, not a decision.
#[tokio::test]
async fn test_malformed_body_is_bad_request() -> Result<()> {
    let jwks = MockJwksServer::start().await;
    let server = TestAuthzServer::spawn(&jwks).await?;

    let response = reqwest::Client::new()
        .post(format!("{}/v1/authorize", server.url()))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await?;

    assert_eq!(response.status(), 400);
    let body: Value = response.json().await?;
    assert_eq!(body["error"]["code"], "BAD_REQUEST");
    Ok(())
}
