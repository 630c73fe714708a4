//! Todo API integration tests.
//!
//! Runs requests in-process against the router with `oneshot`, backed by
//! the in-memory item store and a warm key-set cache.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use authorizer::auth::{Authorizer, KeySetCache, SigningKey};
use authz_test_utils::{primary_keypair, secondary_keypair, TestTokenBuilder};
use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use todo_store::routes::{build_routes, AppState};
use todo_store::{InMemoryItemStore, ObjectStore, TodoService};
use tower::ServiceExt;

/// Object store whose contents tests can change.
#[derive(Default)]
struct TestObjectStore {
    stored: Mutex<HashSet<String>>,
}

impl TestObjectStore {
    fn put(&self, object_id: &str) {
        self.stored.lock().unwrap().insert(object_id.to_string());
    }
}

#[async_trait]
impl ObjectStore for TestObjectStore {
    async fn exists(&self, object_id: &str) -> bool {
        self.stored.lock().unwrap().contains(object_id)
    }

    fn upload_url(&self, object_id: &str) -> String {
        format!("https://objects.test/todo-attachments/{object_id}?method=PUT")
    }

    fn download_url(&self, object_id: &str) -> String {
        format!("https://objects.test/todo-attachments/{object_id}?method=GET")
    }
}

struct TestTodoApi {
    router: Router,
    objects: Arc<TestObjectStore>,
}

impl TestTodoApi {
    fn new() -> Self {
        let keypair = primary_keypair();
        let key = SigningKey::from_components(keypair.kid, keypair.n, keypair.e).unwrap();
        let authorizer = Authorizer::new(Arc::new(KeySetCache::prepopulated([key])), 60);

        let objects = Arc::new(TestObjectStore::default());
        let service = TodoService::new(Arc::new(InMemoryItemStore::new()), objects.clone());

        let state = Arc::new(AppState {
            service: Arc::new(service),
            authorizer: Arc::new(authorizer),
        });

        Self {
            router: build_routes(state),
            objects,
        }
    }

    async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, value)
    }

    async fn create(&self, token: &str, name: &str) -> Value {
        let (status, body) = self
            .send(
                Method::POST,
                "/todos",
                Some(token),
                Some(json!({"name": name, "dueDate": "2026-11-01"})),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED);
        body["item"].clone()
    }

    async fn list(&self, token: &str) -> Vec<Value> {
        let (status, body) = self.send(Method::GET, "/todos", Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        body["items"].as_array().cloned().unwrap()
    }
}

fn token_for(subject: &str) -> String {
    TestTokenBuilder::new()
        .subject(subject)
        .sign(&primary_keypair())
}

#[tokio::test]
async fn test_health_is_public() {
    let api = TestTodoApi::new();
    let response = api
        .router
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let api = TestTodoApi::new();

    let request = Request::builder()
        .uri("/todos")
        .body(Body::empty())
        .unwrap();
    let response = api.router.clone().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key("WWW-Authenticate"));
}

#[tokio::test]
async fn test_denied_token_is_unauthorized() {
    let api = TestTodoApi::new();

    let unknown_key = TestTokenBuilder::new().sign(&secondary_keypair());
    let expired = TestTokenBuilder::new()
        .expires_in_seconds(-3600)
        .sign(&primary_keypair());

    for token in [unknown_key.as_str(), expired.as_str(), "not-a-token"] {
        let (status, body) = api.send(Method::GET, "/todos", Some(token), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");
    }
}

#[tokio::test]
async fn test_create_uses_token_subject_as_owner() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");

    let item = api.create(&alice, "Buy milk").await;

    assert_eq!(item["userId"], "auth0|alice");
    assert_eq!(item["name"], "Buy milk");
    assert_eq!(item["done"], false);
    assert!(item["todoId"].as_str().is_some_and(|id| !id.is_empty()));

    let items = api.list(&alice).await;
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().unwrap()["todoId"], item["todoId"]);
}

#[tokio::test]
async fn test_list_is_scoped_to_owner() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");
    let bob = token_for("auth0|bob");

    api.create(&alice, "Alice's item").await;

    assert!(api.list(&bob).await.is_empty());
    assert_eq!(api.list(&alice).await.len(), 1);
}

#[tokio::test]
async fn test_create_rejects_bad_input() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");

    let (status, body) = api
        .send(
            Method::POST,
            "/todos",
            Some(alice.as_str()),
            Some(json!({"name": "  ", "dueDate": "2026-11-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = api
        .send(
            Method::POST,
            "/todos",
            Some(alice.as_str()),
            Some(json!({"dueDate": "2026-11-01"})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(api.list(&alice).await.is_empty());
}

#[tokio::test]
async fn test_update_own_item() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");
    let item = api.create(&alice, "Buy milk").await;
    let uri = format!("/todos/{}", item["todoId"].as_str().unwrap());

    let (status, _) = api
        .send(
            Method::PATCH,
            &uri,
            Some(alice.as_str()),
            Some(json!({"name": "Buy oat milk", "dueDate": "2026-11-02", "done": true})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let items = api.list(&alice).await;
    let updated = items.first().unwrap();
    assert_eq!(updated["name"], "Buy oat milk");
    assert_eq!(updated["done"], true);
}

#[tokio::test]
async fn test_update_foreign_or_missing_item_is_not_found() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");
    let bob = token_for("auth0|bob");
    let item = api.create(&alice, "Buy milk").await;
    let update = json!({"name": "hijacked", "dueDate": "2026-11-02", "done": true});

    let uri = format!("/todos/{}", item["todoId"].as_str().unwrap());
    let (status, body) = api
        .send(Method::PATCH, &uri, Some(bob.as_str()), Some(update.clone()))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (status, _) = api
        .send(Method::PATCH, "/todos/no-such-item", Some(alice.as_str()), Some(update))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    assert_eq!(api.list(&alice).await.first().unwrap()["name"], "Buy milk");
}

#[tokio::test]
async fn test_blank_todo_id_is_bad_request() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");

    let (status, _) = api
        .send(
            Method::PATCH,
            "/todos/%20",
            Some(alice.as_str()),
            Some(json!({"name": "x", "dueDate": "2026-11-02", "done": false})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = api
        .send(Method::POST, "/todos/%20/attachment", Some(alice.as_str()), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_own_item_and_ignore_foreign() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");
    let bob = token_for("auth0|bob");
    let item = api.create(&alice, "Buy milk").await;
    let uri = format!("/todos/{}", item["todoId"].as_str().unwrap());

    let (status, _) = api.send(Method::DELETE, &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(api.list(&alice).await.len(), 1);

    let (status, _) = api.send(Method::DELETE, &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(api.list(&alice).await.is_empty());
}

#[tokio::test]
async fn test_upload_url_requires_ownership() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");
    let bob = token_for("auth0|bob");
    let item = api.create(&alice, "Scan receipt").await;
    let todo_id = item["todoId"].as_str().unwrap();
    let uri = format!("/todos/{todo_id}/attachment");

    let (status, body) = api.send(Method::POST, &uri, Some(alice.as_str()), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["uploadUrl"],
        format!("https://objects.test/todo-attachments/{todo_id}?method=PUT")
    );

    let (status, body) = api.send(Method::POST, &uri, Some(bob.as_str()), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Todo item does not exist");
}

#[tokio::test]
async fn test_list_includes_attachment_url_once_uploaded() {
    let api = TestTodoApi::new();
    let alice = token_for("auth0|alice");
    let item = api.create(&alice, "Scan receipt").await;
    let todo_id = item["todoId"].as_str().unwrap();

    let before = api.list(&alice).await;
    assert!(before.first().unwrap().get("attachmentUrl").is_none());

    api.objects.put(todo_id);

    let after = api.list(&alice).await;
    assert_eq!(
        after.first().unwrap()["attachmentUrl"],
        format!("https://objects.test/todo-attachments/{todo_id}?method=GET")
    );
}
