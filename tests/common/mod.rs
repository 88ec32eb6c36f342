#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use family_api::storage_manager::StorageManager;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub storage: Arc<StorageManager>,
}

impl TestApp {
    pub async fn new() -> Self {
        let storage = Arc::new(StorageManager::in_memory().await.unwrap());

        Self {
            router: family_api::router(storage.clone()),
            storage,
        }
    }

    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        self.send_request(request).await
    }

    pub async fn send_request(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = match bytes.is_empty() {
            true => Value::Null,
            false => serde_json::from_slice(&bytes).unwrap(),
        };

        (status, value)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::POST, uri, Some(body)).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(Method::PATCH, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Method::DELETE, uri, None).await
    }

    pub async fn parent_count(&self) -> usize {
        self.storage.parents().list().await.unwrap().len()
    }

    pub async fn child_count(&self) -> usize {
        self.storage.children().list().await.unwrap().len()
    }

    /// Creates the stock parent and returns its id.
    pub async fn seed_parent(&self) -> i64 {
        let (status, body) = self.post("/parents/", parent_data()).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }

    pub async fn seed_child(&self, parent: i64) -> i64 {
        let (status, body) = self.post("/children/", child_data(parent)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_i64().unwrap()
    }
}

pub fn parent_data() -> Value {
    json!({
        "first_name": "Shadman",
        "last_name": "Sakib",
        "street": "Khilgaon",
        "city": "Dhaka",
        "state": "Sabujbagh",
        "zip_code": "1214"
    })
}

pub fn child_data(parent: i64) -> Value {
    json!({
        "first_name": "Johnny",
        "last_name": "Sakib",
        "parent": parent
    })
}
