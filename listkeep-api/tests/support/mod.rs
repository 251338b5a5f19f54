//! Shared harness for the HTTP integration tests.
//!
//! Builds an [`AppState`] over seeded in-memory stores wrapped in
//! [`CountingStore`], with a [`CountingLatency`] recompute cost, and drives
//! the full router with `tower::ServiceExt::oneshot`.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use listkeep_api::{
    create_api_router, ApiConfig, AppState, AuthConfig, FixedClock, ItemServices, SharedCache,
};
use listkeep_core::{Product, RetrievalConfig, TodoItem, UserInfo};
use listkeep_storage::ItemStore;
use listkeep_test_utils::fixtures::{seeded_product_store, seeded_todo_store_with_flags};
use listkeep_test_utils::{CountingLatency, CountingStore, StoreCalls};
use serde_json::Value;
use tower::ServiceExt;

pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Recompute cost used by every harness.
pub const RECOMPUTE: Duration = Duration::from_secs(3);

/// 2024-01-01 00:00:00 UTC; tokens issued and checked against it.
pub const TOKEN_EPOCH: i64 = 1_704_067_200;

pub const API_KEY: &str = "integration_key_0001";

pub fn test_auth_config() -> AuthConfig {
    AuthConfig::default()
        .with_secret("integration_test_secret_with_enough_length")
        .with_clock(Arc::new(FixedClock(TOKEN_EPOCH)))
        .with_api_key(API_KEY)
}

/// Everything a test needs to drive and observe the service.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub todo_calls: Arc<StoreCalls>,
    pub product_calls: Arc<StoreCalls>,
    pub todo_latency: Arc<CountingLatency>,
    pub product_latency: Arc<CountingLatency>,
}

/// Builder for [`TestApp`].
pub struct TestAppBuilder {
    todo_flags: Vec<bool>,
    products: Vec<(String, f64)>,
    retrieval: RetrievalConfig,
    api_config: ApiConfig,
}

impl TestAppBuilder {
    pub fn new() -> Self {
        Self {
            todo_flags: Vec::new(),
            products: Vec::new(),
            retrieval: RetrievalConfig::default(),
            api_config: ApiConfig::default(),
        }
    }

    /// Seed `count` open todos with ids `1..=count`.
    pub fn todos(mut self, count: usize) -> Self {
        self.todo_flags = vec![false; count];
        self
    }

    /// Seed one todo per flag; todo `i + 1` is completed when `flags[i]`.
    pub fn todo_flags(mut self, flags: &[bool]) -> Self {
        self.todo_flags = flags.to_vec();
        self
    }

    pub fn products(mut self, products: &[(&str, f64)]) -> Self {
        self.products = products
            .iter()
            .map(|(name, price)| (name.to_string(), *price))
            .collect();
        self
    }

    pub fn retrieval(mut self, retrieval: RetrievalConfig) -> Self {
        self.retrieval = retrieval;
        self
    }

    pub fn api_config(mut self, api_config: ApiConfig) -> Self {
        self.api_config = api_config;
        self
    }

    pub async fn build(self) -> TestResult<TestApp> {
        let todo_store = CountingStore::<TodoItem, _>::new(
            seeded_todo_store_with_flags(&self.todo_flags).await?,
        );
        let todo_calls = todo_store.calls();
        let todo_store: Arc<dyn ItemStore<TodoItem>> = Arc::new(todo_store);

        let pairs: Vec<(&str, f64)> = self
            .products
            .iter()
            .map(|(name, price)| (name.as_str(), *price))
            .collect();
        let product_store =
            CountingStore::<Product, _>::new(seeded_product_store(&pairs).await?);
        let product_calls = product_store.calls();
        let product_store: Arc<dyn ItemStore<Product>> = Arc::new(product_store);

        let todo_latency = Arc::new(CountingLatency::new(RECOMPUTE));
        let product_latency = Arc::new(CountingLatency::new(RECOMPUTE));

        let cache = Arc::new(SharedCache::new());
        let todos = ItemServices::new(todo_store, Arc::clone(&cache), self.retrieval.clone())
            .with_latency(todo_latency.clone());
        let products = ItemServices::new(product_store, Arc::clone(&cache), self.retrieval)
            .with_latency(product_latency.clone());

        let state = AppState::new(cache, todos, products, self.api_config, test_auth_config());
        let router = create_api_router(state.clone());

        Ok(TestApp {
            router,
            state,
            todo_calls,
            product_calls,
            todo_latency,
            product_latency,
        })
    }
}

/// A response with its body parsed as JSON (or `Null` when empty or not JSON).
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
    pub text: String,
}

impl TestApp {
    pub fn bearer(&self, user_id: &str) -> TestResult<String> {
        let token = self.state.auth_config.issue_token(&UserInfo::new(user_id))?;
        Ok(format!("Bearer {}", token))
    }

    pub async fn send(&self, request: Request<Body>) -> TestResult<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let bytes = response.into_body().collect().await?.to_bytes();
        let text = String::from_utf8_lossy(&bytes).to_string();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        Ok(TestResponse { status, body, text })
    }

    /// Send a request as `user`, or anonymously when `None`.
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        user: Option<&str>,
        body: Option<Value>,
    ) -> TestResult<TestResponse> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = user {
            builder = builder.header(header::AUTHORIZATION, self.bearer(user)?);
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json)?))?,
            None => builder.body(Body::empty())?,
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, user: Option<&str>) -> TestResult<TestResponse> {
        self.call(Method::GET, uri, user, None).await
    }

    pub async fn post(
        &self,
        uri: &str,
        user: Option<&str>,
        body: Value,
    ) -> TestResult<TestResponse> {
        self.call(Method::POST, uri, user, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, user: Option<&str>) -> TestResult<TestResponse> {
        self.call(Method::DELETE, uri, user, None).await
    }
}

/// Ids of the `items` array in a paginated response, or of a bare array.
pub fn ids(body: &Value) -> Vec<i64> {
    let items = body.get("items").unwrap_or(body);
    items
        .as_array()
        .map(|items| items.iter().filter_map(|i| i["id"].as_i64()).collect())
        .unwrap_or_default()
}
