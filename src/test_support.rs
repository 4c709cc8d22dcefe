//! Helpers shared by unit tests.

use axum::Router;
use serde_json::{json, Value};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

use crate::core::config::Config;
use crate::core::error::MapError;
use crate::core::state::AppState;
use crate::directory::loader::render_users;
use crate::maps::widget::{MapEngine, MapSpec, MapWidget};
use crate::models::user::{UserId, UserRecord};

/// Config with short settle delays so tests run quickly
pub fn test_config(endpoint: &str) -> Config {
    let mut config = Config::default();
    config.source.users_endpoint = endpoint.to_string();
    config.source.timeout_secs = 5;
    config.layout.collapse_settle_ms = 5;
    config.layout.expand_settle_ms = 5;
    config.layout.remeasure_ms = 5;
    config.layout.ready_timeout_ms = 1000;
    config
}

pub fn state_for_endpoint(endpoint: &str) -> AppState {
    AppState::new(test_config(endpoint)).unwrap()
}

/// State whose page already shows `users`
pub async fn state_with_users(users: Vec<UserRecord>) -> AppState {
    state_with_config(users, test_config("http://127.0.0.1:9/users")).await
}

pub async fn state_with_config(users: Vec<UserRecord>, config: Config) -> AppState {
    let state = AppState::new(config).unwrap();
    render_into(&state, users).await;
    state
}

/// State whose map engine always fails with `message`
pub async fn failing_state(users: Vec<UserRecord>, message: &str) -> AppState {
    let engine: Arc<dyn MapEngine> = Arc::new(FailingEngine(message.to_string()));
    let state =
        AppState::with_engine(test_config("http://127.0.0.1:9/users"), engine).unwrap();
    render_into(&state, users).await;
    state
}

async fn render_into(state: &AppState, users: Vec<UserRecord>) {
    let mut doc = state.document.write().await;
    render_users(&mut doc, users);
}

pub struct FailingEngine(pub String);

impl MapEngine for FailingEngine {
    fn create(&self, _spec: MapSpec) -> Result<Box<dyn MapWidget>, MapError> {
        Err(MapError::Construction(self.0.clone()))
    }
}

pub fn user_at(id: UserId, lat: Value, lng: Value) -> UserRecord {
    serde_json::from_value(json!({
        "id": id,
        "name": format!("User {}", id),
        "username": format!("user{}", id),
        "email": format!("user{}@example.com", id),
        "phone": "1-770-736-8031",
        "address": {
            "street": "Kulas Light",
            "city": "Gwenborough",
            "geo": { "lat": lat, "lng": lng }
        },
        "company": { "name": "Romaguera-Crona" }
    }))
    .unwrap()
}

/// Users 1..=n with valid coordinates
pub fn sample_users(n: u64) -> Vec<UserRecord> {
    (1..=n)
        .map(|id| {
            let lat = format!("{:.4}", -37.3159 + id as f64);
            let lng = format!("{:.4}", 81.1496 - id as f64);
            user_at(id, json!(lat), json!(lng))
        })
        .collect()
}

/// Serve `router` on an ephemeral port and return its base URL
pub async fn serve(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

/// Poll `condition` until it holds, failing the test after two seconds
pub async fn wait_until<F>(condition: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Async variant of [`wait_until`]
pub async fn wait_until_async<F, Fut>(condition: F)
where
    F: Fn() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not met in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
