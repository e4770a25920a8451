#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;

use survey_savvy::config::SurveySavvyConfig;
use survey_savvy::domain::error::DomainError;
use survey_savvy::domain::ports::{PaymentIntent, PaymentProvider};
use survey_savvy::SurveySavvy;

pub const TOKEN_SECRET: &str = "integration-test-secret";

/// Fresh in-memory SQLite database with migrations applied.
pub async fn test_db() -> DatabaseConnection {
    let handle = savvy_db::DbHandle::connect("sqlite::memory:", savvy_db::ConnectOpts::default())
        .await
        .expect("Failed to connect to test database");
    let db = handle.sea();
    SurveySavvy::migrate(&db)
        .await
        .expect("Failed to run migrations");
    db
}

pub fn test_config() -> SurveySavvyConfig {
    let mut cfg = SurveySavvyConfig::default();
    cfg.auth.token_secret = TOKEN_SECRET.to_string();
    cfg
}

/// Payment provider that records every call and answers with a fixed intent.
#[derive(Default)]
pub struct FakeProvider {
    pub calls: Mutex<Vec<(i64, String)>>,
    pub fail: bool,
}

impl FakeProvider {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(i64, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentProvider for FakeProvider {
    async fn create_payment_intent(
        &self,
        amount: i64,
        currency: &str,
    ) -> Result<PaymentIntent, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((amount, currency.to_string()));
        if self.fail {
            return Err(DomainError::payment_provider("HTTP 500 Internal Server Error"));
        }
        Ok(PaymentIntent {
            id: format!("pi_{amount}"),
            client_secret: format!("pi_{amount}_secret_test"),
        })
    }
}

pub async fn test_module(provider: Arc<FakeProvider>) -> SurveySavvy {
    let db = test_db().await;
    SurveySavvy::with_provider(db, &test_config(), provider).expect("Failed to build module")
}

pub async fn test_app(provider: Arc<FakeProvider>) -> (SurveySavvy, Router) {
    let module = test_module(provider).await;
    let router = module.register_rest(Router::new());
    (module, router)
}

/// Send one request through `router` and decode the JSON body (Null when empty).
pub async fn send(
    router: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, json)
}
