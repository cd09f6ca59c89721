//! Shared integration test harness: an in-memory SQLite database with
//! migrations applied, a wiremock payment gateway, and a counting mailer.
#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{self, Body},
    http::{header, Method, Request},
    response::Response,
    Router,
};
use serde_json::Value;
use tokio::sync::{mpsc, Mutex};
use tower::ServiceExt;
use wiremock::MockServer;

use storefront_api::{
    app_router,
    config::AppConfig,
    db,
    events::EventSender,
    gateway::PaystackGateway,
    notifications::{EmailMessage, EmailSender, NotificationError},
    AppState,
};

pub const ADMIN_PASSWORD: &str = "correct-horse-battery";

/// Records every message instead of delivering it.
#[derive(Default)]
pub struct CountingMailer {
    pub sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl EmailSender for CountingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), NotificationError> {
        self.sent.lock().await.push(message);
        Ok(())
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: MockServer,
    pub mailer: Arc<CountingMailer>,
}

impl TestApp {
    pub async fn new() -> Self {
        let gateway_server = MockServer::start().await;

        let cfg = AppConfig {
            database_url: "sqlite::memory:".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "development".to_string(),
            log_level: "debug".to_string(),
            log_json: false,
            auto_migrate: true,
            paystack_secret_key: "sk_test_secret".to_string(),
            paystack_public_key: "pk_test_public".to_string(),
            paystack_base_url: gateway_server.uri(),
            gateway_timeout_secs: 5,
            currency: "NGN".to_string(),
            email_api_url: None,
            email_api_key: None,
            email_from: "orders@shop.test".to_string(),
            email_timeout_secs: 5,
            admin_password: ADMIN_PASSWORD.to_string(),
            admin_token_secret: "0123456789abcdefghijklmnopqrstuvwxyz".to_string(),
            admin_token_expiration_secs: 1800,
            cors_allowed_origins: None,
            cors_allow_any_origin: false,
        };

        let pool = db::establish_connection(&cfg.database_url)
            .await
            .expect("in-memory database");
        db::run_migrations(&pool).await.expect("migrations");

        let (event_tx, mut event_rx) = mpsc::channel(64);
        tokio::spawn(async move { while event_rx.recv().await.is_some() {} });

        let gateway = Arc::new(PaystackGateway::from_config(&cfg).expect("gateway client"));
        let mailer = Arc::new(CountingMailer::default());

        let state = AppState::new(
            Arc::new(pool),
            cfg,
            gateway,
            mailer.clone(),
            EventSender::new(event_tx),
        );

        Self {
            router: app_router(state.clone()),
            state,
            gateway: gateway_server,
            mailer,
        }
    }

    pub async fn request(&self, method: Method, path: &str, json: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(path);
        let body = match json {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    pub async fn request_with_token(
        &self,
        method: Method,
        path: &str,
        token: &str,
        json: Option<Value>,
    ) -> Response {
        let mut builder = Request::builder()
            .method(method)
            .uri(path)
            .header(header::AUTHORIZATION, format!("Bearer {token}"));
        let body = match json {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        self.router
            .clone()
            .oneshot(builder.body(body).expect("request"))
            .await
            .expect("response")
    }

    /// Logs in with the shared secret and returns a session token.
    pub async fn admin_token(&self) -> String {
        let response = self
            .request(
                Method::POST,
                "/api/admin/login",
                Some(serde_json::json!({ "password": ADMIN_PASSWORD })),
            )
            .await;
        assert_eq!(response.status(), 200, "admin login should succeed");

        let body = response_json(response).await;
        body["token"].as_str().expect("token in body").to_string()
    }

    pub async fn sent_emails(&self) -> Vec<EmailMessage> {
        self.mailer.sent.lock().await.clone()
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}
