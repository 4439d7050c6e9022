#![allow(dead_code)]

use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use sensorhub_api::auth::TokenService;
use sensorhub_api::config::{AppConfig, PasswordConfig, StoreBackend};
use sensorhub_api::database::Store;
use sensorhub_api::{app, AppState};

pub const PASSWORD: &str = "correct horse battery";

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.backend = StoreBackend::Memory;
    config.api.enable_request_logging = false;
    config.security.jwt_secret = "integration-test-secret-0123456789abcdef".to_string();
    config.security.password = PasswordConfig {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    };
    config
}

/// The full router over a fresh in-memory store, driven without a socket
pub struct TestApp {
    router: Router,
    pub tokens: Arc<TokenService>,
    pub config: AppConfig,
}

pub struct Reply {
    pub status: StatusCode,
    pub set_cookie: Option<String>,
    pub body: Value,
}

impl Reply {
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }

    pub fn error_code(&self) -> &str {
        self.body["error"]["code"].as_str().unwrap_or_default()
    }
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let state = AppState::new(Store::in_memory(), &config.security).expect("app state");
        let tokens = state.tokens.clone();
        Self {
            router: app(state, &config),
            tokens,
            config,
        }
    }

    pub async fn send(&self, request: Request<Body>) -> Reply {
        let response = self.router.clone().oneshot(request).await.expect("router is infallible");
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        Reply {
            status,
            set_cookie,
            body,
        }
    }

    pub async fn call(&self, method: Method, path: &str, token: Option<&str>, body: Option<Value>) -> Reply {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("request");
        self.send(request).await
    }

    pub async fn get(&self, path: &str, token: &str) -> Reply {
        self.call(Method::GET, path, Some(token), None).await
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> Reply {
        self.call(Method::POST, path, Some(token), Some(body)).await
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> Reply {
        self.call(Method::PUT, path, Some(token), Some(body)).await
    }

    pub async fn delete(&self, path: &str, token: &str) -> Reply {
        self.call(Method::DELETE, path, Some(token), None).await
    }

    pub async fn create_organization(&self, name: &str) -> String {
        let reply = self
            .call(Method::POST, "/organizations", None, Some(json!({ "name": name })))
            .await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        reply.data()["id"].as_str().expect("organization id").to_string()
    }

    pub async fn signup(&self, organization_id: &str, email: &str, display_name: &str) -> Reply {
        self.call(
            Method::POST,
            "/auth/signup",
            None,
            Some(json!({
                "organizationId": organization_id,
                "email": email,
                "displayName": display_name,
                "password": PASSWORD,
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str) -> String {
        let reply = self
            .call(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "{}", reply.body);
        reply.data()["token"].as_str().expect("token").to_string()
    }

    /// Sign up and log in; returns (user id, token)
    pub async fn member(&self, organization_id: &str, email: &str, display_name: &str) -> (String, String) {
        let reply = self.signup(organization_id, email, display_name).await;
        assert_eq!(reply.status, StatusCode::CREATED, "{}", reply.body);
        let id = reply.data()["id"].as_str().expect("user id").to_string();
        (id, self.login(email).await)
    }
}

/// The compiled binary on a free port, backed by the in-memory store
pub struct TestServer {
    pub base_url: String,
    child: Child,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let child = Command::new(env!("CARGO_BIN_EXE_sensorhub-api"))
            .arg("--store")
            .arg("memory")
            .arg("--port")
            .arg(port.to_string())
            .env("SERVER_HOST", "127.0.0.1")
            .env("JWT_SECRET", "integration-test-secret-0123456789abcdef")
            .env("PASSWORD_MEMORY_KIB", "64")
            .env("PASSWORD_ITERATIONS", "1")
            .env("RUST_LOG", "warn")
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
            .context("failed to spawn server binary")?;

        let server = Self { base_url, child };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        while Instant::now() < deadline {
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status().is_success() {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
