#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{json, Value};

use crm_api_rust::config::AppConfig;
use crm_api_rust::database::{Database, DatabaseManager};
use crm_api_rust::{app, AppState};

/// One server per test: its own port and its own in-memory database
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub db: Database,
}

impl TestServer {
    pub async fn spawn() -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let pool = DatabaseManager::in_memory().await?;
        let mut config = AppConfig::development();
        config.security.jwt_secret = "integration-test-secret".to_string();
        config.api.enable_request_logging = false;

        let state = AppState::new(pool, config)?;
        let db = state.db.clone();

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .with_context(|| format!("failed to bind port {}", port))?;
        tokio::spawn(async move {
            let _ = axum::serve(listener, app(state)).await;
        });

        let server = Self { port, base_url, db };
        server.wait_ready(Duration::from_secs(5)).await?;
        Ok(server)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        let url = format!("{}/health", self.base_url);
        while Instant::now() < deadline {
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    /// A client without a session cookie
    pub fn anonymous(&self) -> Session {
        Session {
            client: reqwest::Client::new(),
            base_url: self.base_url.clone(),
            cookie: None,
        }
    }

    /// A client that registered `email` and holds its session cookie
    pub async fn signed_in_as(&self, email: &str) -> Result<Session> {
        let mut session = self.anonymous();
        let res = session.register(email, "correct horse battery staple").await?;
        anyhow::ensure!(
            res.status() == StatusCode::CREATED,
            "registration failed: {}",
            res.status()
        );
        Ok(session)
    }

    pub async fn signed_in(&self) -> Result<Session> {
        self.signed_in_as("tester@example.com").await
    }
}

/// HTTP client that carries the `auth-token` cookie by hand
pub struct Session {
    client: reqwest::Client,
    base_url: String,
    pub cookie: Option<String>,
}

impl Session {
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        match &self.cookie {
            Some(cookie) => builder.header(COOKIE, cookie),
            None => builder,
        }
    }

    pub async fn get(&self, path: &str) -> Result<Response> {
        Ok(self.request(Method::GET, path).send().await?)
    }

    pub async fn post(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self.request(Method::POST, path).json(body).send().await?)
    }

    pub async fn put(&self, path: &str, body: &Value) -> Result<Response> {
        Ok(self.request(Method::PUT, path).json(body).send().await?)
    }

    pub async fn delete(&self, path: &str) -> Result<Response> {
        Ok(self.request(Method::DELETE, path).send().await?)
    }

    pub async fn register(&mut self, email: &str, password: &str) -> Result<Response> {
        let res = self
            .post("/auth/register", &json!({ "email": email, "password": password }))
            .await?;
        self.remember_cookie(&res);
        Ok(res)
    }

    pub async fn login(&mut self, email: &str, password: &str) -> Result<Response> {
        let res = self
            .post("/auth/login", &json!({ "email": email, "password": password }))
            .await?;
        self.remember_cookie(&res);
        Ok(res)
    }

    fn remember_cookie(&mut self, res: &Response) {
        if let Some(cookie) = set_cookie(res) {
            self.cookie = cookie.split(';').next().map(str::to_string);
        }
    }
}

/// Raw `Set-Cookie` header of a response, if any
pub fn set_cookie(res: &Response) -> Option<String> {
    res.headers()
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}

/// Create a record and return its JSON body, failing unless the server says 201
pub async fn create(session: &Session, path: &str, body: Value) -> Result<Value> {
    let res = session.post(path, &body).await?;
    let status = res.status();
    let json: Value = res.json().await?;
    anyhow::ensure!(status == StatusCode::CREATED, "POST {} -> {}: {}", path, status, json);
    Ok(json)
}

/// `id` field of a record body
pub fn id_of(record: &Value) -> String {
    record["id"].as_str().unwrap_or_default().to_string()
}

/// Sorted ids of an embedded `[{id, ...}]` list
pub fn ids_in(record: &Value, field: &str) -> Vec<String> {
    let mut ids: Vec<String> = record[field]
        .as_array()
        .map(|items| items.iter().map(id_of).collect())
        .unwrap_or_default();
    ids.sort();
    ids
}
