//! Common test utilities for integration tests.
//!
//! Runs the gate server against a scripted session-store HTTP server,
//! so the real reqwest client path (status handling, body parsing) is
//! exercised end to end.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get, routing::post};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::{Client, redirect};
use serde_json::json;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};

use aeropeer_server::{AppState, GateConfig, Server};

/// Shared secret for test credentials.
pub const SECRET: &str = "integration-secret";

const FAR_FUTURE_EXP: u64 = 4_102_444_800;

/// What the scripted store answers for validation calls.
#[derive(Debug, Clone, Copy)]
pub enum StoreScript {
    Valid,
    Revoked,
    ServerError,
    MalformedBody,
}

#[derive(Clone)]
struct StoreState {
    script: StoreScript,
    validate_calls: Arc<AtomicUsize>,
}

async fn validate_handler(State(state): State<StoreState>) -> axum::response::Response {
    state.validate_calls.fetch_add(1, Ordering::SeqCst);
    match state.script {
        StoreScript::Valid => Json(json!({ "valid": true })).into_response(),
        StoreScript::Revoked => Json(json!({ "valid": false })).into_response(),
        StoreScript::ServerError => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
        StoreScript::MalformedBody => "not json".into_response(),
    }
}

async fn activity_handler() -> StatusCode {
    StatusCode::OK
}

/// A gate server plus its scripted session store, both in-process.
pub struct TestServer {
    pub addr: SocketAddr,
    pub client: Client,
    validate_calls: Arc<AtomicUsize>,
    _gate_handle: JoinHandle<()>,
    _store_handle: JoinHandle<()>,
}

impl TestServer {
    /// Start a gate server whose store follows the given script.
    pub async fn start(script: StoreScript) -> Result<Self> {
        let validate_calls = Arc::new(AtomicUsize::new(0));

        // Scripted store server on an ephemeral port
        let store_state = StoreState {
            script,
            validate_calls: Arc::clone(&validate_calls),
        };
        let store_router = Router::new()
            .route("/api/auth/validate-session", post(validate_handler))
            .route("/api/auth/session-activity", post(activity_handler))
            .with_state(store_state);

        let store_listener = TcpListener::bind("127.0.0.1:0").await?;
        let store_addr = store_listener.local_addr()?;
        let store_handle = tokio::spawn(async move {
            let _ = axum::serve(store_listener, store_router).await;
        });

        // Gate server pointing at the scripted store
        let gate_listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = gate_listener.local_addr()?;
        drop(gate_listener);

        let config = GateConfig::new(SECRET)
            .with_bind_address(addr)
            .with_validate_url(format!("http://{store_addr}/api/auth/validate-session"))
            .with_enrich_url(format!("http://{store_addr}/api/auth/session-activity"))
            .with_store_timeout(Duration::from_secs(2));

        let state = AppState::from_config(config)?;
        let app = Router::new()
            .route("/{locale}/dashboard", get(|| async { "dashboard" }))
            .route("/{locale}/reports", get(|| async { "reports" }));

        let server = Server::new(state).with_app(app);
        let gate_handle = tokio::spawn(async move {
            let _ = server.run_on(addr).await;
        });

        // Redirects stay visible to assertions
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        wait_for_server(&client, addr).await?;

        Ok(Self {
            addr,
            client,
            validate_calls,
            _gate_handle: gate_handle,
            _store_handle: store_handle,
        })
    }

    /// Get the base URL for the gate server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Number of validation calls the store has seen.
    pub fn validate_calls(&self) -> usize {
        self.validate_calls.load(Ordering::SeqCst)
    }

    /// GET a path carrying a signed session credential.
    pub fn get_with_session(&self, path: &str, session_id: &str) -> reqwest::RequestBuilder {
        self.client
            .get(format!("{}{}", self.base_url(), path))
            .header("Cookie", format!("aeropeer.session-token={}", session_token(session_id)))
    }
}

/// Mint a signed credential carrying a login-session id.
pub fn session_token(session_id: &str) -> String {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &json!({
            "sub": "user-1",
            "loginSessionId": session_id,
            "exp": FAR_FUTURE_EXP,
        }),
        &EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap()
}

async fn wait_for_server(client: &Client, addr: SocketAddr) -> Result<()> {
    timeout(Duration::from_secs(5), async {
        loop {
            if let Ok(resp) = client.get(format!("http://{addr}/health")).send().await {
                if resp.status().is_success() {
                    return;
                }
            }
            sleep(Duration::from_millis(20)).await;
        }
    })
    .await?;
    Ok(())
}
