//! Request gate and session revocation pipeline for aeropeer.
//!
//! This crate decides, on every protected page request, whether a
//! previously issued session credential is still valid:
//!
//! - a process-local validity cache (from `aeropeer-session`) answers
//!   most requests without touching the session store
//! - the session store is consulted on cache misses, with fail-open
//!   semantics on any store fault
//! - confirmed-revoked sessions are answered with a `302` to the
//!   localized login page and their cache entry is cleared
//!
//! # Example
//!
//! ```ignore
//! use aeropeer_server::{AppState, GateConfig, Server};
//!
//! let config = GateConfig::new(secret)
//!     .with_validate_url("http://store.internal/api/auth/validate-session");
//!
//! let state = AppState::from_config(config)?;
//! Server::new(state).with_app(pages_router).run().await?;
//! ```

pub mod config;
pub mod credential;
pub mod error;
pub mod gate;
pub mod locale;
pub mod routes;
pub mod state;
pub mod validator;

pub use config::GateConfig;
pub use credential::CredentialError;
pub use error::{Result, ServerError};
pub use gate::{REVOKED_ERROR, is_protected_path, session_gate};
pub use locale::locale_from_path;
pub use state::AppState;
pub use validator::{
    HttpSessionStore, RequestContext, SessionStore, SessionValidator, StoreError,
};

use std::net::SocketAddr;

use axum::{Router, middleware};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

/// The aeropeer gate server.
pub struct Server {
    /// Application state.
    state: AppState,

    /// Downstream application router the gate protects.
    app: Option<Router<AppState>>,
}

impl Server {
    /// Create a new server from application state.
    pub fn new(state: AppState) -> Self {
        Self { state, app: None }
    }

    /// Attach the downstream application router (page handlers).
    pub fn with_app(mut self, app: Router<AppState>) -> Self {
        self.app = Some(app);
        self
    }

    /// Build the router with the gate layered over the page routes.
    /// `/health` stays outside the gate so probes answer regardless of
    /// any credential the request happens to carry.
    pub fn router(&self) -> Router {
        let mut gated = Router::new().merge(routes::login_routes());

        if let Some(app) = &self.app {
            gated = gated.merge(app.clone());
        }

        // Gate runs before routing hands requests to pages
        let gated = gated.layer(middleware::from_fn_with_state(
            self.state.clone(),
            gate::session_gate,
        ));

        Router::new()
            .merge(routes::health_routes())
            .merge(gated)
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Run the server.
    pub async fn run(self) -> Result<()> {
        let addr = self.state.config.bind_address;
        self.run_on(addr).await
    }

    /// Run the server on a specific address (useful for testing).
    pub async fn run_on(self, addr: SocketAddr) -> Result<()> {
        let router = self.router();

        info!("Starting gate server on {}", addr);

        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::Internal(format!("Failed to bind: {}", e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| ServerError::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the configured bind address.
    pub fn bind_address(&self) -> SocketAddr {
        self.state.config.bind_address
    }
}
