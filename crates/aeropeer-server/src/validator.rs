//! Session validity decisions.
//!
//! The validator answers "is this session id still valid" for the
//! gate, consulting the validity cache first and falling back to the
//! session store. Store failures of any kind fail open: an
//! availability fault in the validation path must never lock out a
//! legitimate user, and a revoked session is still caught within one
//! TTL window of the store recovering.
//!
//! On the first confirmed-valid check for a session the validator also
//! fires an asynchronous, once-per-session enrichment call carrying the
//! request's device metadata. Enrichment is best-effort; failures are
//! logged and dropped.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use axum::http::HeaderMap;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use aeropeer_session::ValidityCache;

use crate::config::GateConfig;

// ─────────────────────────────────────────────────────────────────────────────
// Request context
// ─────────────────────────────────────────────────────────────────────────────

/// Device metadata carried alongside a validation check.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Requesting user agent, if the header was present.
    pub user_agent: Option<String>,

    /// Client IP as reported by the forwarding proxy.
    pub client_ip: Option<String>,
}

impl RequestContext {
    /// Build a context from request headers.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let user_agent = headers
            .get(axum::http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        // First hop of X-Forwarded-For is the original client.
        let client_ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string());

        Self {
            user_agent,
            client_ip,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session store
// ─────────────────────────────────────────────────────────────────────────────

/// Session store error.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("Store transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("Store answered status {0}")]
    Status(u16),

    /// The store answered 2xx with a body we could not parse.
    #[error("Malformed store response: {0}")]
    Malformed(String),
}

/// The persistent session store, seen from the gate.
///
/// The store owns the login-session records; the gate only asks it two
/// questions. `check_session` sits on the hot request path, so
/// implementations keep it to a single bounded round trip.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Ask whether a session is still valid (not revoked).
    async fn check_session(&self, session_id: &str) -> Result<bool, StoreError>;

    /// Attach device metadata to a session record.
    async fn record_device(
        &self,
        session_id: &str,
        context: &RequestContext,
    ) -> Result<(), StoreError>;
}

#[derive(Serialize)]
struct ValidateRequest<'a> {
    #[serde(rename = "sessionId")]
    session_id: &'a str,
}

#[derive(Deserialize)]
struct ValidateResponse {
    valid: bool,
}

#[derive(Serialize)]
struct EnrichRequest<'a> {
    #[serde(rename = "sessionId")]
    session_id: &'a str,
    #[serde(rename = "userAgent", skip_serializing_if = "Option::is_none")]
    user_agent: Option<&'a str>,
    #[serde(rename = "ipAddress", skip_serializing_if = "Option::is_none")]
    ip_address: Option<&'a str>,
}

/// HTTP client for the session store.
pub struct HttpSessionStore {
    client: Client,
    validate_url: String,
    enrich_url: String,
}

impl HttpSessionStore {
    /// Build a store client from the gate configuration.
    ///
    /// The client carries the configured request timeout so a hung
    /// store call resolves as a transport error instead of stalling
    /// the request indefinitely.
    pub fn from_config(config: &GateConfig) -> Result<Self, StoreError> {
        let client = Client::builder().timeout(config.store_timeout).build()?;

        Ok(Self {
            client,
            validate_url: config.validate_url.clone(),
            enrich_url: config.enrich_url.clone(),
        })
    }
}

#[async_trait]
impl SessionStore for HttpSessionStore {
    async fn check_session(&self, session_id: &str) -> Result<bool, StoreError> {
        let response = self
            .client
            .post(&self.validate_url)
            .json(&ValidateRequest { session_id })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status().as_u16()));
        }

        let body: ValidateResponse = response
            .json()
            .await
            .map_err(|e| StoreError::Malformed(e.to_string()))?;

        Ok(body.valid)
    }

    async fn record_device(
        &self,
        session_id: &str,
        context: &RequestContext,
    ) -> Result<(), StoreError> {
        let response = self
            .client
            .post(&self.enrich_url)
            .json(&EnrichRequest {
                session_id,
                user_agent: context.user_agent.as_deref(),
                ip_address: context.client_ip.as_deref(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Status(response.status().as_u16()));
        }

        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validator
// ─────────────────────────────────────────────────────────────────────────────

/// Cache-first session validity checker with fail-open semantics.
pub struct SessionValidator {
    cache: ValidityCache,
    store: Arc<dyn SessionStore>,
    /// Session ids already enriched this process lifetime.
    enriched: Arc<RwLock<HashSet<String>>>,
}

impl SessionValidator {
    /// Create a validator over a cache and a session store.
    pub fn new(cache: ValidityCache, store: Arc<dyn SessionStore>) -> Self {
        Self {
            cache,
            store,
            enriched: Arc::new(RwLock::new(HashSet::new())),
        }
    }

    /// The validity cache backing this validator.
    pub fn cache(&self) -> &ValidityCache {
        &self.cache
    }

    /// Decide whether a session is still valid.
    ///
    /// A fresh cache entry answers without a store round trip. On a
    /// miss the store is asked and its answer cached; concurrent
    /// misses for the same id may each reach the store, which is
    /// accepted — both writes carry the same truth and the cache
    /// converges within one TTL window. Any store failure returns
    /// `true` without caching.
    pub async fn is_valid(&self, session_id: &str, context: &RequestContext) -> bool {
        if let Some(entry) = self.cache.get(session_id).await {
            return entry.valid;
        }

        match self.store.check_session(session_id).await {
            Ok(valid) => {
                self.cache.put(session_id, valid).await;
                if valid {
                    self.spawn_enrichment(session_id, context).await;
                }
                valid
            }
            Err(err) => {
                warn!(
                    session_id = %session_id,
                    error = %err,
                    "Session store check failed, failing open"
                );
                true
            }
        }
    }

    /// Drop any cached entry for a session.
    ///
    /// Called by the gate once the store has confirmed a revocation,
    /// before the redirect is sent. Also forgets the enrichment mark;
    /// a session id is never reused across logins, so this only bounds
    /// the set.
    pub async fn invalidate(&self, session_id: &str) {
        self.cache.remove(session_id).await;
        self.enriched.write().await.remove(session_id);
    }

    /// Fire the once-per-session device-metadata enrichment.
    async fn spawn_enrichment(&self, session_id: &str, context: &RequestContext) {
        {
            let mut enriched = self.enriched.write().await;
            // The mark set must stay bounded alongside the validity
            // cache: sessions that go idle never pass through
            // `invalidate`, so without a ceiling the set grows one
            // entry per login for the process lifetime. Resetting it
            // only costs a repeat of the idempotent metadata call.
            if enriched.len() >= self.cache.config().max_entries && !enriched.contains(session_id)
            {
                debug!(
                    marks = enriched.len(),
                    "Enrichment mark set reached cache ceiling, resetting"
                );
                enriched.clear();
            }
            if !enriched.insert(session_id.to_string()) {
                return;
            }
        }

        let store = Arc::clone(&self.store);
        let session_id = session_id.to_string();
        let context = context.clone();

        tokio::spawn(async move {
            if let Err(err) = store.record_device(&session_id, &context).await {
                debug!(
                    session_id = %session_id,
                    error = %err,
                    "Device metadata enrichment failed"
                );
            }
        });
    }
}

impl Clone for SessionValidator {
    fn clone(&self) -> Self {
        Self {
            cache: self.cache.clone(),
            store: Arc::clone(&self.store),
            enriched: Arc::clone(&self.enriched),
        }
    }
}

/// Scripted session store for tests, shared with the gate's tests.
#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted store: answers a fixed result and counts calls.
    pub(crate) struct MockStore {
        /// `None` simulates a store failure.
        pub result: Option<bool>,
        pub check_calls: AtomicUsize,
        pub device_calls: AtomicUsize,
    }

    impl MockStore {
        pub fn answering(result: Option<bool>) -> Arc<Self> {
            Arc::new(Self {
                result,
                check_calls: AtomicUsize::new(0),
                device_calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl SessionStore for MockStore {
        async fn check_session(&self, _session_id: &str) -> Result<bool, StoreError> {
            self.check_calls.fetch_add(1, Ordering::SeqCst);
            match self.result {
                Some(valid) => Ok(valid),
                None => Err(StoreError::Malformed("connection refused".to_string())),
            }
        }

        async fn record_device(
            &self,
            _session_id: &str,
            _context: &RequestContext,
        ) -> Result<(), StoreError> {
            self.device_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
