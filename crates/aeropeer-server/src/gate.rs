//! Request gate middleware.
//!
//! Intercepts every inbound request: unprotected paths pass straight
//! through, protected paths have their credential's session id checked
//! against the validator, and a confirmed-revoked session is answered
//! with a localized login redirect before downstream routing runs.
//!
//! Every failure in this gate resolves to "proceed". A broken
//! credential, a store outage, or any other fault on this path must
//! never produce a 500 or block a legitimate request; the only
//! user-visible outcome the gate itself produces is the deliberate
//! revocation redirect.

use axum::{
    body::Body,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use crate::credential;
use crate::locale::locale_from_path;
use crate::state::AppState;
use crate::validator::RequestContext;

/// Error indicator appended to the login redirect.
pub const REVOKED_ERROR: &str = "SessionRevoked";

/// Decide whether a path is subject to the gate.
///
/// Login pages, API routes, framework asset routes, and dotted paths
/// (static files) bypass the gate entirely. The checks are exact,
/// case-sensitive substring matches.
pub fn is_protected_path(path: &str) -> bool {
    !(path.contains("/login")
        || path.contains("/api/")
        || path.contains("/_next/")
        || path.contains('.'))
}

/// Session gate middleware.
///
/// Layered outside the application router so it runs before locale
/// negotiation; the redirect therefore derives its locale from the raw
/// path rather than a resolved locale.
pub async fn session_gate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();

    if !is_protected_path(&path) {
        return next.run(request).await;
    }

    let session_id = match credential::extract_session_id(request.headers(), &state.config) {
        Ok(Some(id)) => id,
        // No credential or no session id: anonymous. Page-level
        // authorization is enforced downstream, not here.
        Ok(None) => return next.run(request).await,
        Err(err) => {
            debug!(path = %path, error = %err, "Credential decode failed, treating as anonymous");
            return next.run(request).await;
        }
    };

    let context = RequestContext::from_headers(request.headers());

    if state.validator.is_valid(&session_id, &context).await {
        return next.run(request).await;
    }

    // Confirmed revocation: clear the cached entry before responding
    // so a stale positive cannot re-admit this session within the TTL
    // window.
    state.validator.invalidate(&session_id).await;

    let locale = locale_from_path(&path, &state.config.default_locale);
    info!(
        session_id = %session_id,
        path = %path,
        locale = %locale,
        "Revoked session redirected to login"
    );

    revoked_redirect(locale)
}

/// Build the `302` redirect to the localized login page.
fn revoked_redirect(locale: &str) -> Response {
    let location = format!("/{locale}/login?error={REVOKED_ERROR}");
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}
