//! Signed credential decoding.
//!
//! The credential is an HS256 JWT carried either in the session cookie
//! or as a bearer `Authorization` header. The gate only cares about one
//! claim: the login-session identifier minted at issuance time. A
//! missing credential and a credential without that claim are both
//! "anonymous", not errors; decode failures are reported as a typed
//! error so the gate can branch to fail-open explicitly.

use axum::http::{HeaderMap, header::AUTHORIZATION, header::COOKIE};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use thiserror::Error;

use crate::config::GateConfig;

/// Credential decode error.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Header contained non-ASCII bytes.
    #[error("Malformed header value")]
    MalformedHeader,

    /// Signature or structural verification failed.
    #[error("Credential verification failed: {0}")]
    Verification(#[from] jsonwebtoken::errors::Error),
}

/// Claims the gate reads from the credential. Everything else in the
/// token is opaque here.
#[derive(Debug, Deserialize)]
struct CredentialClaims {
    #[serde(rename = "loginSessionId")]
    login_session_id: Option<String>,
}

/// Extract the login-session id from the request's credential.
///
/// Returns `Ok(None)` when no credential is attached or the credential
/// carries no session id; the caller treats both as anonymous.
pub fn extract_session_id(
    headers: &HeaderMap,
    config: &GateConfig,
) -> Result<Option<String>, CredentialError> {
    let Some(token) = raw_credential(headers, &config.cookie_name)? else {
        return Ok(None);
    };

    let key = DecodingKey::from_secret(config.credential_secret.as_bytes());
    let validation = Validation::new(Algorithm::HS256);
    let data = jsonwebtoken::decode::<CredentialClaims>(&token, &key, &validation)?;

    Ok(data.claims.login_session_id)
}

/// Find the raw credential string: session cookie first, then a bearer
/// `Authorization` header.
fn raw_credential(
    headers: &HeaderMap,
    cookie_name: &str,
) -> Result<Option<String>, CredentialError> {
    if let Some(cookie_header) = headers.get(COOKIE) {
        let cookies = cookie_header
            .to_str()
            .map_err(|_| CredentialError::MalformedHeader)?;
        if let Some(value) = cookie_value(cookies, cookie_name) {
            return Ok(Some(value.to_string()));
        }
    }

    if let Some(auth_header) = headers.get(AUTHORIZATION) {
        let auth = auth_header
            .to_str()
            .map_err(|_| CredentialError::MalformedHeader)?;
        if let Some(token) = auth.strip_prefix("Bearer ") {
            return Ok(Some(token.to_string()));
        }
    }

    Ok(None)
}

/// Look up a cookie by name in a `Cookie` header value.
fn cookie_value<'a>(cookies: &'a str, name: &str) -> Option<&'a str> {
    cookies.split(';').find_map(|pair| {
        let (key, value) = pair.trim().split_once('=')?;
        (key == name).then_some(value)
    })
}
