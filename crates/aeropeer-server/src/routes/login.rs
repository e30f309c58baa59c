//! Login landing route.
//!
//! The revocation redirect needs somewhere to land. This route renders
//! nothing; it echoes the locale and the error indicator so the
//! embedding application (or a test) can see why the user arrived.

use std::collections::HashMap;

use axum::{
    Json, Router,
    extract::{Path, Query},
    routing::get,
};
use serde::{Deserialize, Serialize};

use crate::state::AppState;

/// Login landing response.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginPage {
    /// Locale taken from the path.
    pub locale: String,
    /// Error indicator carried on the redirect, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

async fn login(
    Path(locale): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<LoginPage> {
    Json(LoginPage {
        locale,
        error: params.get("error").cloned(),
    })
}

/// Create the login landing route.
pub fn login_routes() -> Router<AppState> {
    Router::new().route("/{locale}/login", get(login))
}
