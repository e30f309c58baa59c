//! HTTP routes served alongside the gate.
//!
//! Only the surfaces the gate itself needs: a health probe and the
//! login landing route the revocation redirect points at. Application
//! pages are supplied by the embedding service, not this crate.

mod health;
mod login;

pub use health::{HealthResponse, health_routes};
pub use login::{LoginPage, login_routes};
