//! Gate configuration.

use std::net::SocketAddr;
use std::time::Duration;

use aeropeer_session::CacheConfig;

/// Default name of the cookie carrying the signed session credential.
pub const DEFAULT_COOKIE_NAME: &str = "aeropeer.session-token";

/// Default upper bound on one session-store round trip (5 seconds).
/// A store call that runs past this completes as a transport error and
/// takes the fail-open branch rather than stalling the request.
pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default locale used when the request path carries none.
pub const DEFAULT_LOCALE: &str = "en";

/// Default session-store validation endpoint.
pub const DEFAULT_VALIDATE_URL: &str = "http://127.0.0.1:8081/api/auth/validate-session";

/// Default session-store device-metadata endpoint.
pub const DEFAULT_ENRICH_URL: &str = "http://127.0.0.1:8081/api/auth/session-activity";

/// Gate configuration.
#[derive(Debug, Clone)]
pub struct GateConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Session-store endpoint answering "is this session still valid".
    pub validate_url: String,

    /// Session-store endpoint accepting device metadata for a session.
    pub enrich_url: String,

    /// Secret used to verify the signed session credential.
    pub credential_secret: String,

    /// Name of the cookie carrying the credential.
    pub cookie_name: String,

    /// Locale used for the login redirect when the path carries none.
    pub default_locale: String,

    /// Validity cache tuning (TTL and prune ceiling).
    pub cache: CacheConfig,

    /// Upper bound on one session-store round trip.
    pub store_timeout: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".parse().unwrap(),
            validate_url: DEFAULT_VALIDATE_URL.to_string(),
            enrich_url: DEFAULT_ENRICH_URL.to_string(),
            credential_secret: String::new(),
            cookie_name: DEFAULT_COOKIE_NAME.to_string(),
            default_locale: DEFAULT_LOCALE.to_string(),
            cache: CacheConfig::default(),
            store_timeout: DEFAULT_STORE_TIMEOUT,
        }
    }
}

impl GateConfig {
    /// Create a new gate config with the given credential secret.
    pub fn new(credential_secret: impl Into<String>) -> Self {
        Self {
            credential_secret: credential_secret.into(),
            ..Default::default()
        }
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the session-store validation endpoint.
    pub fn with_validate_url(mut self, url: impl Into<String>) -> Self {
        self.validate_url = url.into();
        self
    }

    /// Set the session-store device-metadata endpoint.
    pub fn with_enrich_url(mut self, url: impl Into<String>) -> Self {
        self.enrich_url = url.into();
        self
    }

    /// Set the credential cookie name.
    pub fn with_cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the fallback locale for login redirects.
    pub fn with_default_locale(mut self, locale: impl Into<String>) -> Self {
        self.default_locale = locale.into();
        self
    }

    /// Set the validity cache configuration.
    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Set the session-store round-trip timeout.
    pub fn with_store_timeout(mut self, timeout: Duration) -> Self {
        self.store_timeout = timeout;
        self
    }
}
