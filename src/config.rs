use std::env;

/// Settings for the reference booking API server.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub session_secret: String,
    pub allowed_origin: Option<String>,
    /// Set the `Secure` attribute on session cookies.
    pub secure_cookies: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "bookfast.db".to_string()),
            session_secret: env::var("SESSION_SECRET").unwrap_or_else(|_| "changeme".to_string()),
            allowed_origin: env::var("ALLOWED_ORIGIN").ok().filter(|v| !v.is_empty()),
            secure_cookies: env::var("SECURE_COOKIES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}

/// Settings for [`crate::client::ApiClient`].
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// API root, e.g. `http://localhost:8080/api`.
    pub base_url: String,
    pub timeout_secs: u64,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        Self {
            base_url: env::var("API_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8080/api".to_string()),
            timeout_secs: env::var("API_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        }
    }
}
