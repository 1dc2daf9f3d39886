//! Client configuration
//!
//! Values come from an [`EnvSource`] and fall back to built-in defaults when a
//! variable is missing or malformed.

use tracing::warn;

// =========================================================
// Defaults
// =========================================================

pub const DEFAULT_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TOKEN_KEY: &str = "auth_token";
pub const DEFAULT_USER_KEY: &str = "user_data";
pub const DEFAULT_REFRESH_SECS: u32 = 10;

/// Auto-refresh periods offered by the dashboard, in seconds.
pub const REFRESH_INTERVAL_CHOICES: [u32; 4] = [5, 10, 15, 30];

const ENV_API_URL: &str = "GLYCOWATCH_API_URL";
const ENV_TOKEN_KEY: &str = "GLYCOWATCH_TOKEN_KEY";
const ENV_USER_KEY: &str = "GLYCOWATCH_USER_KEY";
const ENV_REFRESH_SECS: &str = "GLYCOWATCH_REFRESH_SECS";

/// Read-only view of environment variables.
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;
}

/// The process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend origin, without a trailing slash.
    pub api_url: String,
    /// Storage key holding the bearer token.
    pub token_key: String,
    /// Storage key holding the serialized user profile.
    pub user_key: String,
    /// Auto-refresh period used until the user picks another one.
    pub default_refresh_secs: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            token_key: DEFAULT_TOKEN_KEY.to_string(),
            user_key: DEFAULT_USER_KEY.to_string(),
            default_refresh_secs: DEFAULT_REFRESH_SECS,
        }
    }
}

impl ClientConfig {
    pub fn from_env(env: &impl EnvSource) -> Self {
        let defaults = Self::default();

        let non_empty = |name: &str| env.var(name).filter(|v| !v.trim().is_empty());

        let default_refresh_secs = match non_empty(ENV_REFRESH_SECS) {
            Some(raw) => match raw.trim().parse::<u32>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    warn!(value = %raw, "ignoring invalid {}", ENV_REFRESH_SECS);
                    defaults.default_refresh_secs
                }
            },
            None => defaults.default_refresh_secs,
        };

        Self {
            api_url: non_empty(ENV_API_URL)
                .map(|url| normalize_base_url(&url))
                .unwrap_or(defaults.api_url),
            token_key: non_empty(ENV_TOKEN_KEY).unwrap_or(defaults.token_key),
            user_key: non_empty(ENV_USER_KEY).unwrap_or(defaults.user_key),
            default_refresh_secs,
        }
    }

    /// Replaces the API origin.
    pub fn with_api_url(mut self, url: &str) -> Self {
        self.api_url = normalize_base_url(url);
        self
    }
}

pub(crate) fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
