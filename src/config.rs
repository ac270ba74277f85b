//! Auth store configuration parsed from environment variables.

use std::time::Duration;

pub const DEFAULT_LOGIN_DELAY_MS: u64 = 1000;
pub const DEFAULT_LOGOUT_DELAY_MS: u64 = 500;

pub const LOGIN_DELAY_ENV: &str = "TINCAN_AUTH_LOGIN_DELAY_MS";
pub const LOGOUT_DELAY_ENV: &str = "TINCAN_AUTH_LOGOUT_DELAY_MS";

/// Simulated latency of the mock auth backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthConfig {
    pub login_delay: Duration,
    pub logout_delay: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            login_delay: Duration::from_millis(DEFAULT_LOGIN_DELAY_MS),
            logout_delay: Duration::from_millis(DEFAULT_LOGOUT_DELAY_MS),
        }
    }
}

impl AuthConfig {
    /// Build config from environment variables.
    ///
    /// Optional:
    /// - `TINCAN_AUTH_LOGIN_DELAY_MS`: default 1000
    /// - `TINCAN_AUTH_LOGOUT_DELAY_MS`: default 500
    ///
    /// Missing or unparsable values fall back to the default.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let millis = |key: &str, default: u64| {
            let raw = lookup(key);
            match raw.as_deref().map(str::trim).map(str::parse::<u64>) {
                Some(Ok(ms)) => ms,
                Some(Err(_)) => {
                    tracing::warn!(var = key, default, "ignoring unparsable delay");
                    default
                }
                None => default,
            }
        };

        Self {
            login_delay: Duration::from_millis(millis(LOGIN_DELAY_ENV, DEFAULT_LOGIN_DELAY_MS)),
            logout_delay: Duration::from_millis(millis(LOGOUT_DELAY_ENV, DEFAULT_LOGOUT_DELAY_MS)),
        }
    }
}
