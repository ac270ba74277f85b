//! The external call behind the auth actions.
//!
//! [`AuthBackend`] is the seam a real API client plugs into. The bundled
//! [`MockAuthBackend`] sleeps for the configured delay and hands back canned
//! data; it never fails.

use async_trait::async_trait;
use std::time::Duration;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::stores::auth::User;

pub const MOCK_USER_ID: u64 = 1;
pub const MOCK_USER_NAME: &str = "John Doe";

#[async_trait]
pub trait AuthBackend: Send + Sync {
    /// Exchange credentials for the signed-in user.
    async fn login(&self, email: &str, password: &str) -> Result<User, AuthError>;

    /// End the current session.
    async fn logout(&self) -> Result<(), AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockAuthBackend {
    login_delay: Duration,
    logout_delay: Duration,
}

impl MockAuthBackend {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            login_delay: config.login_delay,
            logout_delay: config.logout_delay,
        }
    }
}

impl Default for MockAuthBackend {
    fn default() -> Self {
        Self::new(&AuthConfig::default())
    }
}

#[async_trait]
impl AuthBackend for MockAuthBackend {
    async fn login(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        tokio::time::sleep(self.login_delay).await;
        Ok(User {
            id: MOCK_USER_ID,
            name: MOCK_USER_NAME.to_string(),
            email: email.to_string(),
        })
    }

    async fn logout(&self) -> Result<(), AuthError> {
        tokio::time::sleep(self.logout_delay).await;
        Ok(())
    }
}
