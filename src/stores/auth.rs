//! Authentication session store.
//!
//! Holds the signed-in [`User`], an authentication flag and a loading flag.
//! Consumers get read-only signals and derived views; only the actions on
//! [`AuthStore`] write.
//!
//! Actions on one store run one at a time in call order. `loading` turns on
//! as soon as an action is invoked (even while it waits its turn) and turns
//! off once no action is pending, whichever way each of them ended.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio::sync::Mutex as AsyncMutex;

use crate::config::AuthConfig;
use crate::runtime::lock;
use crate::signal::{create_memo, create_signal, Memo, ReadSignal, WriteSignal};
use crate::stores::backend::{AuthBackend, MockAuthBackend};

pub const GUEST_NAME: &str = "Guest";
pub const LOGIN_FAILED: &str = "Login failed";
pub const LOGOUT_FAILED: &str = "Logout failed";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub name: String,
    pub email: String,
}

/// Point-in-time copy of the auth cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub loading: bool,
}

/// Uniform outcome of a store action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ActionResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(message.into()),
        }
    }
}

/// Keeps `loading` on while at least one action holds a guard.
///
/// The count and the flag change under one lock, so a release can never
/// clear the flag after a newer acquire has set it.
struct LoadingGuard {
    loading: WriteSignal<bool>,
    pending: Arc<Mutex<usize>>,
}

impl LoadingGuard {
    fn acquire(loading: &WriteSignal<bool>, pending: &Arc<Mutex<usize>>) -> Self {
        {
            let mut count = lock(pending);
            *count += 1;
            if *count == 1 {
                loading.set(true);
            }
        }
        Self {
            loading: loading.clone(),
            pending: Arc::clone(pending),
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut count = lock(&self.pending);
        *count = count.saturating_sub(1);
        if *count == 0 {
            self.loading.set(false);
        }
    }
}

/// Reactive auth session store. Clones share the same state.
#[derive(Clone)]
pub struct AuthStore {
    user: ReadSignal<Option<User>>,
    write_user: WriteSignal<Option<User>>,
    is_authenticated: ReadSignal<bool>,
    write_authenticated: WriteSignal<bool>,
    loading: ReadSignal<bool>,
    write_loading: WriteSignal<bool>,
    user_name: Memo<String>,
    user_email: Memo<String>,
    pending: Arc<Mutex<usize>>,
    queue: Arc<AsyncMutex<()>>,
    backend: Arc<dyn AuthBackend>,
}

impl AuthStore {
    /// Create a signed-out store that talks to `backend`.
    pub fn new(backend: Arc<dyn AuthBackend>) -> Self {
        let (user, write_user) = create_signal(None::<User>);
        let (is_authenticated, write_authenticated) = create_signal(false);
        let (loading, write_loading) = create_signal(false);

        let user_name = create_memo({
            let user = user.clone();
            move || {
                user.with(|u| match u {
                    Some(u) if !u.name.is_empty() => u.name.clone(),
                    _ => GUEST_NAME.to_string(),
                })
            }
        });
        let user_email = create_memo({
            let user = user.clone();
            move || user.with(|u| u.as_ref().map(|u| u.email.clone()).unwrap_or_default())
        });

        Self {
            user,
            write_user,
            is_authenticated,
            write_authenticated,
            loading,
            write_loading,
            user_name,
            user_email,
            pending: Arc::new(Mutex::new(0)),
            queue: Arc::new(AsyncMutex::new(())),
            backend,
        }
    }

    /// Create a store backed by [`MockAuthBackend`].
    pub fn mock(config: &AuthConfig) -> Self {
        Self::new(Arc::new(MockAuthBackend::new(config)))
    }

    pub fn user(&self) -> ReadSignal<Option<User>> {
        self.user.clone()
    }

    pub fn is_authenticated(&self) -> ReadSignal<bool> {
        self.is_authenticated.clone()
    }

    pub fn loading(&self) -> ReadSignal<bool> {
        self.loading.clone()
    }

    /// The user's name, or `"Guest"` when nobody (or a nameless user) is signed in.
    pub fn user_name(&self) -> String {
        self.user_name.get()
    }

    /// The user's email, or an empty string when signed out.
    pub fn user_email(&self) -> String {
        self.user_email.get()
    }

    pub fn snapshot(&self) -> AuthState {
        AuthState {
            user: self.user.get(),
            is_authenticated: self.is_authenticated.get(),
            loading: self.loading.get(),
        }
    }

    /// Sign in. The password is passed through to the backend unchecked.
    #[tracing::instrument(name = "auth.login", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ActionResult {
        let _loading = LoadingGuard::acquire(&self.write_loading, &self.pending);
        let _turn = self.queue.lock().await;

        match self.backend.login(email, password).await {
            Ok(user) => {
                tracing::debug!(user_id = user.id, "login succeeded");
                self.write_user.set(Some(user));
                self.write_authenticated.set(true);
                ActionResult::ok()
            }
            Err(error) => {
                tracing::warn!(%error, "login failed");
                ActionResult::failed(LOGIN_FAILED)
            }
        }
    }

    /// Sign out and clear the user.
    #[tracing::instrument(name = "auth.logout", skip(self))]
    pub async fn logout(&self) -> ActionResult {
        let _loading = LoadingGuard::acquire(&self.write_loading, &self.pending);
        let _turn = self.queue.lock().await;

        match self.backend.logout().await {
            Ok(()) => {
                tracing::debug!("logout succeeded");
                self.write_user.set(None);
                self.write_authenticated.set(false);
                ActionResult::ok()
            }
            Err(error) => {
                tracing::warn!(%error, "logout failed");
                ActionResult::failed(LOGOUT_FAILED)
            }
        }
    }

    /// Hydrate the session with a known user, e.g. one restored at startup.
    ///
    /// Synchronous: skips the action queue and leaves `loading` alone.
    pub fn set_user(&self, user: User) {
        tracing::debug!(user_id = user.id, "session hydrated");
        self.write_user.set(Some(user));
        self.write_authenticated.set(true);
    }

    /// Drop the session without calling the backend.
    pub fn reset(&self) {
        tracing::debug!("session reset");
        self.write_user.set(None);
        self.write_authenticated.set(false);
    }
}

impl Default for AuthStore {
    fn default() -> Self {
        Self::mock(&AuthConfig::default())
    }
}
