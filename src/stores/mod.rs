//! Application stores and the registry that composes them.
//!
//! Each `use_*_store` accessor returns a handle to a process-wide instance,
//! created in the global reactive runtime on first use. Code that wants its
//! own instances (tests, embedded sessions) builds them directly and passes a
//! [`Stores`] around instead.

pub mod auth;
pub mod backend;
pub mod counter;

pub use auth::{ActionResult, AuthState, AuthStore, User};
pub use backend::{AuthBackend, MockAuthBackend};
pub use counter::{CounterState, CounterStore};

use std::sync::OnceLock;

use crate::config::AuthConfig;
use crate::runtime::ReactiveRuntime;

pub const COUNTER_KEY: &str = "counter";
pub const AUTH_KEY: &str = "auth";

/// One store, looked up by key.
#[derive(Clone)]
pub enum StoreHandle {
    Counter(CounterStore),
    Auth(AuthStore),
}

/// Every application store, keyed by name.
#[derive(Clone)]
pub struct Stores {
    pub counter: CounterStore,
    pub auth: AuthStore,
}

impl Stores {
    pub const KEYS: [&'static str; 2] = [COUNTER_KEY, AUTH_KEY];

    pub fn new(counter: CounterStore, auth: AuthStore) -> Self {
        Self { counter, auth }
    }

    pub fn get(&self, key: &str) -> Option<StoreHandle> {
        match key {
            COUNTER_KEY => Some(StoreHandle::Counter(self.counter.clone())),
            AUTH_KEY => Some(StoreHandle::Auth(self.auth.clone())),
            _ => None,
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> {
        Self::KEYS.into_iter()
    }
}

/// The process-wide counter store.
pub fn use_counter_store() -> CounterStore {
    static COUNTER: OnceLock<CounterStore> = OnceLock::new();
    COUNTER.get_or_init(CounterStore::new).clone()
}

/// The process-wide auth store, using the mock backend configured from the
/// environment.
pub fn use_auth_store() -> AuthStore {
    static AUTH: OnceLock<AuthStore> = OnceLock::new();
    AUTH.get_or_init(|| {
        let config = AuthConfig::from_env();
        tracing::debug!(?config, "initializing auth store");
        ReactiveRuntime::with_runtime(ReactiveRuntime::global(), || AuthStore::mock(&config))
    })
    .clone()
}

/// Every process-wide store.
pub fn use_stores() -> Stores {
    Stores::new(use_counter_store(), use_auth_store())
}
