//! # Tincan Stores
//!
//! Reactive application stores built on fine-grained signals.
//!
//! ## Signals (Low-level primitives)
//!
//! - `Signal<T>` - Reactive values that notify dependents when changed,
//!   splittable into `ReadSignal<T>` / `WriteSignal<T>`
//! - `Memo<T>` - Computed values that automatically track dependencies
//! - `Effect` - Side effects that run when dependencies change
//!
//! ## Store (Snapshot container)
//!
//! - `Store<T>` - Thread-safe state container with subscribers
//!
//! ## Application stores
//!
//! - `AuthStore` - Session state with async `login`/`logout` actions
//! - `CounterStore` - A counter
//! - `use_stores()` - Registry of the process-wide stores
//!
//! ```
//! use tincan_stores::{AuthStore, User};
//!
//! let auth = AuthStore::default();
//! assert_eq!(auth.user_name(), "Guest");
//!
//! auth.set_user(User { id: 7, name: "Ann".into(), email: "a@x.com".into() });
//! assert!(auth.is_authenticated().get());
//! assert_eq!(auth.user_name(), "Ann");
//! ```

pub mod config;
pub mod error;
pub mod runtime;
pub mod signal;
pub mod store;
pub mod stores;

pub use config::AuthConfig;
pub use error::AuthError;
pub use signal::{
    create_effect, create_memo, create_signal, Effect, Memo, ReadSignal, Signal, WatchGuard,
    WriteSignal,
};
pub use store::{Store, SubscriptionId};
pub use stores::{
    use_auth_store, use_counter_store, use_stores, ActionResult, AuthBackend, AuthState, AuthStore,
    CounterState, CounterStore, MockAuthBackend, StoreHandle, Stores, User,
};
