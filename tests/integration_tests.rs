//! Integration tests for Tincan Stores

use async_trait::async_trait;
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, Mutex, OnceLock,
};
use std::time::Duration;
use tincan_stores::{
    create_effect, create_memo, create_signal, use_stores, ActionResult, AuthBackend, AuthConfig,
    AuthError, AuthState, AuthStore, ReadSignal, Store, User,
};
use tokio::time::{sleep, timeout, Instant};

#[test]
fn signal_integration() {
    let (count, set_count) = create_signal(0);
    assert_eq!(count.get(), 0);

    set_count.set(42);
    assert_eq!(count.get(), 42);

    set_count.update(|n| *n += 10);
    assert_eq!(count.get(), 52);
}

#[test]
fn complex_reactive_chain() {
    let (input, set_input) = create_signal(1);

    let doubled = create_memo({
        let input = input.clone();
        move || input.get() * 2
    });

    let quadrupled = create_memo({
        let doubled = doubled.clone();
        move || doubled.get() * 2
    });

    assert_eq!(quadrupled.get(), 4);

    set_input.set(5);
    assert_eq!(quadrupled.get(), 20);
}

#[test]
fn store_subscription() {
    let store = Store::new(0);
    let counter = Arc::new(AtomicUsize::new(0));
    let counter_clone = counter.clone();

    store.subscribe(move |_| {
        counter_clone.fetch_add(1, Ordering::SeqCst);
    });

    store.update(|n| *n += 1);
    store.update(|n| *n += 1);
    assert_eq!(counter.load(Ordering::SeqCst), 2);
    assert_eq!(store.get(), 2);
}

#[tokio::test(start_paused = true)]
async fn loading_is_on_while_login_is_in_flight() {
    let store = AuthStore::default();
    let task = tokio::spawn({
        let store = store.clone();
        async move { store.login("ann@example.com", "pw").await }
    });

    sleep(Duration::from_millis(10)).await;
    assert!(store.loading().get());
    assert!(!store.is_authenticated().get());
    assert_eq!(store.user_name(), "Guest");

    sleep(Duration::from_millis(500)).await;
    assert!(store.loading().get());
    assert!(store.user().get().is_none());

    let result = task.await.unwrap();
    assert_eq!(result, ActionResult::ok());
    assert!(!store.loading().get());
    assert!(store.is_authenticated().get());
    assert_eq!(store.user_email(), "ann@example.com");
}

#[tokio::test(start_paused = true)]
async fn login_then_logout_round_trip() {
    let store = AuthStore::default();

    for email in ["a@x.com", "someone@example.org", ""] {
        let result = store.login(email, "anything").await;
        assert!(result.success);
        let user = store.user().get().unwrap();
        assert_eq!(user.id, 1);
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.email, email);
        assert!(store.is_authenticated().get());
        assert!(!store.loading().get());

        let result = store.logout().await;
        assert!(result.success);
        assert_eq!(store.snapshot(), AuthState::default());
    }
}

#[tokio::test(start_paused = true)]
async fn overlapping_actions_run_in_call_order() {
    let store = AuthStore::default();
    let started = Instant::now();

    let login = tokio::spawn({
        let store = store.clone();
        async move { store.login("ann@example.com", "pw").await }
    });
    let logout = tokio::spawn({
        let store = store.clone();
        async move { store.logout().await }
    });

    // Login finished at 1000ms; logout is mid-delay.
    sleep(Duration::from_millis(1200)).await;
    assert!(store.is_authenticated().get());
    assert!(store.loading().get());

    assert!(login.await.unwrap().success);
    assert!(logout.await.unwrap().success);
    assert!(started.elapsed() >= Duration::from_millis(1500));
    assert_eq!(store.snapshot(), AuthState::default());
}

#[tokio::test(start_paused = true)]
async fn dropped_login_releases_loading() {
    let store = AuthStore::default();

    let outcome = timeout(Duration::from_millis(100), store.login("ann@example.com", "pw")).await;

    assert!(outcome.is_err());
    assert!(!store.loading().get());
    assert!(!store.is_authenticated().get());
}

#[tokio::test(start_paused = true)]
async fn set_user_during_login_keeps_loading() {
    let store = AuthStore::mock(&AuthConfig {
        login_delay: Duration::from_millis(200),
        logout_delay: Duration::from_millis(200),
    });
    let task = tokio::spawn({
        let store = store.clone();
        async move { store.login("ann@example.com", "pw").await }
    });

    sleep(Duration::from_millis(10)).await;
    store.set_user(User {
        id: 7,
        name: "Ann".to_string(),
        email: "a@x.com".to_string(),
    });
    assert!(store.loading().get());
    assert_eq!(store.user_name(), "Ann");

    task.await.unwrap();
    assert!(!store.loading().get());
    assert_eq!(store.user_name(), "John Doe");
}

#[tokio::test(start_paused = true)]
async fn effect_sees_derived_name_change() {
    let store = AuthStore::default();
    let names = Arc::new(Mutex::new(Vec::new()));

    let _effect = create_effect({
        let store = store.clone();
        let names = Arc::clone(&names);
        move || names.lock().unwrap().push(store.user_name())
    });

    store.login("ann@example.com", "pw").await;
    store.logout().await;

    let names = names.lock().unwrap();
    assert_eq!(names.first().map(String::as_str), Some("Guest"));
    assert!(names.iter().any(|n| n == "John Doe"));
    assert_eq!(names.last().map(String::as_str), Some("Guest"));
}

#[test]
fn action_result_json_shape() {
    let ok = serde_json::to_value(ActionResult::ok()).unwrap();
    assert_eq!(ok, serde_json::json!({ "success": true }));

    let failed = serde_json::to_value(ActionResult::failed("Login failed")).unwrap();
    assert_eq!(
        failed,
        serde_json::json!({ "success": false, "error": "Login failed" })
    );

    let state = serde_json::to_value(AuthState::default()).unwrap();
    assert_eq!(
        state,
        serde_json::json!({ "user": null, "isAuthenticated": false, "loading": false })
    );
}

#[test]
fn use_stores_has_counter_and_auth() {
    let stores = use_stores();
    assert_eq!(stores.keys().collect::<Vec<_>>(), vec!["counter", "auth"]);
    assert!(stores.get("counter").is_some());
    assert!(stores.get("auth").is_some());
    assert!(!stores.auth.loading().get());
}

fn instant_store() -> AuthStore {
    AuthStore::mock(&AuthConfig {
        login_delay: Duration::ZERO,
        logout_delay: Duration::ZERO,
    })
}

fn expected_name(store: &AuthStore) -> String {
    store
        .user()
        .get()
        .map(|u| u.name)
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "Guest".to_string())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn actions_and_reads_across_workers_settle_consistently() {
    let store = instant_store();
    let mut tasks = Vec::new();

    for i in 0..200 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            if i % 2 == 0 {
                store.login(&format!("u{i}@x.com"), "pw").await;
            } else {
                store.logout().await;
            }
        }));
    }
    for _ in 0..4 {
        let store = store.clone();
        tasks.push(tokio::spawn(async move {
            for _ in 0..500 {
                let _ = store.user_name();
                let _ = store.user_email();
                tokio::task::yield_now().await;
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    assert!(!store.loading().get());
    assert_eq!(store.user_name(), expected_name(&store));
    assert_eq!(
        store.user_email(),
        store.user().get().map(|u| u.email).unwrap_or_default()
    );
}

/// Counts backend calls that ran while `loading` read false.
struct LoadingWitness {
    loading: Arc<OnceLock<ReadSignal<bool>>>,
    off_during_call: Arc<AtomicUsize>,
}

impl LoadingWitness {
    fn check(&self) {
        if let Some(loading) = self.loading.get() {
            if !loading.get() {
                self.off_during_call.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

#[async_trait]
impl AuthBackend for LoadingWitness {
    async fn login(&self, email: &str, _password: &str) -> Result<User, AuthError> {
        self.check();
        tokio::task::yield_now().await;
        self.check();
        Ok(User {
            id: 1,
            name: "John Doe".to_string(),
            email: email.to_string(),
        })
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.check();
        tokio::task::yield_now().await;
        self.check();
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn loading_is_on_for_every_backend_call_across_workers() {
    let loading = Arc::new(OnceLock::new());
    let off_during_call = Arc::new(AtomicUsize::new(0));
    let store = AuthStore::new(Arc::new(LoadingWitness {
        loading: Arc::clone(&loading),
        off_during_call: Arc::clone(&off_during_call),
    }));
    assert!(loading.set(store.loading()).is_ok());

    let tasks: Vec<_> = (0..200)
        .map(|i| {
            let store = store.clone();
            tokio::spawn(async move {
                if i % 3 == 0 {
                    store.logout().await
                } else {
                    store.login("ann@example.com", "pw").await
                }
            })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().success);
    }

    assert_eq!(off_during_call.load(Ordering::SeqCst), 0);
    assert!(!store.loading().get());
    assert_eq!(store.user_name(), expected_name(&store));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn hydration_is_visible_to_derived_views_while_workers_read() {
    let store = instant_store();
    let done = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let readers: Vec<_> = (0..3)
        .map(|_| {
            let store = store.clone();
            let done = Arc::clone(&done);
            tokio::spawn(async move {
                while !done.load(Ordering::SeqCst) {
                    let _ = store.user_name();
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();

    let mut stale = 0;
    for i in 0..5_000_u64 {
        if i % 2 == 0 {
            store.set_user(User {
                id: i,
                name: format!("u{i}"),
                email: format!("u{i}@x.com"),
            });
        } else {
            store.reset();
        }
        if store.user_name() != expected_name(&store) {
            stale += 1;
        }
        if i % 64 == 0 {
            tokio::task::yield_now().await;
        }
    }
    done.store(true, Ordering::SeqCst);
    for reader in readers {
        reader.await.unwrap();
    }

    assert_eq!(stale, 0);
}
