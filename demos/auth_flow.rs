//! Walk the auth store through a login/logout cycle while watching it react.
//!
//! Run with `RUST_LOG=tincan_stores=debug` to see the action spans.

use tincan_stores::{create_effect, use_stores, StoreHandle};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let stores = use_stores();
    let auth = stores.auth.clone();

    let _loading = auth.loading().watch(|loading| println!("   [loading] {loading}"));
    let _greeting = create_effect({
        let auth = auth.clone();
        move || println!("   [greeting] Hello, {}!", auth.user_name())
    });

    println!("1. Logging in");
    let result = auth.login("john@example.com", "secret").await;
    println!("   result: {result:?}");
    println!("   email: {}", auth.user_email());

    println!("\n2. Counting a few clicks");
    if let Some(StoreHandle::Counter(counter)) = stores.get("counter") {
        counter.increment();
        counter.increment();
        println!("   count = {}, doubled = {}", counter.count(), counter.double_count());
    }

    println!("\n3. Logging out");
    let result = auth.logout().await;
    println!("   result: {result:?}");
    println!("   state: {:?}", auth.snapshot());
}
