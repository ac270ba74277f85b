//! Counter store.

use serde::{Deserialize, Serialize};

use crate::store::{Store, SubscriptionId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterState {
    pub count: i64,
}

#[derive(Clone)]
pub struct CounterStore {
    state: Store<CounterState>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self {
            state: Store::new(CounterState::default()),
        }
    }

    pub fn count(&self) -> i64 {
        self.state.read(|s| s.count)
    }

    pub fn double_count(&self) -> i64 {
        self.count() * 2
    }

    pub fn increment(&self) {
        self.state.update(|s| s.count += 1);
    }

    pub fn decrement(&self) {
        self.state.update(|s| s.count -= 1);
    }

    pub fn reset(&self) {
        self.state.set(CounterState::default());
    }

    /// Run `callback` with the new state after every change.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&CounterState) + Send + Sync + 'static,
    {
        self.state.subscribe(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.state.unsubscribe(id)
    }
}

impl Default for CounterStore {
    fn default() -> Self {
        Self::new()
    }
}
