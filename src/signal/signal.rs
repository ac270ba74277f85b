use crate::runtime::{read_lock, write_lock, ReactiveRuntime};
use std::sync::{Arc, RwLock, Weak};

/// A reactive signal that holds a value and notifies subscribers when changed.
#[derive(Clone)]
pub struct Signal<T> {
    value: Arc<RwLock<T>>,
    id: usize,
    runtime: Arc<ReactiveRuntime>,
}

impl<T: Clone + Send + Sync + 'static> Signal<T> {
    /// Create a new signal with the given initial value.
    pub fn new(initial: T) -> Self {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();

        Self {
            value: Arc::new(RwLock::new(initial)),
            id,
            runtime,
        }
    }

    /// Get the current value of the signal.
    pub fn get(&self) -> T {
        self.runtime.track_read(self.id);
        read_lock(&self.value).clone()
    }

    /// Set a new value for the signal.
    pub fn set(&self, new_value: T) {
        *write_lock(&self.value) = new_value;
        self.runtime.notify_observers(self.id);
    }

    /// Update the value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        {
            let mut value = write_lock(&self.value);
            f(&mut *value);
        }
        self.runtime.notify_observers(self.id);
    }

    /// Read the value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);
        let value = read_lock(&self.value);
        f(&*value)
    }

    /// Get the signal's unique ID.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Call `callback` with the current value now and after every change.
    ///
    /// The watcher stays registered until the returned guard is dropped.
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        let observer_id = self.runtime.next_id();
        let value = Arc::clone(&self.value);
        let callback = Arc::new(callback);
        let callback_clone = Arc::clone(&callback);

        self.runtime.create_observer(observer_id, move || {
            let val = read_lock(&value).clone();
            callback_clone(val);
        });
        self.runtime
            .with_observer(observer_id, || self.runtime.track_read(self.id));

        let val = read_lock(&self.value).clone();
        callback(val);

        WatchGuard {
            observer_id,
            runtime: Arc::downgrade(&self.runtime),
        }
    }

    /// A read-only handle sharing this signal's value.
    pub fn read_only(&self) -> ReadSignal<T> {
        ReadSignal(self.clone())
    }

    /// Split into read and write halves sharing the same value.
    pub fn split(self) -> (ReadSignal<T>, WriteSignal<T>) {
        (ReadSignal(self.clone()), WriteSignal(self))
    }
}

/// The read half of a signal. Holders can observe but never mutate.
#[derive(Clone)]
pub struct ReadSignal<T>(Signal<T>);

impl<T: Clone + Send + Sync + 'static> ReadSignal<T> {
    /// Get the current value, tracking the read.
    pub fn get(&self) -> T {
        self.0.get()
    }

    /// Read the value without cloning, tracking the read.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.0.with(f)
    }

    /// Watch the value; see [`Signal::watch`].
    pub fn watch<F>(&self, callback: F) -> WatchGuard
    where
        F: Fn(T) + Send + Sync + 'static,
    {
        self.0.watch(callback)
    }

    pub fn id(&self) -> usize {
        self.0.id()
    }
}

/// The write half of a signal.
#[derive(Clone)]
pub struct WriteSignal<T>(Signal<T>);

impl<T: Clone + Send + Sync + 'static> WriteSignal<T> {
    /// Replace the value and notify observers.
    pub fn set(&self, new_value: T) {
        self.0.set(new_value);
    }

    /// Update the value in place and notify observers.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        self.0.update(f);
    }
}

/// Create a signal and return its read and write halves.
///
/// ```
/// use tincan_stores::create_signal;
///
/// let (count, set_count) = create_signal(0);
/// set_count.update(|n| *n += 1);
/// assert_eq!(count.get(), 1);
/// ```
pub fn create_signal<T>(initial: T) -> (ReadSignal<T>, WriteSignal<T>)
where
    T: Clone + Send + Sync + 'static,
{
    Signal::new(initial).split()
}

/// RAII guard for signal watchers.
pub struct WatchGuard {
    observer_id: usize,
    runtime: Weak<ReactiveRuntime>,
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_observer(self.observer_id);
        }
    }
}
