use crate::runtime::{lock, read_lock, write_lock, ReactiveRuntime};
use std::sync::{Arc, Mutex, RwLock};

/// A memoized computed value that automatically tracks dependencies.
///
/// Memos only recompute when a source they read during their last run has
/// changed since. Reads from several threads are safe: a recompute that
/// overlaps a write leaves the memo dirty, so the next read recomputes.
#[derive(Clone)]
pub struct Memo<T> {
    compute: Arc<dyn Fn() -> T + Send + Sync>,
    cached: Arc<RwLock<Option<T>>>,
    recompute: Arc<Mutex<()>>,
    id: usize,
    runtime: Arc<ReactiveRuntime>,
}

impl<T: Clone + Send + Sync + 'static> Memo<T> {
    /// Create a new memo with the given computation function.
    pub fn new<F>(compute: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        let runtime = ReactiveRuntime::current();
        let id = runtime.next_id();
        runtime.register_memo(id);

        Self {
            compute: Arc::new(compute),
            cached: Arc::new(RwLock::new(None)),
            recompute: Arc::new(Mutex::new(())),
            id,
            runtime,
        }
    }

    /// Get the current value, recomputing if necessary.
    pub fn get(&self) -> T {
        self.with(T::clone)
    }

    /// Read the memoized value with a function without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.runtime.track_read(self.id);

        if self.is_stale() {
            let _turn = lock(&self.recompute);
            // Another reader may have refreshed it while we waited.
            if self.is_stale() {
                let generation = self.runtime.begin_memo_compute(self.id);
                let value = self.runtime.with_observer(self.id, || (self.compute)());
                *write_lock(&self.cached) = Some(value);
                self.runtime.finish_memo_compute(self.id, generation);
            }
        }

        let cached = read_lock(&self.cached);
        match cached.as_ref() {
            Some(value) => f(value),
            None => f(&(self.compute)()),
        }
    }

    fn is_stale(&self) -> bool {
        self.runtime.is_memo_dirty(self.id) || read_lock(&self.cached).is_none()
    }
}

/// Create a new memoized computation.
///
/// ```
/// use tincan_stores::{create_memo, create_signal};
///
/// let (count, set_count) = create_signal(5);
/// let doubled = create_memo(move || count.get() * 2);
/// assert_eq!(doubled.get(), 10);
///
/// set_count.set(10);
/// assert_eq!(doubled.get(), 20);
/// ```
pub fn create_memo<T, F>(compute: F) -> Memo<T>
where
    T: Clone + Send + Sync + 'static,
    F: Fn() -> T + Send + Sync + 'static,
{
    Memo::new(compute)
}
