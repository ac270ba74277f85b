use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

type Observer = Arc<dyn Fn() + Send + Sync>;

/// Dependency graph between sources (signals, memos) and observers
/// (memos, effects, watchers).
#[derive(Default)]
struct ReactiveGraph {
    // Source ID -> observers that read it
    dependencies: HashMap<usize, HashSet<usize>>,
    // Observer ID -> sources it read during its last run
    observer_deps: HashMap<usize, HashSet<usize>>,
    // Observer ID -> callback re-run on change (effects and watchers)
    observers: HashMap<usize, Observer>,
    // Memo ID -> invalidation state
    memos: HashMap<usize, MemoState>,
}

/// Invalidation state of one memo.
///
/// `generation` advances on every invalidation, so a recompute that raced a
/// write can tell its result is already outdated.
#[derive(Debug, Clone, Copy)]
struct MemoState {
    dirty: bool,
    generation: u64,
    computing: bool,
}

impl Default for MemoState {
    fn default() -> Self {
        Self {
            dirty: true,
            generation: 0,
            computing: false,
        }
    }
}

impl ReactiveGraph {
    fn unlink(&mut self, observer_id: usize) {
        if let Some(old_deps) = self.observer_deps.remove(&observer_id) {
            for source_id in old_deps {
                if let Some(deps) = self.dependencies.get_mut(&source_id) {
                    deps.remove(&observer_id);
                }
            }
        }
    }

    /// Keep only the edges an observer used during its latest run.
    fn retain(&mut self, observer_id: usize, reads: HashSet<usize>) {
        let old_deps = self.observer_deps.remove(&observer_id).unwrap_or_default();
        for source_id in old_deps.difference(&reads) {
            if let Some(deps) = self.dependencies.get_mut(source_id) {
                deps.remove(&observer_id);
            }
        }
        self.observer_deps.insert(observer_id, reads);
    }

    fn link(&mut self, source_id: usize, observer_id: usize) {
        self.dependencies
            .entry(source_id)
            .or_default()
            .insert(observer_id);
        self.observer_deps
            .entry(observer_id)
            .or_default()
            .insert(source_id);
    }
}

/// Frame on the per-thread observer stack.
struct ObserverFrame {
    runtime: usize,
    observer: usize,
    reads: HashSet<usize>,
}

thread_local! {
    static RUNTIME_STACK: RefCell<Vec<Arc<ReactiveRuntime>>> = const { RefCell::new(Vec::new()) };
    static OBSERVER_STACK: RefCell<Vec<ObserverFrame>> = const { RefCell::new(Vec::new()) };
}

/// Pops the top of a thread-local stack when dropped, including on unwind.
struct StackGuard<F: Fn()>(F);

impl<F: Fn()> Drop for StackGuard<F> {
    fn drop(&mut self) {
        (self.0)();
    }
}

/// Reactive runtime owning the dependency graph for a set of primitives.
///
/// Every signal, memo and effect remembers the runtime it was created in, so
/// a store built inside one runtime keeps working when it is later used from
/// another thread or task. The runtime to create primitives in is the top of
/// the thread-local scope stack, or the global runtime when no scope is active.
///
/// # Examples
///
/// Using the default global runtime:
///
/// ```
/// use tincan_stores::Signal;
///
/// let signal = Signal::new(42);
/// assert_eq!(signal.get(), 42);
/// ```
///
/// Using scoped runtimes for isolation:
///
/// ```
/// use tincan_stores::runtime::ReactiveRuntime;
/// use tincan_stores::Signal;
///
/// ReactiveRuntime::scope(|| {
///     let signal = Signal::new(0);
///     assert_eq!(signal.get(), 0);
/// });
/// ```
pub struct ReactiveRuntime {
    next_id: AtomicUsize,
    graph: Mutex<ReactiveGraph>,
}

impl ReactiveRuntime {
    /// Create a new isolated runtime.
    pub fn new() -> Arc<Self> {
        Arc::new(ReactiveRuntime {
            next_id: AtomicUsize::new(0),
            graph: Mutex::new(ReactiveGraph::default()),
        })
    }

    /// Run a function with a fresh isolated runtime.
    ///
    /// Primitives created inside `f` belong to the new runtime; it is freed
    /// once the last of them is dropped.
    pub fn scope<F, R>(f: F) -> R
    where
        F: FnOnce() -> R,
    {
        Self::with_runtime(Self::new(), f)
    }

    /// The process-wide runtime used when no scope is active.
    pub fn global() -> Arc<Self> {
        static RUNTIME: OnceLock<Arc<ReactiveRuntime>> = OnceLock::new();
        Arc::clone(RUNTIME.get_or_init(Self::new))
    }

    /// The runtime new primitives are created in on this thread.
    pub fn current() -> Arc<Self> {
        RUNTIME_STACK.with(|stack| stack.borrow().last().cloned().unwrap_or_else(Self::global))
    }

    /// Run `f` with `runtime` as the current runtime for this thread.
    ///
    /// ```
    /// use tincan_stores::runtime::ReactiveRuntime;
    /// use tincan_stores::Signal;
    ///
    /// let runtime = ReactiveRuntime::new();
    /// ReactiveRuntime::with_runtime(runtime, || {
    ///     let signal = Signal::new(42);
    ///     assert_eq!(signal.get(), 42);
    /// });
    /// ```
    pub fn with_runtime<F, R>(runtime: Arc<Self>, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        RUNTIME_STACK.with(|stack| stack.borrow_mut().push(runtime));
        let _pop = StackGuard(|| {
            RUNTIME_STACK.with(|stack| {
                stack.borrow_mut().pop();
            });
        });
        f()
    }

    /// Drop every observer, dependency and memo flag, and reset the ID counter.
    pub fn clear(&self) {
        *self.graph() = ReactiveGraph::default();
        self.next_id.store(0, Ordering::SeqCst);
    }

    /// Generate the next unique ID for a reactive primitive.
    pub fn next_id(&self) -> usize {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn graph(&self) -> MutexGuard<'_, ReactiveGraph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn key(&self) -> usize {
        self as *const Self as usize
    }

    /// Record that the observer currently running on this thread read `source_id`.
    ///
    /// The edge is linked before the caller reads the value, so a write that
    /// lands after the read always finds the observer.
    pub fn track_read(&self, source_id: usize) {
        let key = self.key();
        let observer = OBSERVER_STACK.with(|stack| match stack.borrow_mut().last_mut() {
            Some(frame) if frame.runtime == key && frame.observer != source_id => {
                frame.reads.insert(source_id);
                Some(frame.observer)
            }
            _ => None,
        });
        if let Some(observer_id) = observer {
            self.graph().link(source_id, observer_id);
        }
    }

    /// Notify every observer that read `source_id`.
    pub fn notify_observers(&self, source_id: usize) {
        let observers: Vec<usize> = self
            .graph()
            .dependencies
            .get(&source_id)
            .map(|obs| obs.iter().copied().collect())
            .unwrap_or_default();

        for observer_id in observers {
            self.mark_observer_dirty(observer_id);
        }
    }

    /// Dirty a memo (and, transitively, its dependents) or re-run an effect.
    fn mark_observer_dirty(&self, observer_id: usize) {
        let mut graph = self.graph();

        if let Some(memo) = graph.memos.get_mut(&observer_id) {
            let was_dirty = memo.dirty;
            memo.dirty = true;
            memo.generation += 1;
            // A reader may be handing out the pre-write value right now, so its
            // dependents must hear about this write too.
            if was_dirty && !memo.computing {
                return;
            }
            let dependents: Vec<usize> = graph
                .dependencies
                .get(&observer_id)
                .map(|deps| deps.iter().copied().collect())
                .unwrap_or_default();
            drop(graph);

            for dependent_id in dependents {
                self.mark_observer_dirty(dependent_id);
            }
            return;
        }

        let effect = graph.observers.get(&observer_id).cloned();
        drop(graph);

        if let Some(effect) = effect {
            self.with_observer(observer_id, || effect());
        }
    }

    /// Register `f` as the callback re-run when the observer's sources change.
    pub fn create_observer<F>(&self, observer_id: usize, f: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.graph().observers.insert(observer_id, Arc::new(f));
    }

    /// Forget an observer and every edge leading to it.
    pub fn remove_observer(&self, observer_id: usize) {
        let mut graph = self.graph();
        graph.observers.remove(&observer_id);
        graph.memos.remove(&observer_id);
        graph.unlink(observer_id);
    }

    /// Run `f` as `observer_id`. Afterwards the observer depends on exactly
    /// the sources read during this run.
    ///
    /// Edges from the previous run stay linked while `f` runs, so writes that
    /// land mid-run still reach the observer.
    pub fn with_observer<F, R>(&self, observer_id: usize, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let frame = ObserverFrame {
            runtime: self.key(),
            observer: observer_id,
            reads: HashSet::new(),
        };
        OBSERVER_STACK.with(|stack| stack.borrow_mut().push(frame));
        let _pop = StackGuard(|| {
            let frame = OBSERVER_STACK.with(|stack| stack.borrow_mut().pop());
            if let Some(frame) = frame {
                self.graph().retain(observer_id, frame.reads);
            }
        });
        f()
    }

    /// Register a memo; it starts dirty.
    pub fn register_memo(&self, memo_id: usize) {
        self.graph().memos.insert(memo_id, MemoState::default());
    }

    /// Whether a memo must recompute before its next read.
    pub fn is_memo_dirty(&self, memo_id: usize) -> bool {
        self.graph().memos.get(&memo_id).map_or(true, |memo| memo.dirty)
    }

    /// Start recomputing a memo. Returns the generation being computed.
    ///
    /// Callers must not run two recomputes of the same memo at once.
    pub fn begin_memo_compute(&self, memo_id: usize) -> u64 {
        let mut graph = self.graph();
        let memo = graph.memos.entry(memo_id).or_default();
        memo.computing = true;
        memo.generation
    }

    /// Finish a recompute started at `generation`. The memo only becomes
    /// clean if nothing invalidated it meanwhile; returns whether it did.
    pub fn finish_memo_compute(&self, memo_id: usize, generation: u64) -> bool {
        let mut graph = self.graph();
        let memo = graph.memos.entry(memo_id).or_default();
        memo.computing = false;
        if memo.generation == generation {
            memo.dirty = false;
        }
        !memo.dirty
    }

    #[cfg(test)]
    fn dependents_of(&self, source_id: usize) -> usize {
        self.graph()
            .dependencies
            .get(&source_id)
            .map_or(0, HashSet::len)
    }
}
