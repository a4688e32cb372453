//! Fine-grained reactive signals with read observers
//!
//! A push-pull system in the style of Leptos/SolidJS signals:
//! - Signals hold values and know which observers read them
//! - An observer records every tracked read made inside [`ReactiveGraph::observe`]
//! - Writing a signal queues its observers; the host drains the queue with
//!   [`ReactiveGraph::take_invalidated`] and re-runs whatever the observer
//!   stands for (a configuration block, a draw pass)
//!
//! Reads inside [`ReactiveGraph::untracked`] are never recorded, which lets a
//! node consult state without subscribing to it.
//!
//! ```ignore
//! let mut graph = ReactiveGraph::new();
//! let offset = graph.create_signal(0.0f32);
//! let observer = graph.create_observer();
//!
//! graph.observe(observer, |g| g.get(offset));
//! graph.set(offset, 4.0);
//! assert_eq!(graph.take_invalidated(), vec![observer]);
//! ```

use slotmap::{new_key_type, SlotMap};
use smallvec::SmallVec;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

new_key_type! {
    /// Unique identifier for a signal
    pub struct SignalId;
    /// Unique identifier for a read observer
    pub struct ObserverId;
}

/// A reactive signal handle (cheap to copy)
#[derive(Debug)]
pub struct Signal<T> {
    id: SignalId,
    _marker: std::marker::PhantomData<T>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Signal<T> {}

impl<T> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for Signal<T> {}

impl<T> Signal<T> {
    /// Get the signal's internal ID
    pub fn id(&self) -> SignalId {
        self.id
    }
}

/// Internal signal node storage
struct SignalNode {
    /// The signal value (type-erased)
    value: Box<dyn Any>,
    /// Version counter for change detection
    version: u64,
    /// Observers to notify on change
    subscribers: SmallVec<[ObserverId; 4]>,
}

/// Internal observer storage
struct ObserverNode {
    /// Signals read during the last observed run
    dependencies: SmallVec<[SignalId; 4]>,
    /// Whether the observer is queued for the host
    dirty: Cell<bool>,
}

/// The reactive graph that manages signals and observers
pub struct ReactiveGraph {
    signals: SlotMap<SignalId, SignalNode>,
    observers: SlotMap<ObserverId, ObserverNode>,
    /// Invalidated observers waiting for the host
    pending: RefCell<VecDeque<ObserverId>>,
    /// Observers invalidated inside a batch, queued when it ends
    deferred: RefCell<Vec<ObserverId>>,
    /// Current batch depth (> 0 means we're in a batch)
    batch_depth: Cell<u32>,
    /// Currently tracking dependencies
    tracking: RefCell<Option<Vec<SignalId>>>,
    /// Global version counter
    global_version: Cell<u64>,
}

impl ReactiveGraph {
    pub fn new() -> Self {
        Self {
            signals: SlotMap::with_key(),
            observers: SlotMap::with_key(),
            pending: RefCell::new(VecDeque::new()),
            deferred: RefCell::new(Vec::new()),
            batch_depth: Cell::new(0),
            tracking: RefCell::new(None),
            global_version: Cell::new(0),
        }
    }

    // =========================================================================
    // SIGNALS
    // =========================================================================

    /// Create a new signal with an initial value
    pub fn create_signal<T: 'static>(&mut self, initial: T) -> Signal<T> {
        let id = self.signals.insert(SignalNode {
            value: Box::new(initial),
            version: 0,
            subscribers: SmallVec::new(),
        });
        Signal {
            id,
            _marker: std::marker::PhantomData,
        }
    }

    /// Get the current value of a signal
    ///
    /// Inside an observed run the signal is recorded as a dependency.
    pub fn get<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        if let Some(ref mut deps) = *self.tracking.borrow_mut() {
            if !deps.contains(&signal.id) {
                deps.push(signal.id);
            }
        }

        self.get_untracked(signal)
    }

    /// Get the current value without tracking as a dependency
    pub fn get_untracked<T: Clone + 'static>(&self, signal: Signal<T>) -> Option<T> {
        self.signals
            .get(signal.id)
            .and_then(|node| node.value.downcast_ref::<T>().cloned())
    }

    /// Set the value of a signal
    ///
    /// Writing a value equal to the current one is a no-op: the version does
    /// not move and no observer is invalidated.
    pub fn set<T: PartialEq + 'static>(&mut self, signal: Signal<T>, value: T) {
        let Some(node) = self.signals.get_mut(signal.id) else {
            return;
        };
        if node.value.downcast_ref::<T>() == Some(&value) {
            return;
        }

        node.value = Box::new(value);
        node.version += 1;
        self.global_version.set(self.global_version.get() + 1);

        let subscribers = node.subscribers.clone();
        for observer in subscribers {
            self.invalidate(observer);
        }
    }

    /// Update a signal using a function
    pub fn update<T, F>(&mut self, signal: Signal<T>, f: F)
    where
        T: Clone + PartialEq + 'static,
        F: FnOnce(T) -> T,
    {
        if let Some(current) = self.get_untracked(signal) {
            self.set(signal, f(current));
        }
    }

    /// Get the version of a signal (for change detection)
    pub fn signal_version(&self, id: SignalId) -> Option<u64> {
        self.signals.get(id).map(|n| n.version)
    }

    /// Remove a signal; later reads return `None`
    pub fn dispose_signal<T>(&mut self, signal: Signal<T>) {
        if let Some(node) = self.signals.remove(signal.id) {
            for observer in node.subscribers {
                if let Some(obs) = self.observers.get_mut(observer) {
                    obs.dependencies.retain(|dep| *dep != signal.id);
                }
            }
        }
    }

    // =========================================================================
    // OBSERVERS
    // =========================================================================

    pub fn create_observer(&mut self) -> ObserverId {
        self.observers.insert(ObserverNode {
            dependencies: SmallVec::new(),
            dirty: Cell::new(false),
        })
    }

    /// Drop an observer and all of its subscriptions
    pub fn dispose_observer(&mut self, observer: ObserverId) {
        if let Some(node) = self.observers.remove(observer) {
            for dep in node.dependencies {
                if let Some(sig) = self.signals.get_mut(dep) {
                    sig.subscribers.retain(|s| *s != observer);
                }
            }
        }
        self.pending.borrow_mut().retain(|id| *id != observer);
        self.deferred.borrow_mut().retain(|id| *id != observer);
    }

    /// Run `f`, recording its tracked reads as the observer's dependencies
    ///
    /// The previous subscriptions of `observer` are replaced. Nested calls
    /// track independently; the outer run resumes afterwards.
    pub fn observe<F, R>(&mut self, observer: ObserverId, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let previous = self.start_tracking();
        let result = f(self);
        self.finish_tracking(observer, previous);
        result
    }

    /// Begin recording reads, returning the enclosing run's reads
    ///
    /// Pair with [`ReactiveGraph::finish_tracking`] when the run cannot be
    /// expressed as a closure.
    pub fn start_tracking(&self) -> Option<Vec<SignalId>> {
        self.tracking.replace(Some(Vec::new()))
    }

    /// Stop recording, subscribe `observer` to what was read and restore
    /// the enclosing run
    pub fn finish_tracking(&mut self, observer: ObserverId, previous: Option<Vec<SignalId>>) {
        let deps = self.tracking.replace(previous).unwrap_or_default();
        self.resubscribe(observer, deps);
    }

    /// Run `f` without recording any read it makes
    pub fn untracked<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        let previous = self.tracking.take();
        let result = f(self);
        self.tracking.replace(previous);
        result
    }

    /// Whether reads are currently being recorded
    pub fn is_tracking(&self) -> bool {
        self.tracking.borrow().is_some()
    }

    /// Drain the observers invalidated since the last call, in notification order
    pub fn take_invalidated(&mut self) -> Vec<ObserverId> {
        let drained: Vec<ObserverId> = self.pending.borrow_mut().drain(..).collect();
        for id in &drained {
            if let Some(node) = self.observers.get(*id) {
                node.dirty.set(false);
            }
        }
        drained
    }

    /// Signals an observer currently depends on
    pub fn dependencies(&self, observer: ObserverId) -> &[SignalId] {
        self.observers
            .get(observer)
            .map(|n| n.dependencies.as_slice())
            .unwrap_or(&[])
    }

    // =========================================================================
    // BATCHING
    // =========================================================================

    /// Start a batch - invalidations are held until the batch ends
    pub fn batch_start(&self) {
        self.batch_depth.set(self.batch_depth.get() + 1);
    }

    /// End a batch and queue held invalidations
    pub fn batch_end(&mut self) {
        let depth = self.batch_depth.get();
        if depth > 0 {
            self.batch_depth.set(depth - 1);
            if depth == 1 {
                let deferred = std::mem::take(&mut *self.deferred.borrow_mut());
                self.pending.borrow_mut().extend(deferred);
            }
        }
    }

    /// Run a function in a batch context
    pub fn batch<F, R>(&mut self, f: F) -> R
    where
        F: FnOnce(&mut Self) -> R,
    {
        self.batch_start();
        let result = f(self);
        self.batch_end();
        result
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn invalidate(&mut self, observer: ObserverId) {
        let Some(node) = self.observers.get(observer) else {
            return;
        };
        if node.dirty.get() {
            return;
        }
        node.dirty.set(true);
        if self.batch_depth.get() > 0 {
            self.deferred.borrow_mut().push(observer);
        } else {
            self.pending.borrow_mut().push_back(observer);
        }
    }

    fn resubscribe(&mut self, observer: ObserverId, deps: Vec<SignalId>) {
        let Some(node) = self.observers.get_mut(observer) else {
            return;
        };

        for &dep_id in &node.dependencies {
            if let Some(sig) = self.signals.get_mut(dep_id) {
                sig.subscribers.retain(|s| *s != observer);
            }
        }

        for &dep_id in &deps {
            if let Some(sig) = self.signals.get_mut(dep_id) {
                if !sig.subscribers.contains(&observer) {
                    sig.subscribers.push(observer);
                }
            }
        }

        node.dependencies = deps.into_iter().collect();
    }

    /// Get statistics about the reactive graph
    pub fn stats(&self) -> ReactiveStats {
        ReactiveStats {
            signal_count: self.signals.len(),
            observer_count: self.observers.len(),
            pending_observers: self.pending.borrow().len(),
            global_version: self.global_version.get(),
        }
    }
}

impl Default for ReactiveGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the reactive graph
#[derive(Debug, Clone)]
pub struct ReactiveStats {
    pub signal_count: usize,
    pub observer_count: usize,
    pub pending_observers: usize,
    pub global_version: u64,
}
