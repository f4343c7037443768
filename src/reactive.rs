//! # Reactive Primitives
//!
//! The router only needs two things from the host's reactivity system:
//!
//! - [`Signal<T>`]: a mutable observable cell. `set` stores the value and
//!   synchronously notifies subscribers when it actually changed.
//! - [`Derived<T>`]: a read-only value computed from a signal. It recomputes
//!   eagerly (push-based) whenever the signal changes, so a read after a
//!   `set` always observes the new value.
//!
//! Derived values are published through an [`ArcSwap`], readers get an
//! `Arc<T>` per version and never see a half-updated value. Each version is a
//! fresh `Arc`, so observers can detect changes by pointer comparison.
//!
//! Callbacks always run after internal locks are released, so a subscriber may
//! read the signal it is subscribed to.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use arc_swap::ArcSwap;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T: ?Sized> {
    next_id: u64,
    entries: Vec<(SubscriptionId, Callback<T>)>,
}

impl<T: ?Sized> Subscribers<T> {
    fn new() -> Self {
        Self {
            next_id: 0,
            entries: Vec::new(),
        }
    }

    fn add(&mut self, callback: Callback<T>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.entries.push((id, callback));
        id
    }

    fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry, _)| *entry != id);
        before != self.entries.len()
    }

    fn snapshot(&self) -> Vec<Callback<T>> {
        self.entries.iter().map(|(_, cb)| Arc::clone(cb)).collect()
    }
}

struct SignalInner<T> {
    value: RwLock<T>,
    version: AtomicU64,
    subscribers: Mutex<Subscribers<T>>,
}

/// Mutable observable cell.
pub struct Signal<T> {
    inner: Arc<SignalInner<T>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Signal<T>
where
    T: Clone + PartialEq + Send + Sync + 'static,
{
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(SignalInner {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                subscribers: Mutex::new(Subscribers::new()),
            }),
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.read().expect("signal lock poisoned").clone()
    }

    /// Borrow the current value for the duration of `f`.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.read().expect("signal lock poisoned"))
    }

    /// Store `value` and notify subscribers. Returns `false` (and notifies no
    /// one) when the value is unchanged.
    pub fn set(&self, value: T) -> bool {
        {
            let mut current = self.inner.value.write().expect("signal lock poisoned");
            if *current == value {
                return false;
            }
            *current = value.clone();
            self.inner.version.fetch_add(1, Ordering::AcqRel);
        }

        let callbacks = self
            .inner
            .subscribers
            .lock()
            .expect("signal subscribers lock poisoned")
            .snapshot();
        for callback in callbacks {
            callback(&value);
        }
        true
    }

    /// Apply `f` to a copy of the current value and store the result.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> bool {
        let mut value = self.get();
        f(&mut value);
        self.set(value)
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.inner
            .subscribers
            .lock()
            .expect("signal subscribers lock poisoned")
            .add(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner
            .subscribers
            .lock()
            .expect("signal subscribers lock poisoned")
            .remove(id)
    }

    /// Number of changes applied so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .subscribers
            .lock()
            .expect("signal subscribers lock poisoned")
            .entries
            .len()
    }
}

type Compute<T> = Box<dyn Fn() -> T + Send + Sync>;
type Teardown = Box<dyn FnOnce() + Send>;

struct DerivedInner<T> {
    value: ArcSwap<T>,
    compute: Compute<T>,
    /// Held from compute to store, so a stale result never overwrites a newer one.
    update: Mutex<()>,
    version: AtomicU64,
    disposed: AtomicBool,
    teardown: Mutex<Option<Teardown>>,
    listeners: Mutex<Subscribers<Arc<T>>>,
}

impl<T> DerivedInner<T> {
    fn recompute(&self) {
        if self.disposed.load(Ordering::Acquire) {
            return;
        }
        let next = {
            let _update = self.update.lock().expect("derived update lock poisoned");
            let next = Arc::new((self.compute)());
            self.value.store(Arc::clone(&next));
            self.version.fetch_add(1, Ordering::AcqRel);
            next
        };

        let callbacks = self
            .listeners
            .lock()
            .expect("derived listeners lock poisoned")
            .snapshot();
        for callback in callbacks {
            callback(&next);
        }
    }
}

/// Read-only value recomputed whenever its source signal changes.
pub struct Derived<T> {
    inner: Arc<DerivedInner<T>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Derived<T>
where
    T: Send + Sync + 'static,
{
    /// Derive a value from `source`. `compute` runs once immediately and then
    /// after every change of `source`, until [`dispose`](Self::dispose).
    pub fn new<S, F>(source: &Signal<S>, compute: F) -> Self
    where
        S: Clone + PartialEq + Send + Sync + 'static,
        F: Fn(&S) -> T + Send + Sync + 'static,
    {
        let reader = source.clone();
        let compute: Compute<T> = Box::new(move || reader.with(|value| compute(value)));
        let initial = compute();

        let inner = Arc::new(DerivedInner {
            value: ArcSwap::from_pointee(initial),
            compute,
            update: Mutex::new(()),
            version: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
            teardown: Mutex::new(None),
            listeners: Mutex::new(Subscribers::new()),
        });

        let weak: Weak<DerivedInner<T>> = Arc::downgrade(&inner);
        let subscription = source.subscribe(move |_| {
            if let Some(inner) = weak.upgrade() {
                inner.recompute();
            }
        });
        let source = source.clone();
        *inner.teardown.lock().expect("derived teardown lock poisoned") =
            Some(Box::new(move || {
                source.unsubscribe(subscription);
            }));

        Self { inner }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> Arc<T> {
        self.inner.value.load_full()
    }

    /// Recompute now, even though the source did not change.
    pub fn refresh(&self) {
        self.inner.recompute();
    }

    /// Observe new versions.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&Arc<T>) + Send + Sync + 'static,
    {
        self.inner
            .listeners
            .lock()
            .expect("derived listeners lock poisoned")
            .add(Arc::new(callback))
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner
            .listeners
            .lock()
            .expect("derived listeners lock poisoned")
            .remove(id)
    }

    /// Stop tracking the source. The last value stays readable.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        let teardown = self
            .inner
            .teardown
            .lock()
            .expect("derived teardown lock poisoned")
            .take();
        if let Some(teardown) = teardown {
            teardown();
        }
        self.inner
            .listeners
            .lock()
            .expect("derived listeners lock poisoned")
            .entries
            .clear();
    }

    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }

    /// Number of recomputations since creation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.load(Ordering::Acquire)
    }
}
