use fnv::FnvBuildHasher;
use indexmap::IndexMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::{
    cell::Cell,
    fmt::{Debug, Formatter},
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{Arc, Weak},
};
use tracing::{debug, error};

type Listener<T> = Arc<dyn Fn(Arc<T>) + Send + Sync>;

/// Registry of observers notified synchronously, in subscription order, with every new value.
///
/// Values are versioned by the publisher. Deliveries are serialised, and a value older than the
/// latest one delivered is dropped, so the last value a listener sees is always the newest
/// published, even when several threads publish concurrently.
///
/// A panicking listener is logged and skipped, the remaining listeners are still notified.
pub struct SubscriptionHub<T> {
    registry: Arc<Mutex<Registry<T>>>,
    delivered: ReentrantMutex<Cell<u64>>,
}

struct Registry<T> {
    next_id: u64,
    listeners: IndexMap<u64, Listener<T>, FnvBuildHasher>,
}

impl<T> SubscriptionHub<T> {
    /// Register a listener, returning the [`SubscriptionHandle`] used to remove it.
    pub fn subscribe<F>(&self, listener: F) -> SubscriptionHandle<T>
    where
        F: Fn(Arc<T>) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.insert(id, Arc::new(listener));

        SubscriptionHandle {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Invoke every registered listener with the provided value, unless a newer `version` has
    /// already been delivered. Versions are expected to start at 1.
    ///
    /// The registry lock is not held while listeners run, so a listener may subscribe or
    /// unsubscribe without deadlocking. A listener may also publish re-entrantly: the newer value
    /// is delivered at once and the remaining listeners never see the older one.
    pub fn notify(&self, version: u64, value: Arc<T>) {
        let delivered = self.delivered.lock();
        if delivered.get() >= version {
            debug!(version, latest = delivered.get(), "skipping superseded notification");
            return;
        }
        delivered.set(version);

        let listeners = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(id, listener)| (*id, Arc::clone(listener)))
            .collect::<Vec<_>>();

        for (id, listener) in listeners {
            if delivered.get() != version {
                break;
            }

            let value = Arc::clone(&value);
            if catch_unwind(AssertUnwindSafe(|| listener(value))).is_err() {
                error!(subscription = id, "order book listener panicked");
            }
        }
    }

    pub fn len(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Default for SubscriptionHub<T> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Mutex::new(Registry {
                next_id: 0,
                listeners: IndexMap::default(),
            })),
            delivered: ReentrantMutex::new(Cell::new(0)),
        }
    }
}

impl<T> Debug for SubscriptionHub<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHub")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle to a listener registered with a [`SubscriptionHub`].
///
/// Dropping the handle does not unsubscribe.
pub struct SubscriptionHandle<T> {
    id: u64,
    registry: Weak<Mutex<Registry<T>>>,
}

impl<T> SubscriptionHandle<T> {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Remove the listener, returning `true` if it was still registered.
    pub fn unsubscribe(self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };

        let removed = registry.lock().listeners.shift_remove(&self.id);
        removed.is_some()
    }
}

impl<T> Debug for SubscriptionHandle<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubscriptionHandle")
            .field("id", &self.id)
            .finish()
    }
}
