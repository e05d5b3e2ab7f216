//! # Change Events
//!
//! Key-scoped broadcast between independently mounted views.
//!
//! Views share no object references, only the key-value store. After a
//! view writes a key it publishes a [`ChangeEvent`] naming that key; every
//! other subscriber of the key reloads from the store. The event carries no
//! data: the store is the only source of truth.
//!
//! [`StoredValue`] bundles one key, its JSON codec, and the bus, so a new
//! persisted cell needs no notify/listen boilerplate of its own.

use crate::{KeyValueStore, LabTrackError};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError, Weak};

// =============================================================================
// EVENT BUS
// =============================================================================

/// Notification that the value under `key` was rewritten.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub key: String,
}

#[derive(Debug)]
struct Subscriber {
    /// `None` subscribes to every key.
    keys: Option<BTreeSet<String>>,
    sender: mpsc::Sender<ChangeEvent>,
}

impl Subscriber {
    fn wants(&self, key: &str) -> bool {
        self.keys.as_ref().is_none_or(|keys| keys.contains(key))
    }
}

#[derive(Debug, Default)]
struct BusInner {
    next_id: u64,
    subscribers: BTreeMap<u64, Subscriber>,
}

/// Broadcast channel keyed by storage key.
///
/// Cloning is cheap; clones publish to the same subscribers.
#[derive(Debug, Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<BusInner>>,
}

impl EventBus {
    /// Create a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver `event` to every subscriber of its key.
    ///
    /// Returns the number of subscribers reached.
    pub fn publish(&self, event: ChangeEvent) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let mut delivered = 0usize;
        let mut closed = Vec::new();

        for (id, subscriber) in &inner.subscribers {
            if !subscriber.wants(&event.key) {
                continue;
            }
            if subscriber.sender.send(event.clone()).is_ok() {
                delivered = delivered.saturating_add(1);
            } else {
                closed.push(*id);
            }
        }
        for id in closed {
            inner.subscribers.remove(&id);
        }

        tracing::trace!(key = %event.key, delivered, "change event published");
        delivered
    }

    /// Subscribe to changes of the given keys.
    pub fn subscribe<I, K>(&self, keys: I) -> Subscription
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.register(Some(keys.into_iter().map(Into::into).collect()))
    }

    /// Subscribe to changes of every key.
    pub fn subscribe_all(&self) -> Subscription {
        self.register(None)
    }

    /// Number of live subscriptions.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .subscribers
            .len()
    }

    fn register(&self, keys: Option<BTreeSet<String>>) -> Subscription {
        let (sender, receiver) = mpsc::channel();
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let id = inner.next_id;
        inner.next_id = inner.next_id.saturating_add(1);
        inner.subscribers.insert(id, Subscriber { keys, sender });

        Subscription {
            id,
            bus: Arc::downgrade(&self.inner),
            receiver,
        }
    }
}

/// A live registration on an [`EventBus`].
///
/// Dropping the subscription unregisters it.
pub struct Subscription {
    id: u64,
    bus: Weak<Mutex<BusInner>>,
    receiver: mpsc::Receiver<ChangeEvent>,
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Subscription {
    /// Next pending event, if any. Never blocks.
    pub fn try_next(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Take every pending event.
    pub fn drain(&self) -> Vec<ChangeEvent> {
        self.receiver.try_iter().collect()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            inner
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .subscribers
                .remove(&self.id);
        }
    }
}

// =============================================================================
// STORED VALUE
// =============================================================================

/// A typed JSON value persisted under one key.
///
/// - `load` never fails: absent, unreadable, or corrupt data yields `T::default()`
/// - `save` is best-effort: failures are logged and swallowed
/// - a change event is published only after a successful write
///
/// Clones share one write lock, so `update` is an atomic
/// read-modify-write between threads holding clones of the same cell.
pub struct StoredValue<T> {
    key: String,
    storage: Arc<dyn KeyValueStore>,
    bus: EventBus,
    write_lock: Arc<Mutex<()>>,
    _value: PhantomData<fn() -> T>,
}

impl<T> Clone for StoredValue<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            storage: Arc::clone(&self.storage),
            bus: self.bus.clone(),
            write_lock: Arc::clone(&self.write_lock),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for StoredValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredValue")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl<T> StoredValue<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Bind a cell to `key`.
    pub fn new(key: impl Into<String>, storage: Arc<dyn KeyValueStore>, bus: EventBus) -> Self {
        Self {
            key: key.into(),
            storage,
            bus,
            write_lock: Arc::new(Mutex::new(())),
            _value: PhantomData,
        }
    }

    /// The storage key of this cell.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the current value from storage.
    #[must_use]
    pub fn load(&self) -> T {
        match self.storage.get(&self.key) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                tracing::warn!(key = %self.key, error = %e, "corrupt stored value, using default");
                T::default()
            }),
            Ok(None) => T::default(),
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "storage read failed, using default");
                T::default()
            }
        }
    }

    /// Persist `value` and broadcast the change.
    pub fn try_save(&self, value: &T) -> Result<(), LabTrackError> {
        let raw = serde_json::to_string(value)
            .map_err(|e| LabTrackError::SerializationError(e.to_string()))?;
        self.storage.set(&self.key, &raw)?;
        self.bus.publish(ChangeEvent {
            key: self.key.clone(),
        });
        Ok(())
    }

    /// Persist `value` and broadcast the change, swallowing failures.
    ///
    /// Returns `false` if the write failed.
    pub fn save(&self, value: &T) -> bool {
        match self.try_save(value) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "storage write failed, change dropped");
                false
            }
        }
    }

    /// Load the freshest value, apply `f`, save.
    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut value = self.load();
        let result = f(&mut value);
        self.save(&value);
        result
    }

    /// Remove the stored value and broadcast the change.
    pub fn clear(&self) -> bool {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match self.storage.remove(&self.key) {
            Ok(()) => {
                self.bus.publish(ChangeEvent {
                    key: self.key.clone(),
                });
                true
            }
            Err(e) => {
                tracing::warn!(key = %self.key, error = %e, "storage remove failed");
                false
            }
        }
    }

    /// Subscribe to changes of this cell's key.
    pub fn subscribe(&self) -> Subscription {
        self.bus.subscribe([self.key.as_str()])
    }
}

// =============================================================================
// TESTS
// =============================================================================
