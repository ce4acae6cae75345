//! Listener registry and synchronous dispatcher.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::collections::hash_map;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, trace, warn};

use crate::error::{EmitterError, EmitterResult};
use crate::listener::{Listener, ListenerFilter};
use crate::options::EmitterOptions;

/// One registration of a listener under a key.
struct Record<A: ?Sized, C> {
    listener: Listener<A, C>,
    context: Option<Arc<C>>,
    once: bool,
    fired: AtomicBool,
}

impl<A: ?Sized, C> Record<A, C> {
    /// Mark a once record as fired. Returns `false` if some dispatch already
    /// fired it.
    fn claim(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }
}

struct Entry<A: ?Sized, C> {
    records: Vec<Arc<Record<A, C>>>,
    warned: bool,
}

impl<A: ?Sized, C> Default for Entry<A, C> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            warned: false,
        }
    }
}

/// Live listener table. Keys are present only while they hold records.
struct Registry<K, A: ?Sized, C> {
    entries: HashMap<K, Entry<A, C>>,
    /// Key creation order, for `event_names`.
    order: Vec<K>,
}

impl<K, A: ?Sized, C> Registry<K, A, C>
where
    K: Eq + Hash + Clone,
{
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: Vec::new(),
        }
    }

    fn entry(&mut self, key: K) -> &mut Entry<A, C> {
        match self.entries.entry(key) {
            hash_map::Entry::Occupied(occupied) => occupied.into_mut(),
            hash_map::Entry::Vacant(vacant) => {
                self.order.push(vacant.key().clone());
                vacant.insert(Entry::default())
            },
        }
    }

    fn records(&self, key: &K) -> &[Arc<Record<A, C>>] {
        match self.entries.get(key) {
            Some(entry) => &entry.records,
            None => &[],
        }
    }

    /// Drop every record of `key` for which `remove` holds, keeping the
    /// survivors in order. Returns the removed records.
    fn extract(
        &mut self,
        key: &K,
        mut remove: impl FnMut(&Record<A, C>) -> bool,
    ) -> Vec<Arc<Record<A, C>>> {
        let Some(entry) = self.entries.get_mut(key) else {
            return Vec::new();
        };
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut entry.records)
            .into_iter()
            .partition(|record| remove(&**record));
        entry.records = kept;
        if entry.records.is_empty() {
            self.prune(key);
        }
        removed
    }

    fn prune(&mut self, key: &K) -> Vec<Arc<Record<A, C>>> {
        self.order.retain(|k| k != key);
        self.entries
            .remove(key)
            .map(|entry| entry.records)
            .unwrap_or_default()
    }

    fn clear(&mut self) -> Vec<Arc<Record<A, C>>> {
        self.order.clear();
        self.entries
            .drain()
            .flat_map(|(_, entry)| entry.records)
            .collect()
    }
}

/// Synchronous event emitter.
///
/// Listeners are registered per key and invoked in registration order by
/// [`emit`](Self::emit), on the caller's thread. Every method takes `&self`,
/// so a listener holding a handle to the emitter may register, remove or emit
/// while it is being dispatched. Such changes apply to the live registry only:
/// each `emit` iterates a snapshot taken before its first listener runs.
///
/// `A` is the argument type handed to listeners and `C` the type of the
/// optional context a registration can bind. Keys are hashed and compared with
/// the registry locked, so `K`'s `Hash` and `Eq` must not call back into the
/// emitter.
///
/// ```rust
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use herald_events::{EventEmitter, Listener};
///
/// let emitter: EventEmitter<&str, u32> = EventEmitter::new();
/// let total = Arc::new(AtomicUsize::new(0));
/// let sink = Arc::clone(&total);
///
/// emitter
///     .on("progress", Listener::infallible(move |_, n: &u32| {
///         sink.fetch_add(*n as usize, Ordering::SeqCst);
///     }))
///     .once("progress", Listener::new(|_, _| Ok(())));
///
/// assert!(emitter.emit(&"progress", &2).unwrap());
/// assert!(emitter.emit(&"progress", &3).unwrap());
/// assert!(!emitter.emit(&"end", &0).unwrap());
/// assert_eq!(total.load(Ordering::SeqCst), 5);
/// assert_eq!(emitter.listener_count(&"progress"), 1);
/// ```
pub struct EventEmitter<K, A: ?Sized = (), C = ()> {
    registry: Mutex<Registry<K, A, C>>,
    options: EmitterOptions,
}

impl<K, A: ?Sized, C> EventEmitter<K, A, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    /// Create an empty emitter with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    /// Create an empty emitter with the given options.
    #[must_use]
    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
            options,
        }
    }

    /// Options this emitter was built with.
    #[must_use]
    pub fn options(&self) -> &EmitterOptions {
        &self.options
    }

    /// Register `listener` for `key`.
    ///
    /// Registering the same listener twice yields two independent records.
    pub fn on(&self, key: K, listener: Listener<A, C>) -> &Self {
        self.add(key, listener, None, false)
    }

    /// Register `listener` for `key`, bound to `context`.
    pub fn on_with(&self, key: K, listener: Listener<A, C>, context: impl Into<Arc<C>>) -> &Self {
        self.add(key, listener, Some(context.into()), false)
    }

    /// Register `listener` for the next emission of `key` only.
    ///
    /// The record leaves the registry before its callback runs, so a nested
    /// emission of the same key from inside the callback does not reach it.
    pub fn once(&self, key: K, listener: Listener<A, C>) -> &Self {
        self.add(key, listener, None, true)
    }

    /// Like [`once`](Self::once), bound to `context`.
    pub fn once_with(&self, key: K, listener: Listener<A, C>, context: impl Into<Arc<C>>) -> &Self {
        self.add(key, listener, Some(context.into()), true)
    }

    /// Remove the records of `key` selected by `filter`.
    ///
    /// Pass `&listener` to remove every registration of that listener, or a
    /// [`ListenerFilter`] to narrow by context and once flag. Removing nothing
    /// is not an error.
    ///
    /// Contexts are compared without the registry locked, so a `PartialEq`
    /// implementation may call back into the emitter. Records registered
    /// while the comparison runs are kept.
    pub fn remove_listener<'f>(&self, key: &K, filter: impl Into<ListenerFilter<'f, A, C>>) -> &Self
    where
        C: PartialEq + 'f,
    {
        let filter = filter.into();
        let snapshot = self.lock().records(key).to_vec();
        let matched: Vec<Arc<Record<A, C>>> = snapshot
            .into_iter()
            .filter(|record| {
                filter.matches(&record.listener, record.context.as_deref(), record.once)
            })
            .collect();
        if matched.is_empty() {
            return self;
        }

        // `matched` keeps its records alive, so their addresses stay unique.
        let removed = self.lock().extract(key, |live| {
            matched
                .iter()
                .any(|record| std::ptr::eq(live, Arc::as_ptr(record)))
        });
        debug!(event = ?key, removed = removed.len(), "Listeners removed");
        drop(removed);
        drop(matched);
        self
    }

    /// Alias of [`remove_listener`](Self::remove_listener).
    pub fn off<'f>(&self, key: &K, filter: impl Into<ListenerFilter<'f, A, C>>) -> &Self
    where
        C: PartialEq + 'f,
    {
        self.remove_listener(key, filter)
    }

    /// Remove every record of `key`, or of all keys when `key` is `None`.
    pub fn remove_all_listeners(&self, key: Option<&K>) -> &Self {
        let removed = match key {
            Some(key) => self.lock().prune(key),
            None => self.lock().clear(),
        };
        debug!(event = ?key, removed = removed.len(), "All listeners removed");
        drop(removed);
        self
    }

    /// Listeners registered for `key`, in registration order.
    #[must_use]
    pub fn listeners(&self, key: &K) -> Vec<Listener<A, C>> {
        self.lock()
            .records(key)
            .iter()
            .map(|record| record.listener.clone())
            .collect()
    }

    /// Number of records registered for `key`.
    #[must_use]
    pub fn listener_count(&self, key: &K) -> usize {
        self.lock().records(key).len()
    }

    /// Keys holding at least one listener, in the order they were created.
    #[must_use]
    pub fn event_names(&self) -> Vec<K> {
        self.lock().order.clone()
    }

    /// Invoke every listener registered for `key` with `args`.
    ///
    /// Returns `Ok(false)` when nothing is registered. Once records are
    /// removed from the registry right before their callback runs.
    ///
    /// # Errors
    ///
    /// Returns the first error a listener returns, unchanged. Listeners after
    /// it in this dispatch are not invoked.
    pub fn emit(&self, key: &K, args: &A) -> anyhow::Result<bool> {
        let snapshot = self.lock().records(key).to_vec();
        if snapshot.is_empty() {
            trace!(event = ?key, "No listeners for event");
            return Ok(false);
        }

        trace!(event = ?key, listener_count = snapshot.len(), "Emitting event");

        for record in &snapshot {
            if record.once {
                if !record.claim() {
                    continue;
                }
                let removed = self
                    .lock()
                    .extract(key, |live| std::ptr::eq(live, Arc::as_ptr(record)));
                drop(removed);
            }

            if let Err(err) = record.listener.call(record.context.as_deref(), args) {
                debug!(event = ?key, error = %err, "Listener failed, dispatch aborted");
                return Err(err);
            }
        }

        Ok(true)
    }

    fn add(&self, key: K, listener: Listener<A, C>, context: Option<Arc<C>>, once: bool) -> &Self {
        let record = Arc::new(Record {
            listener,
            context,
            once,
            fired: AtomicBool::new(false),
        });

        let mut registry = self.lock();
        let entry = registry.entry(key.clone());
        entry.records.push(record);
        let count = entry.records.len();
        let overflow = !entry.warned && self.options.exceeds_limit(count);
        if overflow {
            entry.warned = true;
        }
        drop(registry);

        debug!(event = ?key, once, listener_count = count, "Listener registered");
        if overflow {
            warn!(
                event = ?key,
                listener_count = count,
                max_listeners = self.options.max_listeners,
                "Possible listener leak: listener count exceeds limit"
            );
        }
        self
    }

    // Callbacks never run under this lock, so poisoning can only come from a
    // panic inside the registry bookkeeping itself.
    fn lock(&self) -> MutexGuard<'_, Registry<K, A, C>> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, A, C> EventEmitter<K, A, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
    A: ?Sized + 'static,
    C: 'static,
{
    /// Register a type-erased callback for `key`.
    ///
    /// The box must hold a `Listener<A, C>`.
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidArgument`] when it holds anything else;
    /// the registry is left untouched.
    pub fn try_on(
        &self,
        key: K,
        callback: Box<dyn Any + Send + Sync>,
        context: Option<Arc<C>>,
    ) -> EmitterResult<&Self> {
        let listener = Self::downcast_listener(callback)?;
        Ok(self.add(key, listener, context, false))
    }

    /// Once-variant of [`try_on`](Self::try_on).
    ///
    /// # Errors
    ///
    /// Returns [`EmitterError::InvalidArgument`] when the box does not hold a
    /// `Listener<A, C>`.
    pub fn try_once(
        &self,
        key: K,
        callback: Box<dyn Any + Send + Sync>,
        context: Option<Arc<C>>,
    ) -> EmitterResult<&Self> {
        let listener = Self::downcast_listener(callback)?;
        Ok(self.add(key, listener, context, true))
    }

    fn downcast_listener(callback: Box<dyn Any + Send + Sync>) -> EmitterResult<Listener<A, C>> {
        callback
            .downcast::<Listener<A, C>>()
            .map(|listener| *listener)
            .map_err(|_| EmitterError::InvalidArgument {
                reason: format!("expected a {}", type_name::<Listener<A, C>>()),
            })
    }
}

impl<K, A: ?Sized, C> Default for EventEmitter<K, A, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A: ?Sized, C> fmt::Debug for EventEmitter<K, A, C>
where
    K: Eq + Hash + Clone + fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventEmitter")
            .field("events", &self.event_names())
            .field("options", &self.options)
            .finish()
    }
}
