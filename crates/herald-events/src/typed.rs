//! Typed topics.
//!
//! A [`Topic`] binds an [`EventKey`] to the payload type its listeners take.
//! [`TypedEmitter`] checks that binding where callers register and emit; the
//! registry underneath is an ordinary [`EventEmitter`] over type-erased
//! payloads, so dispatch semantics are identical.

use std::any::{Any, type_name};
use std::borrow::Cow;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::emitter::EventEmitter;
use crate::error::EmitterError;
use crate::key::EventKey;
use crate::listener::{Listener, ListenerFilter, Origin};
use crate::options::EmitterOptions;

/// Payload type the underlying registry dispatches.
type Payload = dyn Any + Send + Sync;

/// Event key bound to a payload type.
pub struct Topic<T> {
    key: EventKey,
    _payload: PhantomData<fn(&T)>,
}

impl<T> Topic<T> {
    /// Topic under a named key.
    #[must_use]
    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        Self::from_key(EventKey::Name(name.into()))
    }

    /// Topic under a fresh symbol key.
    #[must_use]
    pub fn symbol(description: impl Into<Cow<'static, str>>) -> Self {
        Self::from_key(EventKey::symbol(description))
    }

    /// Topic under an existing key.
    #[must_use]
    pub fn from_key(key: EventKey) -> Self {
        Self {
            key,
            _payload: PhantomData,
        }
    }

    /// The key this topic dispatches under.
    #[must_use]
    pub fn key(&self) -> &EventKey {
        &self.key
    }
}

impl<T> Clone for Topic<T> {
    fn clone(&self) -> Self {
        Self::from_key(self.key.clone())
    }
}

impl<T> fmt::Debug for Topic<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Topic")
            .field("key", &self.key)
            .field("payload", &type_name::<T>())
            .finish()
    }
}

/// Emitter whose keys each carry their own payload type.
///
/// ```rust
/// use herald_events::{Listener, Topic, TypedEmitter};
///
/// let data: Topic<String> = Topic::named("data");
/// let progress: Topic<f64> = Topic::named("progress");
///
/// let stream: TypedEmitter = TypedEmitter::new();
/// stream
///     .on(&data, Listener::infallible(|_, chunk: &String| println!("{chunk}")))
///     .on(&progress, Listener::infallible(|_, ratio: &f64| println!("{ratio}")));
///
/// assert!(stream.emit(&data, &"1575".to_string()).unwrap());
/// assert!(stream.emit(&progress, &0.5).unwrap());
/// ```
pub struct TypedEmitter<C = ()> {
    inner: EventEmitter<EventKey, Payload, C>,
}

impl<C: 'static> TypedEmitter<C> {
    /// Create an empty emitter.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(EmitterOptions::default())
    }

    /// Create an empty emitter with the given options.
    #[must_use]
    pub fn with_options(options: EmitterOptions) -> Self {
        Self {
            inner: EventEmitter::with_options(options),
        }
    }

    /// Register `listener` for `topic`.
    pub fn on<T: Any + Send + Sync>(&self, topic: &Topic<T>, listener: Listener<T, C>) -> &Self {
        self.inner.on(topic.key.clone(), erase(topic, listener));
        self
    }

    /// Register `listener` for `topic`, bound to `context`.
    pub fn on_with<T: Any + Send + Sync>(
        &self,
        topic: &Topic<T>,
        listener: Listener<T, C>,
        context: impl Into<Arc<C>>,
    ) -> &Self {
        self.inner
            .on_with(topic.key.clone(), erase(topic, listener), context);
        self
    }

    /// Register `listener` for the next emission of `topic` only.
    pub fn once<T: Any + Send + Sync>(&self, topic: &Topic<T>, listener: Listener<T, C>) -> &Self {
        self.inner.once(topic.key.clone(), erase(topic, listener));
        self
    }

    /// Like [`once`](Self::once), bound to `context`.
    pub fn once_with<T: Any + Send + Sync>(
        &self,
        topic: &Topic<T>,
        listener: Listener<T, C>,
        context: impl Into<Arc<C>>,
    ) -> &Self {
        self.inner
            .once_with(topic.key.clone(), erase(topic, listener), context);
        self
    }

    /// Remove the records of `topic` selected by `filter`.
    pub fn remove_listener<'f, T>(
        &self,
        topic: &Topic<T>,
        filter: impl Into<ListenerFilter<'f, T, C>>,
    ) -> &Self
    where
        C: PartialEq + 'f,
    {
        self.inner
            .remove_listener(&topic.key, filter.into().retarget::<Payload>());
        self
    }

    /// Alias of [`remove_listener`](Self::remove_listener).
    pub fn off<'f, T>(&self, topic: &Topic<T>, filter: impl Into<ListenerFilter<'f, T, C>>) -> &Self
    where
        C: PartialEq + 'f,
    {
        self.remove_listener(topic, filter)
    }

    /// Remove every record of `key`, or of all keys when `key` is `None`.
    pub fn remove_all_listeners(&self, key: Option<&EventKey>) -> &Self {
        self.inner.remove_all_listeners(key);
        self
    }

    /// Listeners registered for `topic`, in registration order.
    ///
    /// Only listeners registered through a topic of the same payload type are
    /// returned. Another topic sharing the key keeps its own listeners.
    #[must_use]
    pub fn listeners<T: Any + Send + Sync>(&self, topic: &Topic<T>) -> Vec<Listener<T, C>> {
        self.inner
            .listeners(&topic.key)
            .iter()
            .filter_map(|erased| typed_handle::<T, C>(erased).cloned())
            .collect()
    }

    /// Number of listeners [`listeners`](Self::listeners) returns for `topic`.
    #[must_use]
    pub fn listener_count<T: Any + Send + Sync>(&self, topic: &Topic<T>) -> usize {
        self.inner
            .listeners(&topic.key)
            .iter()
            .filter(|erased| typed_handle::<T, C>(erased).is_some())
            .count()
    }

    /// Keys holding at least one listener, in the order they were created.
    #[must_use]
    pub fn event_names(&self) -> Vec<EventKey> {
        self.inner.event_names()
    }

    /// Invoke every listener registered for `topic` with `payload`.
    ///
    /// # Errors
    ///
    /// Returns the first listener error unchanged, or
    /// [`EmitterError::PayloadMismatch`] if a listener was registered under
    /// the same key with another payload type.
    pub fn emit<T: Any + Send + Sync>(&self, topic: &Topic<T>, payload: &T) -> anyhow::Result<bool> {
        self.inner.emit(&topic.key, payload)
    }
}

impl<C: 'static> Default for TypedEmitter<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TypedEmitter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEmitter")
            .field("inner", &self.inner)
            .finish()
    }
}

/// The typed handle an erased listener was built from, if it takes `T`.
fn typed_handle<T, C>(erased: &Listener<Payload, C>) -> Option<&Listener<T, C>>
where
    T: Any + Send + Sync,
    C: 'static,
{
    erased
        .origin()
        .and_then(|origin| origin.handle.downcast_ref::<Listener<T, C>>())
}

/// Wrap a typed listener so the registry can dispatch it, keeping its
/// identity for removal and introspection.
fn erase<T, C>(topic: &Topic<T>, listener: Listener<T, C>) -> Listener<Payload, C>
where
    T: Any + Send + Sync,
    C: 'static,
{
    let origin = Origin {
        id: listener.id(),
        handle: Arc::new(listener.clone()),
    };
    let key = topic.key.to_string();

    Listener::erased(
        move |context, payload: &Payload| match payload.downcast_ref::<T>() {
            Some(payload) => listener.call(context, payload),
            None => Err(EmitterError::PayloadMismatch {
                key: key.clone(),
                expected: type_name::<T>(),
            }
            .into()),
        },
        origin,
    )
}
