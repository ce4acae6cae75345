//! Listener handles and removal filters.

use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// Identity of a listener callback, stable while any handle to it is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ListenerId(usize);

/// Caller-facing handle a type-erased listener was built from.
#[derive(Clone)]
pub(crate) struct Origin {
    pub(crate) id: ListenerId,
    pub(crate) handle: Arc<dyn Any + Send + Sync>,
}

/// Shared handle to a listener callback.
///
/// The callback receives the bound context (if the registration carried one)
/// and a reference to the emitted arguments. Returning an error aborts the
/// dispatch and hands the error back to the caller of `emit`.
///
/// Handles compare equal when they share the same callback, which is how
/// removal finds the records a listener was registered under:
///
/// ```rust
/// use herald_events::Listener;
///
/// let a: Listener<str> = Listener::new(|_, text| {
///     println!("{text}");
///     Ok(())
/// });
/// let b = a.clone();
/// assert_eq!(a, b);
/// assert_ne!(a, Listener::new(|_, _| Ok(())));
/// ```
pub struct Listener<A: ?Sized, C = ()> {
    callback: Arc<dyn Fn(Option<&C>, &A) -> anyhow::Result<()> + Send + Sync>,
    origin: Option<Origin>,
}

impl<A: ?Sized, C> Listener<A, C> {
    /// Wrap a callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(Option<&C>, &A) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            origin: None,
        }
    }

    /// Wrap a callback that never fails.
    pub fn infallible<F>(callback: F) -> Self
    where
        F: Fn(Option<&C>, &A) + Send + Sync + 'static,
    {
        Self::new(move |context, args| {
            callback(context, args);
            Ok(())
        })
    }

    /// Build an erased listener that keeps the identity of `origin`.
    pub(crate) fn erased<F>(callback: F, origin: Origin) -> Self
    where
        F: Fn(Option<&C>, &A) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            callback: Arc::new(callback),
            origin: Some(origin),
        }
    }

    pub(crate) fn id(&self) -> ListenerId {
        match &self.origin {
            Some(origin) => origin.id,
            None => ListenerId(Arc::as_ptr(&self.callback).cast::<()>().addr()),
        }
    }

    pub(crate) fn origin(&self) -> Option<&Origin> {
        self.origin.as_ref()
    }

    pub(crate) fn call(&self, context: Option<&C>, args: &A) -> anyhow::Result<()> {
        (self.callback)(context, args)
    }
}

impl<A: ?Sized, C> Clone for Listener<A, C> {
    fn clone(&self) -> Self {
        Self {
            callback: Arc::clone(&self.callback),
            origin: self.origin.clone(),
        }
    }
}

impl<A: ?Sized, C> PartialEq for Listener<A, C> {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl<A: ?Sized, C> Eq for Listener<A, C> {}

impl<A: ?Sized, C> fmt::Debug for Listener<A, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("id", &self.id().0)
            .field("erased", &self.origin.is_some())
            .finish()
    }
}

/// Selects which records `remove_listener` drops from a key.
///
/// Criteria narrow progressively: no listener means every record, a listener
/// restricts to its callback, a context additionally requires a structurally
/// equal bound context, and a once flag restricts to one kind of record.
///
/// A filter borrows the listener it names, so it cannot outlive it:
///
/// ```compile_fail
/// use herald_events::{EventEmitter, Listener, ListenerFilter};
///
/// let emitter: EventEmitter<&str> = EventEmitter::new();
/// let filter = {
///     let gone: Listener<()> = Listener::new(|_, _| Ok(()));
///     ListenerFilter::listener(&gone)
/// };
/// emitter.off(&"e", filter);
/// ```
pub struct ListenerFilter<'a, A: ?Sized, C = ()> {
    /// Valid while `'a` holds: the named listener is borrowed for `'a`.
    listener: Option<ListenerId>,
    context: Option<&'a C>,
    once: Option<bool>,
    _payload: PhantomData<fn(&A)>,
}

impl<'a, A: ?Sized, C> ListenerFilter<'a, A, C> {
    /// Match every record.
    #[must_use]
    pub fn all() -> Self {
        Self {
            listener: None,
            context: None,
            once: None,
            _payload: PhantomData,
        }
    }

    /// Match records registered with `listener`, whatever their context.
    ///
    /// The borrow keeps the callback alive, and with it the identity the
    /// filter compares against.
    #[must_use]
    pub fn listener(listener: &'a Listener<A, C>) -> Self {
        Self {
            listener: Some(listener.id()),
            ..Self::all()
        }
    }

    /// Also require the record's context to equal `context`.
    #[must_use]
    pub fn with_context(mut self, context: &'a C) -> Self {
        self.context = Some(context);
        self
    }

    /// Only match `once` records (`true`) or only persistent ones (`false`).
    #[must_use]
    pub fn only_once(mut self, once: bool) -> Self {
        self.once = Some(once);
        self
    }

    pub(crate) fn matches(&self, listener: &Listener<A, C>, context: Option<&C>, once: bool) -> bool
    where
        C: PartialEq,
    {
        if self.listener.is_some_and(|id| id != listener.id()) {
            return false;
        }
        if let Some(expected) = self.context
            && context != Some(expected)
        {
            return false;
        }
        self.once.is_none_or(|flag| flag == once)
    }

    /// Same criteria over a different payload type.
    pub(crate) fn retarget<B: ?Sized>(self) -> ListenerFilter<'a, B, C> {
        ListenerFilter {
            listener: self.listener,
            context: self.context,
            once: self.once,
            _payload: PhantomData,
        }
    }
}

impl<A: ?Sized, C> Clone for ListenerFilter<'_, A, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<A: ?Sized, C> Copy for ListenerFilter<'_, A, C> {}

impl<A: ?Sized, C> Default for ListenerFilter<'_, A, C> {
    fn default() -> Self {
        Self::all()
    }
}

impl<'a, A: ?Sized, C> From<&'a Listener<A, C>> for ListenerFilter<'a, A, C> {
    fn from(listener: &'a Listener<A, C>) -> Self {
        Self::listener(listener)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Ctx {
        value: &'static str,
    }

    fn noop() -> Listener<(), Ctx> {
        Listener::new(|_, _| Ok(()))
    }

    #[test]
    fn test_clones_share_identity() {
        let a = noop();
        let b = noop();
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_filter_all_matches_everything() {
        let l = noop();
        let filter = ListenerFilter::<(), Ctx>::all();
        assert!(filter.matches(&l, None, false));
        assert!(filter.matches(&l, Some(&Ctx { value: "x" }), true));
    }

    #[test]
    fn test_filter_by_listener() {
        let l = noop();
        let other = noop();
        let filter = ListenerFilter::listener(&l);
        assert!(filter.matches(&l, None, false));
        assert!(filter.matches(&l, Some(&Ctx { value: "x" }), true));
        assert!(!filter.matches(&other, None, false));
    }

    #[test]
    fn test_filter_context_is_structural() {
        let l = noop();
        let wanted = Ctx { value: "abc" };
        let filter = ListenerFilter::listener(&l).with_context(&wanted);
        assert!(filter.matches(&l, Some(&Ctx { value: "abc" }), false));
        assert!(!filter.matches(&l, Some(&Ctx { value: "xyz" }), false));
        assert!(!filter.matches(&l, None, false));
    }

    #[test]
    fn test_filter_once_flag() {
        let l = noop();
        let once_only = ListenerFilter::listener(&l).only_once(true);
        assert!(once_only.matches(&l, None, true));
        assert!(!once_only.matches(&l, None, false));

        let persistent_only = ListenerFilter::listener(&l).only_once(false);
        assert!(persistent_only.matches(&l, None, false));
        assert!(!persistent_only.matches(&l, None, true));
    }

    #[test]
    fn test_infallible_listener() {
        let l: Listener<u32> = Listener::infallible(|_, n| assert_eq!(*n, 7));
        assert!(l.call(None, &7).is_ok());
    }
}
