//! Recording and failing listeners.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use herald_events::Listener;

/// One recorded invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct Call<T> {
    /// Label of the recorder that was invoked.
    pub label: &'static str,
    /// Arguments the recorder received.
    pub payload: T,
    /// Whether a context was bound to the invoked record.
    pub had_context: bool,
}

/// Shared, ordered log of listener invocations.
///
/// Clones share the same log, so a recorder can be handed to an emitter while
/// the test keeps a handle for assertions.
#[derive(Debug)]
pub struct CallLog<T> {
    calls: Arc<Mutex<Vec<Call<T>>>>,
}

impl<T> Clone for CallLog<T> {
    fn clone(&self) -> Self {
        Self {
            calls: Arc::clone(&self.calls),
        }
    }
}

impl<T> Default for CallLog<T> {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl<T: Clone + Send + 'static> CallLog<T> {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Listener appending a [`Call`] under `label` each time it runs.
    #[must_use]
    pub fn recorder<C: 'static>(&self, label: &'static str) -> Listener<T, C> {
        let log = self.clone();
        Listener::new(move |context: Option<&C>, payload: &T| {
            log.push(label, payload.clone(), context.is_some());
            Ok(())
        })
    }

    /// Append a call by hand, for listeners built in the test itself.
    pub fn push(&self, label: &'static str, payload: T, had_context: bool) {
        self.lock().push(Call {
            label,
            payload,
            had_context,
        });
    }

    /// Every recorded call, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<Call<T>> {
        self.lock().clone()
    }

    /// Labels of every recorded call, oldest first.
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        self.lock().iter().map(|call| call.label).collect()
    }

    /// Number of calls recorded under `label`.
    #[must_use]
    pub fn count(&self, label: &str) -> usize {
        self.lock().iter().filter(|call| call.label == label).count()
    }

    /// Payload of the latest call recorded under `label`.
    #[must_use]
    pub fn last(&self, label: &str) -> Option<T> {
        self.lock()
            .iter()
            .rev()
            .find(|call| call.label == label)
            .map(|call| call.payload.clone())
    }

    /// Total number of recorded calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Forget every recorded call.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Call<T>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Listener that always fails with `message`.
#[must_use]
pub fn failing_listener<A: ?Sized + 'static, C: 'static>(message: &'static str) -> Listener<A, C> {
    Listener::new(move |_, _| Err(anyhow::anyhow!(message)))
}

/// Listener that does nothing.
#[must_use]
pub fn noop_listener<A: ?Sized + 'static, C: 'static>() -> Listener<A, C> {
    Listener::new(|_, _| Ok(()))
}
