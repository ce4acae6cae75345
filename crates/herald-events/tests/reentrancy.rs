//! Listeners that call back into the emitter while it dispatches.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, Weak};

use herald_events::{EventEmitter, Listener, ListenerFilter};
use herald_test::{CallLog, init_test_logging, noop_listener};

type Emitter = EventEmitter<&'static str>;

#[test]
fn test_removal_during_dispatch_applies_to_next_emit() {
    init_test_logging();
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());

    let l2 = log.recorder("l2");
    let l3 = log.recorder("l3");
    let l1 = {
        let weak = Arc::downgrade(&emitter);
        let l2 = l2.clone();
        let log = log.clone();
        Listener::infallible(move |_, _: &()| {
            log.push("l1", (), false);
            if let Some(emitter) = weak.upgrade() {
                emitter.off(&"event", &l2);
            }
        })
    };
    emitter.on("event", l1).on("event", l2).on("event", l3);

    emitter.emit(&"event", &()).unwrap();
    assert_eq!(log.labels(), vec!["l1", "l2", "l3"]);

    log.clear();
    emitter.emit(&"event", &()).unwrap();
    assert_eq!(log.labels(), vec!["l1", "l3"]);
}

#[test]
fn test_registration_during_dispatch_waits_for_next_emit() {
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());
    let late = log.recorder("late");

    let weak = Arc::downgrade(&emitter);
    emitter.once(
        "event",
        Listener::infallible(move |_, _: &()| {
            if let Some(emitter) = weak.upgrade() {
                emitter.on("event", late.clone());
            }
        }),
    );

    emitter.emit(&"event", &()).unwrap();
    assert!(log.is_empty());

    emitter.emit(&"event", &()).unwrap();
    assert_eq!(log.labels(), vec!["late"]);
}

#[test]
fn test_nested_emit_does_not_refire_once_listener() {
    let calls = Arc::new(AtomicUsize::new(0));
    let nested_result = Arc::new(Mutex::new(None));
    let emitter = Arc::new(Emitter::new());

    let weak = Arc::downgrade(&emitter);
    let counter = Arc::clone(&calls);
    let result = Arc::clone(&nested_result);
    emitter.once(
        "foo",
        Listener::new(move |_, _: &()| {
            counter.fetch_add(1, Ordering::SeqCst);
            if let Some(emitter) = weak.upgrade() {
                *result.lock().unwrap() = Some(emitter.emit(&"foo", &())?);
            }
            Ok(())
        }),
    );

    assert!(emitter.emit(&"foo", &()).unwrap());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(*nested_result.lock().unwrap(), Some(false));
}

#[test]
fn test_nested_emit_cannot_fire_pending_once_twice() {
    // The first listener re-emits before the outer dispatch reaches the once
    // record; the nested dispatch fires it, the outer one must skip it.
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());
    let depth = Arc::new(AtomicUsize::new(0));

    let weak = Arc::downgrade(&emitter);
    let guard = Arc::clone(&depth);
    emitter
        .on(
            "foo",
            Listener::new(move |_, _: &()| {
                if guard.fetch_add(1, Ordering::SeqCst) == 0
                    && let Some(emitter) = weak.upgrade()
                {
                    emitter.emit(&"foo", &())?;
                }
                Ok(())
            }),
        )
        .once("foo", log.recorder("once"));

    emitter.emit(&"foo", &()).unwrap();

    assert_eq!(log.count("once"), 1);
    assert_eq!(emitter.listener_count(&"foo"), 1);
}

#[test]
fn test_off_during_dispatch_hides_once_from_later_emits() {
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());
    let once = log.recorder("once");

    let weak = Arc::downgrade(&emitter);
    let target = once.clone();
    emitter
        .on(
            "foo",
            Listener::infallible(move |_, _: &()| {
                if let Some(emitter) = weak.upgrade() {
                    emitter.off(&"foo", &target);
                }
            }),
        )
        .once("foo", once);

    emitter.emit(&"foo", &()).unwrap();

    // The snapshot still holds the once record, so it runs this time; a
    // removal only hides records from later emissions.
    assert_eq!(log.count("once"), 1);
    assert!(!emitter.listeners(&"foo").is_empty());

    log.clear();
    emitter.emit(&"foo", &()).unwrap();
    assert!(log.is_empty());
}

#[test]
fn test_off_before_emit_prevents_once() {
    let log: CallLog<()> = CallLog::new();
    let emitter = Emitter::new();
    let once = log.recorder("once");
    emitter.once("foo", once.clone());

    emitter.off(&"foo", &once);

    assert!(!emitter.emit(&"foo", &()).unwrap());
    assert!(log.is_empty());
}

#[test]
fn test_remove_all_during_dispatch() {
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());

    let weak = Arc::downgrade(&emitter);
    emitter
        .on(
            "foo",
            Listener::infallible(move |_, _: &()| {
                if let Some(emitter) = weak.upgrade() {
                    emitter.remove_all_listeners(None);
                }
            }),
        )
        .on("foo", log.recorder("second"));

    emitter.emit(&"foo", &()).unwrap();
    assert_eq!(log.labels(), vec!["second"]);
    assert!(emitter.event_names().is_empty());
    assert!(!emitter.emit(&"foo", &()).unwrap());
}

#[test]
fn test_emit_other_event_from_listener() {
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());

    let weak = Arc::downgrade(&emitter);
    emitter
        .on(
            "start",
            Listener::new(move |_, _: &()| {
                if let Some(emitter) = weak.upgrade() {
                    emitter.emit(&"end", &())?;
                }
                Ok(())
            }),
        )
        .on("end", log.recorder("end"));

    emitter.emit(&"start", &()).unwrap();
    assert_eq!(log.labels(), vec!["end"]);
}

#[test]
fn test_nested_error_propagates_to_outer_emit() {
    let log: CallLog<()> = CallLog::new();
    let emitter = Arc::new(Emitter::new());

    let weak = Arc::downgrade(&emitter);
    emitter
        .on(
            "outer",
            Listener::new(move |_, _: &()| {
                if let Some(emitter) = weak.upgrade() {
                    emitter.emit(&"inner", &())?;
                }
                Ok(())
            }),
        )
        .on("outer", log.recorder("after"))
        .on("inner", herald_test::failing_listener("inner failed"));

    let err = emitter.emit(&"outer", &()).unwrap_err();
    assert_eq!(err.to_string(), "inner failed");
    assert!(log.is_empty());
}

/// Context whose drop registers a listener on the emitter it was bound to.
struct Reentrant {
    emitter: Weak<Emitter>,
    dropped: Arc<AtomicUsize>,
}

impl PartialEq for Reentrant {
    fn eq(&self, _: &Self) -> bool {
        true
    }
}

impl Drop for Reentrant {
    fn drop(&mut self) {
        self.dropped.fetch_add(1, Ordering::SeqCst);
        if let Some(emitter) = self.emitter.upgrade() {
            emitter.on("after-drop", noop_listener());
        }
    }
}

#[test]
fn test_drop_of_removed_listener_can_reenter() {
    let emitter = Arc::new(Emitter::new());
    let dropped = Arc::new(AtomicUsize::new(0));

    let owner = Reentrant {
        emitter: Arc::downgrade(&emitter),
        dropped: Arc::clone(&dropped),
    };
    let listener: Listener<()> = Listener::infallible(move |_, _| {
        let _owner = &owner;
    });
    emitter.on("foo", listener);

    // Dropping the last handle runs `Reentrant::drop`, which locks the
    // registry again.
    emitter.remove_all_listeners(Some(&"foo"));

    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    assert_eq!(emitter.listener_count(&"after-drop"), 1);
}

#[test]
fn test_drop_of_fired_once_listener_can_reenter() {
    let emitter = Arc::new(Emitter::new());
    let dropped = Arc::new(AtomicUsize::new(0));

    let owner = Reentrant {
        emitter: Arc::downgrade(&emitter),
        dropped: Arc::clone(&dropped),
    };
    emitter.once(
        "foo",
        Listener::infallible(move |_, _: &()| {
            let _owner = &owner;
        }),
    );

    emitter.emit(&"foo", &()).unwrap();

    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    assert_eq!(emitter.listener_count(&"after-drop"), 1);
}

#[test]
fn test_removed_context_is_dropped() {
    let emitter: EventEmitter<&'static str, (), Reentrant> = EventEmitter::new();
    let dropped = Arc::new(AtomicUsize::new(0));
    let witness: Arc<Emitter> = Arc::new(Emitter::new());

    let listener: Listener<(), Reentrant> = noop_listener();
    emitter.on_with(
        "foo",
        listener.clone(),
        Reentrant {
            emitter: Arc::downgrade(&witness),
            dropped: Arc::clone(&dropped),
        },
    );

    emitter.off(&"foo", &listener);

    assert_eq!(dropped.load(Ordering::SeqCst), 1);
    assert_eq!(witness.listener_count(&"after-drop"), 1);
}

/// Context whose equality check inspects the emitter it is bound to.
struct Inspecting {
    name: &'static str,
    emitter: Weak<EventEmitter<&'static str, (), Inspecting>>,
    seen_counts: Arc<Mutex<Vec<usize>>>,
}

impl PartialEq for Inspecting {
    fn eq(&self, other: &Self) -> bool {
        if let Some(emitter) = self.emitter.upgrade() {
            let count = emitter.listener_count(&"foo");
            self.seen_counts.lock().unwrap().push(count);
        }
        self.name == other.name
    }
}

#[test]
fn test_context_equality_can_reenter_during_removal() {
    let emitter: Arc<EventEmitter<&'static str, (), Inspecting>> = Arc::new(EventEmitter::new());
    let seen_counts = Arc::new(Mutex::new(Vec::new()));
    let context = |name| Inspecting {
        name,
        emitter: Arc::downgrade(&emitter),
        seen_counts: Arc::clone(&seen_counts),
    };
    let listener: Listener<(), Inspecting> = noop_listener();
    emitter
        .on_with("foo", listener.clone(), context("a"))
        .on_with("foo", listener.clone(), context("b"));

    let target = context("a");
    emitter.off(&"foo", ListenerFilter::listener(&listener).with_context(&target));

    assert_eq!(emitter.listener_count(&"foo"), 1);
    assert_eq!(*seen_counts.lock().unwrap(), vec![2, 2]);
}
