//! Herald Events - In-process synchronous event emitter.
//!
//! This crate provides:
//! - A listener registry keyed by event, with `once` registrations
//! - Synchronous, reentrancy-safe dispatch
//! - Context binding and structural removal filters
//! - Typed topics binding each key to its payload type
//!
//! # Dispatch
//!
//! [`EventEmitter::emit`] invokes listeners on the caller's thread, in
//! registration order, from a snapshot of the key's listeners taken before the
//! first one runs. Listeners may register, remove or emit re-entrantly; those
//! changes affect later emissions only.
//!
//! # Example
//!
//! ```rust
//! use herald_events::{EventEmitter, Listener, ListenerFilter};
//!
//! #[derive(Debug, PartialEq)]
//! struct Fetcher {
//!     name: &'static str,
//! }
//!
//! let emitter: EventEmitter<&str, u64, Fetcher> = EventEmitter::new();
//! let on_request = Listener::new(|fetcher: Option<&Fetcher>, query: &u64| {
//!     println!("{} handling {query}", fetcher.map_or("?", |f| f.name));
//!     Ok(())
//! });
//!
//! emitter.on_with("request", on_request.clone(), Fetcher { name: "primary" });
//! assert!(emitter.emit(&"request", &42).unwrap());
//!
//! emitter.off(
//!     &"request",
//!     ListenerFilter::listener(&on_request).with_context(&Fetcher { name: "primary" }),
//! );
//! assert_eq!(emitter.listener_count(&"request"), 0);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

mod emitter;
mod error;
mod key;
mod listener;
mod options;
mod typed;

pub use emitter::EventEmitter;
pub use error::{EmitterError, EmitterResult};
pub use key::{EventKey, Symbol};
pub use listener::{Listener, ListenerFilter};
pub use options::EmitterOptions;
pub use typed::{Topic, TypedEmitter};
