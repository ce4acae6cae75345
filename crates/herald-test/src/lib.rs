//! Herald Test - Shared test utilities for the Herald emitter.
//!
//! This crate provides recording listeners and fixtures that integration
//! tests across the workspace use as a dev-dependency.
//!
//! # Usage
//!
//! ```rust
//! use herald_events::EventEmitter;
//! use herald_test::CallLog;
//!
//! let log: CallLog<u32> = CallLog::new();
//! let emitter: EventEmitter<&str, u32> = EventEmitter::new();
//! emitter.on("tick", log.recorder("first")).on("tick", log.recorder("second"));
//!
//! emitter.emit(&"tick", &7).unwrap();
//! assert_eq!(log.labels(), vec!["first", "second"]);
//! assert_eq!(log.last("second"), Some(7));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;

/// Install a test-friendly tracing subscriber once per process.
///
/// Honors `RUST_LOG`, defaulting to `herald_events=trace`. Output goes through
/// the test harness capture.
pub fn init_test_logging() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("herald_events=trace"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}
