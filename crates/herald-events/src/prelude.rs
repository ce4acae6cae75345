//! Prelude module - commonly used types for convenient import.
//!
//! Use `use herald_events::prelude::*;` to import all essential types.

// Emitters
pub use crate::{EventEmitter, TypedEmitter};

// Keys and topics
pub use crate::{EventKey, Symbol, Topic};

// Listeners
pub use crate::{Listener, ListenerFilter};

// Options and errors
pub use crate::{EmitterError, EmitterOptions, EmitterResult};
