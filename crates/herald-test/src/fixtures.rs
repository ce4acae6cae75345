//! Test fixtures for common types.

use herald_events::{EventKey, Symbol};

/// Context record bound to listeners in tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestContext {
    /// Arbitrary value distinguishing contexts.
    pub value: String,
}

/// Create a test context holding `value`.
#[must_use]
pub fn test_context(value: impl Into<String>) -> TestContext {
    TestContext {
        value: value.into(),
    }
}

/// Create a fresh symbol key.
#[must_use]
pub fn test_symbol_key(description: &'static str) -> EventKey {
    EventKey::Symbol(Symbol::new(description))
}

/// Create a named key.
#[must_use]
pub fn test_named_key(name: &'static str) -> EventKey {
    EventKey::from(name)
}
