//! Event keys.
//!
//! The emitter accepts any hashable key type. [`EventKey`] is the one most
//! callers want: either a plain name or a [`Symbol`], an opaque token that is
//! only equal to itself.

use std::borrow::Cow;
use std::fmt;
use std::hash::{Hash, Hasher};

use uuid::Uuid;

/// Unique opaque event token.
///
/// Two symbols created with the same description are still distinct keys.
/// Clones compare equal to their original.
#[derive(Clone)]
pub struct Symbol {
    id: Uuid,
    description: Option<Cow<'static, str>>,
}

impl Symbol {
    /// Create a new unique symbol with a description used for logging.
    #[must_use]
    pub fn new(description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            id: Uuid::new_v4(),
            description: Some(description.into()),
        }
    }

    /// Create a new unique symbol without a description.
    #[must_use]
    pub fn anonymous() -> Self {
        Self {
            id: Uuid::new_v4(),
            description: None,
        }
    }

    /// Description given at creation, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description().unwrap_or(""))
    }
}

/// Key identifying an event.
#[derive(Clone, PartialEq, Eq, Hash)]
pub enum EventKey {
    /// Named event, compared by value.
    Name(Cow<'static, str>),
    /// Symbol event, compared by identity.
    Symbol(Symbol),
}

impl EventKey {
    /// Shorthand for a fresh symbol key.
    #[must_use]
    pub fn symbol(description: impl Into<Cow<'static, str>>) -> Self {
        Self::Symbol(Symbol::new(description))
    }

    /// The name, when this is a named key.
    #[must_use]
    pub fn as_name(&self) -> Option<&str> {
        match self {
            Self::Name(name) => Some(name.as_ref()),
            Self::Symbol(_) => None,
        }
    }
}

impl fmt::Debug for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => write!(f, "{name:?}"),
            Self::Symbol(symbol) => symbol.fmt(f),
        }
    }
}

impl fmt::Display for EventKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Name(name) => f.write_str(name),
            Self::Symbol(symbol) => write!(f, "Symbol({})", symbol.description().unwrap_or("")),
        }
    }
}

impl From<&'static str> for EventKey {
    fn from(name: &'static str) -> Self {
        Self::Name(Cow::Borrowed(name))
    }
}

impl From<String> for EventKey {
    fn from(name: String) -> Self {
        Self::Name(Cow::Owned(name))
    }
}

impl From<Symbol> for EventKey {
    fn from(symbol: Symbol) -> Self {
        Self::Symbol(symbol)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_compare_by_value() {
        let borrowed = EventKey::from("data");
        let owned = EventKey::from(String::from("data"));
        assert_eq!(borrowed, owned);
        assert_eq!(borrowed.as_name(), Some("data"));
    }

    #[test]
    fn test_symbols_compare_by_identity() {
        let a = Symbol::new("evt1");
        let b = Symbol::new("evt1");
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_ne!(EventKey::from(a.clone()), EventKey::from(b));
        assert_ne!(EventKey::from(a), EventKey::from("evt1"));
    }

    #[test]
    fn test_display() {
        assert_eq!(EventKey::from("end").to_string(), "end");
        assert_eq!(EventKey::symbol("evt1").to_string(), "Symbol(evt1)");
        assert_eq!(format!("{:?}", Symbol::anonymous()), "Symbol()");
    }
}
