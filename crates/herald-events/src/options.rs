//! Emitter tuning knobs.

/// Options applied when constructing an emitter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmitterOptions {
    /// Listener count per key above which a possible leak is logged once.
    /// Zero disables the warning.
    pub max_listeners: usize,
}

impl EmitterOptions {
    /// Set the per-key listener warning threshold.
    #[must_use]
    pub fn with_max_listeners(mut self, max_listeners: usize) -> Self {
        self.max_listeners = max_listeners;
        self
    }

    /// Whether `count` listeners on one key exceeds the threshold.
    #[must_use]
    pub fn exceeds_limit(&self, count: usize) -> bool {
        self.max_listeners > 0 && count > self.max_listeners
    }
}

#[cfg(feature = "config")]
impl From<&herald_config::EmitterSection> for EmitterOptions {
    fn from(section: &herald_config::EmitterSection) -> Self {
        Self {
            max_listeners: section.max_listeners,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unlimited() {
        let options = EmitterOptions::default();
        assert_eq!(options.max_listeners, 0);
        assert!(!options.exceeds_limit(usize::MAX));
    }

    #[test]
    fn test_limit() {
        let options = EmitterOptions::default().with_max_listeners(2);
        assert!(!options.exceeds_limit(2));
        assert!(options.exceeds_limit(3));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_config_section() {
        let section = herald_config::EmitterSection { max_listeners: 25 };
        assert_eq!(EmitterOptions::from(&section).max_listeners, 25);
    }
}
