//! Ordered "first present value wins" chain.
//!
//! ```
//! use quote_orchestrator::fallback::Fallback;
//!
//! let price = Fallback::new()
//!     .or("summary", None)
//!     .or("info", Some(101.5))
//!     .or_else("history", || Some(99.0))
//!     .resolve();
//! assert_eq!(price, Some(101.5));
//! ```

#[derive(Debug, Clone)]
pub struct Fallback<T> {
    resolved: Option<(T, &'static str)>,
}

impl<T> Default for Fallback<T> {
    fn default() -> Self {
        Self { resolved: None }
    }
}

impl<T> Fallback<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Try `value` from `source` if nothing earlier in the chain matched.
    pub fn or(self, source: &'static str, value: Option<T>) -> Self {
        self.or_else(source, || value)
    }

    /// Like [`Fallback::or`], but `f` only runs when the chain is still unresolved.
    pub fn or_else<F>(mut self, source: &'static str, f: F) -> Self
    where
        F: FnOnce() -> Option<T>,
    {
        if self.resolved.is_none() {
            self.resolved = f().map(|v| (v, source));
        }
        self
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved.is_some()
    }

    /// Name of the source that supplied the value.
    pub fn source(&self) -> Option<&'static str> {
        self.resolved.as_ref().map(|(_, s)| *s)
    }

    pub fn resolve(self) -> Option<T> {
        self.resolved.map(|(v, _)| v)
    }
}
