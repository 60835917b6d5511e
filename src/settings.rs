use std::fmt::{Debug, Formatter, Result};
use std::thread::Builder;

/* ---------- */

/// Used to configure the properties of a worker's thread.
///
/// The pool derives one per worker, naming the thread after the pool and the
/// worker's role and index so the workers show up readable in `ps`/`top`.
pub(crate) struct Settings(Builder);

impl Settings {
    /// Returns the base [`Settings`] with default parameters.
    #[inline]
    pub(crate) fn new() -> Self {
        Self(Builder::new())
    }

    /// Sets the thread's name.
    ///
    /// The name must not contain null bytes (`\0`).
    #[inline]
    pub(crate) fn name<T: ToString>(self, name: T) -> Self {
        Self(self.0.name(name.to_string()))
    }

    /// Sets the thread's stack size.
    ///
    /// The actual stack size may be greater than this value if the platform specifies a minimal stack size.
    #[inline]
    pub(crate) fn stack_size(self, size: usize) -> Self {
        Self(self.0.stack_size(size))
    }

    /// Returns the inner [`std::thread::Builder`].
    #[inline]
    pub(crate) fn into_inner(self) -> Builder {
        self.0
    }
}

impl Default for Settings {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl Debug for Settings {
    #[inline]
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        write!(f, "{:?}", self.0)
    }
}
