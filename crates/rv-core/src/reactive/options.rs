#![forbid(unsafe_code)]

//! Construction and per-write options.

use std::fmt;
use std::rc::Rc;

use super::eq::{self, EqFn};
use super::listener::Listener;

/// Options applied when a cell is created.
pub struct RvOptions<T> {
    pub(crate) eq: Option<EqFn<T>>,
    pub(crate) listener: Option<Listener<T>>,
}

impl<T> Default for RvOptions<T> {
    fn default() -> Self {
        Self {
            eq: None,
            listener: None,
        }
    }
}

impl<T: 'static> RvOptions<T> {
    /// No comparator override and no initial listener.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default comparator for every write that does not override it.
    #[must_use]
    pub fn with_eq(mut self, eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        let eq: EqFn<T> = Rc::new(eq);
        self.eq = Some(eq);
        self
    }

    /// Share an existing comparator between cells.
    #[must_use]
    pub fn with_shared_eq(mut self, eq: EqFn<T>) -> Self {
        self.eq = Some(eq);
        self
    }

    /// Listener registered before the cell is handed out.
    #[must_use]
    pub fn with_listener(mut self, listener: Listener<T>) -> Self {
        self.listener = Some(listener);
        self
    }
}

impl<T> fmt::Debug for RvOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RvOptions")
            .field("eq", &self.eq.is_some())
            .field("listener", &self.listener)
            .finish()
    }
}

/// Options for one call to [`Rv::set_with`](super::Rv::set_with).
pub struct SetOptions<T> {
    pub(crate) eq: Option<EqFn<T>>,
}

impl<T> Default for SetOptions<T> {
    fn default() -> Self {
        Self { eq: None }
    }
}

impl<T: 'static> SetOptions<T> {
    /// Use the cell's default comparator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare with `eq` for this write only.
    #[must_use]
    pub fn with_eq(mut self, eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        let eq: EqFn<T> = Rc::new(eq);
        self.eq = Some(eq);
        self
    }

    /// Compare with a shared comparator for this write only.
    #[must_use]
    pub fn with_shared_eq(mut self, eq: EqFn<T>) -> Self {
        self.eq = Some(eq);
        self
    }
}

impl<T: PartialEq + 'static> SetOptions<T> {
    /// Bypass the cell's default comparator for this write and fall back to
    /// strict equality.
    #[must_use]
    pub fn strict() -> Self {
        Self::new().with_eq(eq::strict::<T>)
    }
}

impl<T> fmt::Debug for SetOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetOptions")
            .field("eq", &self.eq.is_some())
            .finish()
    }
}
