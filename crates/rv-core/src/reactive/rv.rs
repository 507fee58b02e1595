#![forbid(unsafe_code)]

//! Reactive variable: a shared value with equality-checked writes.
//!
//! # Design
//!
//! [`Rv<T>`] wraps a value of type `T` in shared, reference-counted storage
//! (`Rc<..>` with `RefCell` interior). A write is compared against the
//! current value with the per-call override, else the cell's default
//! comparator. Cells built without one compare with `PartialEq`; cells
//! built with [`Rv::with_eq`] need no `PartialEq` at all. Accepted writes
//! replace the value and notify every listener with `(new, old)` in
//! subscription order.
//!
//! # Performance
//!
//! | Operation     | Complexity                  |
//! |---------------|-----------------------------|
//! | `get()`       | O(1) + clone                |
//! | `set()`       | O(C + L), C = comparator, L = listeners |
//! | `on()`/`off()`| O(1) amortized              |
//! | `size()`      | O(1)                        |
//!
//! # Notification
//!
//! The listener set is snapshotted when a write is accepted and no borrow is
//! held while listeners run. Consequences:
//!
//! - A listener added during a pass first fires on the next accepted write.
//! - A listener removed during a pass still receives the in-flight pass.
//! - A listener may write to the cell. The nested write notifies
//!   synchronously before the outer pass resumes, and the outer call returns
//!   the value the cell holds once its own pass completes.
//!
//! # Failure Modes
//!
//! - **Listener panic**: propagates out of `set()`. Later listeners in that
//!   pass do not run; the value has already been replaced.
//! - **Comparator writes to the cell**: panics (the comparator runs under a
//!   shared borrow of the value).

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use rustc_hash::FxBuildHasher;
use smallvec::SmallVec;
use tracing::trace;

use super::eq::{self, EqFn};
use super::listener::{Listener, ListenerId};
use super::options::{RvOptions, SetOptions};

/// Insertion-ordered listener set keyed by listener identity.
type ListenerSet<T> = IndexMap<ListenerId, Listener<T>, FxBuildHasher>;

/// Shared interior for [`Rv<T>`].
struct RvInner<T> {
    value: RefCell<T>,
    /// Accepted writes since construction.
    version: Cell<u64>,
    /// Default comparator, resolved at construction.
    eq: EqFn<T>,
    listeners: RefCell<ListenerSet<T>>,
}

/// Identity of a cell, shared by all of its clones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RvId(usize);

/// A reactive variable.
///
/// Cloning an `Rv` creates a new handle to the **same** cell: both handles
/// see the same value and share listeners.
///
/// # Invariants
///
/// 1. The value changes only through a write the comparator does not reject.
/// 2. A listener is registered at most once.
/// 3. Every accepted write notifies synchronously, before `set()` returns.
/// 4. `version` increments by exactly 1 per accepted write.
pub struct Rv<T> {
    inner: Rc<RvInner<T>>,
}

// Manual Clone: shares the same Rc.
impl<T> Clone for Rv<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Rv<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rv")
            .field("value", &*self.inner.value.borrow())
            .field("version", &self.inner.version.get())
            .field("listeners", &self.inner.listeners.borrow().len())
            .finish()
    }
}

impl<T: PartialEq + 'static> Rv<T> {
    /// Create a cell compared with strict equality and no listeners.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self::with_options(value, RvOptions::default())
    }

    /// Create a cell with a default comparator and/or an initial listener.
    /// Without a comparator, writes are compared with `PartialEq`.
    #[must_use]
    pub fn with_options(value: T, options: RvOptions<T>) -> Self {
        let RvOptions { eq: custom, listener } = options;
        let eq: EqFn<T> = match custom {
            Some(eq) => eq,
            None => Rc::new(eq::strict::<T>),
        };
        Self::build(value, eq, listener)
    }

    /// Create a cell from an initializer, run exactly once, right now.
    #[must_use]
    pub fn from_fn(init: impl FnOnce() -> T) -> Self {
        Self::new(init())
    }

    /// [`Rv::from_fn`] with options.
    #[must_use]
    pub fn from_fn_with_options(init: impl FnOnce() -> T, options: RvOptions<T>) -> Self {
        Self::with_options(init(), options)
    }
}

impl<T: 'static> Rv<T> {
    /// Create a cell whose writes are compared with `eq`. `T` need not
    /// implement `PartialEq`.
    ///
    /// ```
    /// use rv_core::{eq, Rv};
    /// use std::rc::Rc;
    ///
    /// let handler: Rc<dyn Fn() -> u8> = Rc::new(|| 1);
    /// let rv = Rv::with_eq(Rc::clone(&handler), eq::ptr);
    /// rv.set(Rc::clone(&handler));
    /// assert_eq!(rv.version(), 0);
    /// ```
    #[must_use]
    pub fn with_eq(value: T, eq: impl Fn(&T, &T) -> bool + 'static) -> Self {
        Self::build(value, Rc::new(eq), None)
    }

    /// [`Rv::with_eq`] with the value produced by `init`.
    #[must_use]
    pub fn from_fn_with_eq(
        init: impl FnOnce() -> T,
        eq: impl Fn(&T, &T) -> bool + 'static,
    ) -> Self {
        Self::with_eq(init(), eq)
    }

    fn build(value: T, eq: EqFn<T>, listener: Option<Listener<T>>) -> Self {
        let mut listeners = ListenerSet::default();
        if let Some(listener) = listener {
            listeners.insert(listener.id(), listener);
        }
        Self {
            inner: Rc::new(RvInner {
                value: RefCell::new(value),
                version: Cell::new(0),
                eq,
                listeners: RefCell::new(listeners),
            }),
        }
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if `f` writes to this cell.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    /// Register `listener`. Registering a listener that is already present
    /// changes nothing.
    ///
    /// The returned handle removes exactly this listener. It holds the cell
    /// weakly, and dropping it does **not** unsubscribe.
    pub fn on(&self, listener: &Listener<T>) -> Unsubscribe<T> {
        self.inner
            .listeners
            .borrow_mut()
            .entry(listener.id())
            .or_insert_with(|| listener.clone());
        Unsubscribe {
            cell: Rc::downgrade(&self.inner),
            listener: listener.clone(),
        }
    }

    /// Register a fresh listener built from `callback`.
    pub fn subscribe(&self, callback: impl Fn(&T, &T) + 'static) -> Unsubscribe<T> {
        self.on(&Listener::new(callback))
    }

    /// Remove `listener` if present.
    pub fn off(&self, listener: &Listener<T>) {
        self.inner.remove(listener.id());
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn size(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Number of accepted writes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// Identity shared by every clone of this cell.
    #[must_use]
    pub fn id(&self) -> RvId {
        RvId(Rc::as_ptr(&self.inner).cast::<()>() as usize)
    }

    /// Whether two handles refer to the same cell.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        Rc::ptr_eq(&a.inner, &b.inner)
    }
}

impl<T: Clone + 'static> Rv<T> {
    /// Get a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.value.borrow().clone()
    }

    /// Write `value` using the cell's default comparator.
    ///
    /// Returns the value the cell holds afterwards: the previous value if the
    /// write was rejected as equal, otherwise the new one.
    pub fn set(&self, value: T) -> T {
        self.set_with(value, SetOptions::default())
    }

    /// Write `value`, optionally overriding the comparator for this call.
    pub fn set_with(&self, value: T, options: SetOptions<T>) -> T {
        let equal = {
            let current = self.inner.value.borrow();
            self.is_equal(&current, &value, options.eq.as_ref())
        };
        if equal {
            trace!(version = self.inner.version.get(), "rv write rejected as equal");
            return self.get();
        }

        let old = self.inner.value.replace(value.clone());
        let version = self.inner.version.get() + 1;
        self.inner.version.set(version);
        self.notify(&value, &old, version);
        self.get()
    }

    /// Compute the next value from a copy of the current one and write it.
    pub fn update(&self, f: impl FnOnce(&mut T)) -> T {
        let mut next = self.get();
        f(&mut next);
        self.set(next)
    }

    fn is_equal(&self, old: &T, new: &T, call: Option<&EqFn<T>>) -> bool {
        match call {
            Some(eq) => eq(old, new),
            None => (self.inner.eq)(old, new),
        }
    }

    /// Invoke a snapshot of the listener set outside any borrow.
    fn notify(&self, new: &T, old: &T, version: u64) {
        let listeners: SmallVec<[Listener<T>; 4]> =
            self.inner.listeners.borrow().values().cloned().collect();
        trace!(version, listeners = listeners.len(), "rv write accepted");
        for listener in &listeners {
            listener.call(new, old);
        }
    }
}

impl<T> RvInner<T> {
    fn remove(&self, id: ListenerId) -> bool {
        self.listeners.borrow_mut().shift_remove(&id).is_some()
    }
}

/// Handle returned by [`Rv::on`] that removes the listener it registered.
///
/// Calling [`unsubscribe`](Self::unsubscribe) more than once is harmless, as
/// is calling it after the cell has been dropped.
pub struct Unsubscribe<T> {
    cell: Weak<RvInner<T>>,
    listener: Listener<T>,
}

impl<T> Unsubscribe<T> {
    /// Remove the listener. Returns `true` if it was still registered.
    pub fn unsubscribe(&self) -> bool {
        match self.cell.upgrade() {
            Some(inner) => inner.remove(self.listener.id()),
            None => false,
        }
    }

    /// The listener this handle removes.
    #[must_use]
    pub fn listener(&self) -> &Listener<T> {
        &self.listener
    }
}

impl<T> fmt::Debug for Unsubscribe<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unsubscribe")
            .field("listener", &self.listener)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
