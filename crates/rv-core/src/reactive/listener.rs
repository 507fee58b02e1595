#![forbid(unsafe_code)]

//! Change listeners with identity semantics.
//!
//! A [`Listener<T>`] wraps a `(new, old)` callback in shared storage. Two
//! clones of the same listener are the same listener; two listeners built
//! from identical closures are not. Cells key their listener set on this
//! identity, which is what makes subscribing twice a no-op.

use std::fmt;
use std::rc::Rc;

type Callback<T> = dyn Fn(&T, &T);

/// Identity of a [`Listener`], derived from the address of its callback
/// allocation. Stable for as long as any clone of the listener is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct ListenerId(usize);

/// A callback invoked with `(new, old)` after every accepted write.
///
/// Cloning a `Listener` produces another handle to the **same** callback:
/// the clones compare equal and occupy a single slot in a cell's listener
/// set.
pub struct Listener<T> {
    callback: Rc<Callback<T>>,
}

impl<T: 'static> Listener<T> {
    /// Wrap a callback. Each call to `new` yields a distinct listener.
    #[must_use]
    pub fn new(callback: impl Fn(&T, &T) + 'static) -> Self {
        Self {
            callback: Rc::new(callback),
        }
    }
}

impl<T> Listener<T> {
    /// Invoke the callback directly.
    #[inline]
    pub fn call(&self, new: &T, old: &T) {
        (self.callback)(new, old);
    }

    /// Whether two handles refer to the same listener.
    #[must_use]
    pub fn ptr_eq(a: &Self, b: &Self) -> bool {
        a.id() == b.id()
    }

    pub(crate) fn id(&self) -> ListenerId {
        ListenerId(Rc::as_ptr(&self.callback).cast::<()>() as usize)
    }
}

impl<T> Clone for Listener<T> {
    fn clone(&self) -> Self {
        Self {
            callback: Rc::clone(&self.callback),
        }
    }
}

impl<T> PartialEq for Listener<T> {
    fn eq(&self, other: &Self) -> bool {
        Self::ptr_eq(self, other)
    }
}

impl<T> Eq for Listener<T> {}

impl<T> fmt::Debug for Listener<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener").field(&self.id().0).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn clones_share_identity() {
        let a = Listener::<i32>::new(|_, _| {});
        let b = a.clone();
        assert_eq!(a, b);
        assert_eq!(a.id(), b.id());
    }

    #[test]
    fn identical_closures_are_distinct() {
        let a = Listener::<i32>::new(|_, _| {});
        let b = Listener::<i32>::new(|_, _| {});
        assert_ne!(a, b);
    }

    #[test]
    fn call_passes_new_then_old() {
        let seen = Rc::new(Cell::new((0, 0)));
        let seen_clone = Rc::clone(&seen);
        let listener = Listener::new(move |new: &i32, old: &i32| seen_clone.set((*new, *old)));

        listener.call(&7, &3);
        assert_eq!(seen.get(), (7, 3));
    }
}
