#![forbid(unsafe_code)]

//! Ready-made comparators.
//!
//! A comparator receives `(old, new)` and returns `true` when the write
//! should be treated as a no-op.

use std::rc::Rc;

/// Shared comparator used as a cell default or a per-write override.
pub type EqFn<T> = Rc<dyn Fn(&T, &T) -> bool>;

/// Strict equality. This is what a cell uses when no comparator is given.
#[inline]
pub fn strict<T: PartialEq>(old: &T, new: &T) -> bool {
    old == new
}

/// Never equal: every write is accepted and notifies.
#[inline]
pub fn never<T>(_old: &T, _new: &T) -> bool {
    false
}

/// Compare a projection of the value instead of the whole value.
///
/// ```
/// use rv_core::{eq, Rv, RvOptions};
///
/// let parity = Rv::with_options(2, RvOptions::new().with_eq(eq::by_key(|v: &i32| v % 2)));
/// assert_eq!(parity.set(4), 2);
/// assert_eq!(parity.set(3), 3);
/// ```
pub fn by_key<T, K, F>(key: F) -> impl Fn(&T, &T) -> bool
where
    K: PartialEq,
    F: Fn(&T) -> K,
{
    move |old: &T, new: &T| key(old) == key(new)
}

/// Pointer identity for shared handles, skipping any structural compare.
#[inline]
pub fn ptr<U: ?Sized>(old: &Rc<U>, new: &Rc<U>) -> bool {
    Rc::ptr_eq(old, new)
}
