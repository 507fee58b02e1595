#![forbid(unsafe_code)]

//! Bindings between reactive variables and components.
//!
//! - [`bind_value`]: read an [`Rv`] and re-render when it changes.
//! - [`bind_effect`]: run a callback when an [`Rv`] changes, without
//!   re-rendering.
//!
//! Both are thin: change detection is entirely the cell's comparator. A
//! write the cell rejects notifies nobody, so it neither re-renders nor
//! reaches an effect callback.

use std::cell::RefCell;
use std::rc::Rc;

use rv_core::Rv;

use crate::hooks::{Cleanup, RenderCx};

type Callback<T> = Rc<dyn Fn(&T, &T)>;

/// Current value of `rv`; the component re-renders after each accepted
/// write.
///
/// The subscription is made once, on the first commit, and replaced only if
/// a different cell is passed.
pub fn bind_value<T>(cx: &mut RenderCx<'_>, rv: &Rv<T>) -> T
where
    T: Clone + PartialEq + 'static,
{
    cx.use_sync_external_store(rv)
}

/// Call `callback(new, old)` after each accepted write to `rv` while the
/// component is mounted.
///
/// The subscription is made once per cell. `callback` is swapped in on every
/// render, so it always sees the latest render's captures without
/// re-subscribing.
pub fn bind_effect<T, F>(cx: &mut RenderCx<'_>, rv: &Rv<T>, callback: F)
where
    T: 'static,
    F: Fn(&T, &T) + 'static,
{
    let latest = cx.use_ref(|| None::<Callback<T>>);
    let callback: Callback<T> = Rc::new(callback);
    *latest.borrow_mut() = Some(callback);

    let target = rv.clone();
    cx.use_effect(rv.id(), move || {
        let unsubscribe = target.subscribe(move |new, old| call_latest(&latest, new, old));
        Some(Box::new(move || {
            unsubscribe.unsubscribe();
        }) as Cleanup)
    });
}

fn call_latest<T>(latest: &RefCell<Option<Callback<T>>>, new: &T, old: &T) {
    // Release the borrow before calling out.
    let callback = latest.borrow().clone();
    if let Some(callback) = callback {
        callback(new, old);
    }
}
