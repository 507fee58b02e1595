#![forbid(unsafe_code)]

//! Reactive variables.
//!
//! - [`Rv`]: a shared value with equality-checked writes and change
//!   notification.
//! - [`Listener`]: an identity-compared `(new, old)` callback.
//! - [`Unsubscribe`]: removes the listener it was returned for.
//! - [`RvOptions`] / [`SetOptions`]: default and per-write comparators.
//!
//! # Architecture
//!
//! `Rv<T>` uses `Rc` + `RefCell` for single-threaded shared ownership.
//! Listeners live in an insertion-ordered set keyed by identity, so adding a
//! listener twice is a no-op and removal is O(1) amortized.
//!
//! # Invariants
//!
//! 1. A write the comparator reports as equal leaves the value untouched and
//!    notifies nobody.
//! 2. An accepted write notifies every listener registered when it was
//!    accepted, synchronously and in subscription order.
//! 3. A per-write comparator applies to that write only.
//! 4. After [`Rv::off`] or [`Unsubscribe::unsubscribe`] the listener is never
//!    invoked by a later write.

pub mod eq;
mod listener;
mod options;
mod rv;

pub use eq::EqFn;
pub use listener::Listener;
pub use options::{RvOptions, SetOptions};
pub use rv::{Rv, RvId, Unsubscribe};
