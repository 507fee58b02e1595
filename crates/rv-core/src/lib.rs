#![forbid(unsafe_code)]

//! Core reactive primitive for rv.
//!
//! ```
//! use rv_core::{Rv, RvOptions, SetOptions};
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! // Writes that keep the parity are treated as no-ops.
//! let counter = Rv::with_options(0, RvOptions::new().with_eq(|old: &i32, new: &i32| old % 2 == new % 2));
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let sink = Rc::clone(&seen);
//! let unsubscribe = counter.subscribe(move |new, old| sink.borrow_mut().push((*new, *old)));
//!
//! assert_eq!(counter.set(2), 0);
//! assert_eq!(counter.set(3), 3);
//! // Skip the parity rule for one write.
//! assert_eq!(counter.set_with(5, SetOptions::strict()), 5);
//!
//! unsubscribe.unsubscribe();
//! counter.set(6);
//!
//! assert_eq!(*seen.borrow(), vec![(3, 0), (5, 3)]);
//! ```

pub mod reactive;

pub use reactive::{EqFn, Listener, Rv, RvId, RvOptions, SetOptions, Unsubscribe, eq};
