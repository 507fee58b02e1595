#![forbid(unsafe_code)]

//! rv public facade crate.
//!
//! ```
//! use rv::prelude::*;
//!
//! let counter = Rv::from_fn(|| 1);
//! let source = counter.clone();
//! let mut host = Host::mount(move |cx: &mut RenderCx<'_>| bind_value(cx, &source) * 10);
//!
//! counter.set(4);
//! host.flush().ok();
//! assert_eq!(*host.output(), 40);
//! ```

pub use rv_core::eq;
pub use rv_core::{Listener, Rv, RvOptions, SetOptions, Unsubscribe};

#[cfg(feature = "runtime")]
pub use rv_runtime as runtime;

pub mod prelude {
    pub use rv_core::{Listener, Rv, RvOptions, SetOptions, Unsubscribe, eq};

    #[cfg(feature = "runtime")]
    pub use rv_runtime::{Component, Host, HostConfig, RenderCx, bind_effect, bind_value};
}
