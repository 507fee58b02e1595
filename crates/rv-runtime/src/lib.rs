#![forbid(unsafe_code)]

//! Component runtime and bindings for rv.
//!
//! - [`host`]: mounts a [`Component`], renders it, commits effects, and
//!   re-renders on store changes.
//! - [`hooks`]: per-instance hook slots ([`RenderCx::use_ref`],
//!   [`RenderCx::use_effect`], [`RenderCx::use_sync_external_store`]).
//! - [`store`]: the external-store contract, implemented for
//!   [`rv_core::Rv`].
//! - [`bind`]: [`bind_value`] and [`bind_effect`].
//!
//! # Invariants
//!
//! 1. A binding holds at most one subscription per component instance.
//! 2. Unmounting releases every subscription the instance made.
//! 3. Changing the bound cell releases the old subscription before the new
//!    one is made.
//! 4. Effects and subscriptions never run during render or on the server.

pub mod bind;
pub mod hooks;
pub mod host;
pub mod store;

pub use bind::{bind_effect, bind_value};
pub use hooks::{Cleanup, RenderCx};
pub use host::{Component, Host, HostConfig, HostError, RenderMode};
pub use store::{ExternalStore, OnChange, StoreSubscription};
