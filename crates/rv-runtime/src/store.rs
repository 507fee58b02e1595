#![forbid(unsafe_code)]

//! External-store contract.
//!
//! A component reads shared state that lives outside the host through three
//! operations: subscribe to changes, read a snapshot on the client, read a
//! snapshot during a server render. [`RenderCx::use_sync_external_store`]
//! drives them; [`Rv`] implements the contract directly with
//! [`Rv::subscribe`] and [`Rv::get`].
//!
//! [`RenderCx::use_sync_external_store`]: crate::hooks::RenderCx::use_sync_external_store

use std::fmt;
use std::rc::Rc;

use rv_core::{Rv, RvId};

/// Change callback handed to [`ExternalStore::subscribe`].
pub type OnChange = Rc<dyn Fn()>;

/// Shared state a component can bind to.
pub trait ExternalStore: Clone + 'static {
    /// Value a render reads.
    type Snapshot: Clone + PartialEq + 'static;
    /// Store identity. A changed key tears down the old subscription and
    /// subscribes to the new store.
    type Key: PartialEq + 'static;

    /// Identity of this store.
    fn key(&self) -> Self::Key;

    /// Call `on_change` after every change until the returned guard drops.
    fn subscribe(&self, on_change: OnChange) -> StoreSubscription;

    /// Current value.
    fn snapshot(&self) -> Self::Snapshot;

    /// Value used by server renders. Defaults to [`snapshot`](Self::snapshot).
    fn server_snapshot(&self) -> Self::Snapshot {
        self.snapshot()
    }
}

impl<T: Clone + PartialEq + 'static> ExternalStore for Rv<T> {
    type Snapshot = T;
    type Key = RvId;

    fn key(&self) -> RvId {
        self.id()
    }

    fn subscribe(&self, on_change: OnChange) -> StoreSubscription {
        let unsubscribe = Rv::subscribe(self, move |_, _| on_change());
        StoreSubscription::new(move || {
            unsubscribe.unsubscribe();
        })
    }

    fn snapshot(&self) -> T {
        self.get()
    }
}

/// RAII guard for a store subscription.
///
/// Dropping the guard (or calling [`unsubscribe`](Self::unsubscribe)) runs
/// the release callback exactly once.
pub struct StoreSubscription {
    release: Option<Box<dyn FnOnce()>>,
}

impl StoreSubscription {
    /// Guard that runs `release` when dropped.
    pub fn new(release: impl FnOnce() + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Release now instead of at drop.
    pub fn unsubscribe(mut self) {
        self.release_now();
    }

    fn release_now(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for StoreSubscription {
    fn drop(&mut self) {
        self.release_now();
    }
}

impl fmt::Debug for StoreSubscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreSubscription")
            .field("active", &self.release.is_some())
            .finish()
    }
}
