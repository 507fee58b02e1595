#![forbid(unsafe_code)]

//! Per-instance hook slots and the render context.
//!
//! Every mounted component owns an ordered list of slots. During a render,
//! each hook call claims the next slot, so a hook finds the state it stored
//! on the previous render as long as hooks are called in the same order.
//!
//! # Render / commit
//!
//! ```text
//! render()                      commit
//! ┌──────────────────────────┐  ┌──────────────────────────────┐
//! │ use_ref        slot 0    │  │ cleanups of changed effects  │
//! │ use_effect     slot 1 ───┼─►│ setups of changed effects    │
//! │ use_sync_...   slot 2 ───┼─►│ (store subscribe is a setup) │
//! └──────────────────────────┘  └──────────────────────────────┘
//! ```
//!
//! Effects never run during render. They are queued when their deps differ
//! from the previous render and run once the render has returned.
//!
//! # Failure Modes
//!
//! - **Hook order changes** (a hook called conditionally): the slot that no
//!   longer matches is released and re-initialised, and a warning is logged.
//!   State held in that slot is lost.

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::{trace, warn};

use crate::host::RenderMode;
use crate::store::{ExternalStore, OnChange};

/// Teardown returned by an effect setup.
pub type Cleanup = Box<dyn FnOnce()>;

type Slot = Box<dyn Any>;

/// Shared dirty flag. Store notifications set it; the host clears it at the
/// start of each render.
#[derive(Debug, Clone, Default)]
pub(crate) struct Invalidator {
    dirty: Rc<Cell<bool>>,
}

impl Invalidator {
    pub(crate) fn invalidate(&self) {
        if !self.dirty.replace(true) {
            trace!("component invalidated");
        }
    }

    pub(crate) fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn clear(&self) {
        self.dirty.set(false);
    }
}

/// Storage behind [`RenderCx::use_effect`].
#[derive(Default)]
pub(crate) struct EffectSlot {
    deps: Option<Box<dyn Any>>,
    cleanup: Option<Cleanup>,
}

impl EffectSlot {
    pub(crate) fn set_cleanup(&mut self, cleanup: Option<Cleanup>) {
        self.cleanup = cleanup;
    }

    pub(crate) fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// An effect whose deps changed during the last render.
pub(crate) struct PendingEffect {
    pub(crate) slot: usize,
    pub(crate) setup: Box<dyn FnOnce() -> Option<Cleanup>>,
}

/// Hook slots owned by one component instance.
#[derive(Default)]
pub(crate) struct HookSlots {
    slots: Vec<Slot>,
}

impl HookSlots {
    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }

    pub(crate) fn effect_mut(&mut self, index: usize) -> Option<&mut EffectSlot> {
        self.slots.get_mut(index)?.downcast_mut::<EffectSlot>()
    }

    /// Drop every slot from `len` onwards, running effect cleanups in
    /// declaration order.
    pub(crate) fn release_from(&mut self, len: usize) {
        if len >= self.slots.len() {
            return;
        }
        for mut slot in self.slots.drain(len..) {
            release(&mut slot);
        }
    }
}

fn release(slot: &mut Slot) {
    if let Some(effect) = slot.downcast_mut::<EffectSlot>() {
        effect.run_cleanup();
    }
}

/// Context handed to [`Component::render`](crate::host::Component::render).
pub struct RenderCx<'a> {
    slots: &'a mut HookSlots,
    cursor: usize,
    invalidator: &'a Invalidator,
    mode: RenderMode,
    pending: Vec<PendingEffect>,
}

impl<'a> RenderCx<'a> {
    pub(crate) fn new(
        slots: &'a mut HookSlots,
        invalidator: &'a Invalidator,
        mode: RenderMode,
    ) -> Self {
        Self {
            slots,
            cursor: 0,
            invalidator,
            mode,
            pending: Vec::new(),
        }
    }

    /// Whether this render runs on the client or the server.
    #[must_use]
    pub fn render_mode(&self) -> RenderMode {
        self.mode
    }

    /// A mutable holder that survives re-renders. `init` runs on the first
    /// render only.
    pub fn use_ref<V: 'static>(&mut self, init: impl FnOnce() -> V) -> Rc<RefCell<V>> {
        let holder = self.claim("use_ref", || Rc::new(RefCell::new(init())));
        Rc::clone(holder)
    }

    /// Run `setup` after this render commits if `deps` differ from the
    /// previous render's (always on the first render). The cleanup `setup`
    /// returns runs before the next setup and when the component unmounts.
    ///
    /// Server renders never run effects.
    pub fn use_effect<D, F>(&mut self, deps: D, setup: F)
    where
        D: PartialEq + 'static,
        F: FnOnce() -> Option<Cleanup> + 'static,
    {
        let index = self.cursor;
        let run = self.mode == RenderMode::Client;
        let slot = self.claim("use_effect", EffectSlot::default);
        let changed = match slot.deps.as_ref().and_then(|prev| prev.downcast_ref::<D>()) {
            Some(prev) => *prev != deps,
            None => true,
        };
        if !changed {
            return;
        }
        slot.deps = Some(Box::new(deps));
        if run {
            self.pending.push(PendingEffect {
                slot: index,
                setup: Box::new(setup),
            });
        }
    }

    /// Read `store` and re-render this component whenever it reports a
    /// change.
    ///
    /// The subscription is made when the render commits and replaced when
    /// the store's key changes. Server renders read
    /// [`ExternalStore::server_snapshot`] and never subscribe.
    pub fn use_sync_external_store<S: ExternalStore>(&mut self, store: &S) -> S::Snapshot {
        if self.mode == RenderMode::Server {
            return store.server_snapshot();
        }

        let snapshot = store.snapshot();
        let rendered = snapshot.clone();
        let store_for_commit = store.clone();
        let invalidator = self.invalidator.clone();
        self.use_effect(store.key(), move || {
            let on_change: OnChange = {
                let invalidator = invalidator.clone();
                Rc::new(move || invalidator.invalidate())
            };
            let subscription = store_for_commit.subscribe(on_change);
            // A change between render and commit would otherwise be missed.
            if store_for_commit.snapshot() != rendered {
                invalidator.invalidate();
            }
            Some(Box::new(move || drop(subscription)) as Cleanup)
        });
        snapshot
    }

    /// Claim the next slot, (re)initialising it if it does not hold `S`.
    fn claim<S: 'static>(&mut self, hook: &'static str, init: impl FnOnce() -> S) -> &mut S {
        let index = self.cursor;
        self.cursor += 1;

        let slots = &mut self.slots.slots;
        if index == slots.len() {
            slots.push(Box::new(init()));
        } else if !slots[index].is::<S>() {
            warn!(index, hook, "hook order changed between renders, resetting slot");
            release(&mut slots[index]);
            slots[index] = Box::new(init());
        }
        match slots[index].downcast_mut::<S>() {
            Some(slot) => slot,
            None => unreachable!("hook slot {index} was just initialised for {hook}"),
        }
    }

    /// Number of hooks called and the effects to commit.
    pub(crate) fn finish(self) -> (usize, Vec<PendingEffect>) {
        (self.cursor, self.pending)
    }
}

impl fmt::Debug for RenderCx<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderCx")
            .field("mode", &self.mode)
            .field("cursor", &self.cursor)
            .field("slots", &self.slots.len())
            .field("pending_effects", &self.pending.len())
            .finish()
    }
}
