#![forbid(unsafe_code)]

//! Component host: mount, render, commit, unmount.
//!
//! A [`Host`] owns one component instance and its hook slots. Rendering is
//! synchronous and single-threaded:
//!
//! 1. `mount` renders once and commits effects.
//! 2. Store notifications mark the host dirty; nothing renders yet.
//! 3. `flush` re-renders until the host is clean, bounded by
//!    [`HostConfig::max_render_passes`].
//! 4. `unmount` (or drop) runs every effect cleanup, which releases every
//!    store subscription.
//!
//! # Example
//!
//! ```
//! use rv_core::Rv;
//! use rv_runtime::{Host, bind_value};
//! use rv_runtime::hooks::RenderCx;
//!
//! let counter = Rv::new(0);
//! let source = counter.clone();
//! let mut host = Host::mount(move |cx: &mut RenderCx<'_>| format!("count: {}", bind_value(cx, &source)));
//! assert_eq!(host.output(), "count: 0");
//!
//! counter.set(1);
//! assert_eq!(host.flush(), Ok(1));
//! assert_eq!(host.output(), "count: 1");
//! ```

use std::fmt;

use tracing::{debug, debug_span};

use crate::hooks::{HookSlots, Invalidator, PendingEffect, RenderCx};

/// Where a render happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Interactive render: effects run, stores are subscribed.
    #[default]
    Client,
    /// One-shot render: server snapshots, no effects, no subscriptions.
    Server,
}

/// A unit of UI that renders from hooks.
///
/// Closures of the form `FnMut(&mut RenderCx<'_>) -> O` are components.
pub trait Component {
    /// What a render produces.
    type Output;

    /// Produce output. Hooks must be called in the same order every render.
    fn render(&mut self, cx: &mut RenderCx<'_>) -> Self::Output;
}

impl<F, O> Component for F
where
    F: FnMut(&mut RenderCx<'_>) -> O,
{
    type Output = O;

    fn render(&mut self, cx: &mut RenderCx<'_>) -> O {
        self(cx)
    }
}

/// Configuration for a [`Host`].
#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Client or server rendering.
    pub mode: RenderMode,
    /// Upper bound on renders in one `flush`. Exceeding it means a render
    /// keeps invalidating itself.
    pub max_render_passes: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::Client,
            max_render_passes: 50,
        }
    }
}

impl HostConfig {
    /// Interactive defaults.
    #[must_use]
    pub fn client() -> Self {
        Self::default()
    }

    /// Server rendering.
    #[must_use]
    pub fn server() -> Self {
        Self {
            mode: RenderMode::Server,
            ..Self::default()
        }
    }

    /// Set the render pass bound (at least 1).
    #[must_use]
    pub fn with_max_render_passes(mut self, passes: usize) -> Self {
        self.max_render_passes = passes.max(1);
        self
    }
}

/// Errors from [`Host`] operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// `flush` hit the render pass bound while the host was still dirty.
    RenderLoop {
        /// Renders performed before giving up.
        passes: usize,
    },
    /// The component has been unmounted.
    Unmounted,
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RenderLoop { passes } => {
                write!(f, "component still invalidated after {passes} render passes")
            }
            Self::Unmounted => write!(f, "component is unmounted"),
        }
    }
}

impl std::error::Error for HostError {}

/// A mounted component instance.
pub struct Host<C: Component> {
    component: C,
    slots: HookSlots,
    invalidator: Invalidator,
    config: HostConfig,
    output: C::Output,
    render_count: u64,
    mounted: bool,
}

impl<C: Component> Host<C> {
    /// Mount with [`HostConfig::default`].
    pub fn mount(component: C) -> Self {
        Self::mount_with_config(component, HostConfig::default())
    }

    /// Render `component` once and commit its effects.
    pub fn mount_with_config(mut component: C, config: HostConfig) -> Self {
        debug!(mode = ?config.mode, "mounting component");
        let mut slots = HookSlots::default();
        let invalidator = Invalidator::default();
        let (output, pending) = render(&mut component, &mut slots, &invalidator, config.mode, 1);
        let mut host = Self {
            component,
            slots,
            invalidator,
            config,
            output,
            render_count: 1,
            mounted: true,
        };
        host.commit(pending);
        host
    }

    /// Output of the latest render.
    #[must_use]
    pub fn output(&self) -> &C::Output {
        &self.output
    }

    /// The component instance, e.g. to read props.
    #[must_use]
    pub fn component(&self) -> &C {
        &self.component
    }

    /// Mutable access to the component instance. Changes show up on the
    /// next render.
    pub fn component_mut(&mut self) -> &mut C {
        &mut self.component
    }

    /// Renders performed since mount, including the first.
    #[must_use]
    pub fn render_count(&self) -> u64 {
        self.render_count
    }

    /// Whether a store change is waiting for a render.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.mounted && self.invalidator.is_dirty()
    }

    /// Whether the component is still mounted.
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Render now, whether or not anything changed. This is how a parent
    /// passes new props.
    pub fn rerender(&mut self) -> Result<(), HostError> {
        self.ensure_mounted()?;
        self.render_pass();
        Ok(())
    }

    /// Apply `f` to the component and render.
    pub fn rerender_with(&mut self, f: impl FnOnce(&mut C)) -> Result<(), HostError> {
        self.ensure_mounted()?;
        f(&mut self.component);
        self.render_pass();
        Ok(())
    }

    /// Render until no store change is pending. Returns the number of
    /// renders performed; `0` means the host was already clean.
    pub fn flush(&mut self) -> Result<usize, HostError> {
        self.ensure_mounted()?;
        let mut passes = 0;
        while self.invalidator.is_dirty() {
            if passes >= self.config.max_render_passes {
                debug!(passes, "render pass bound reached");
                return Err(HostError::RenderLoop { passes });
            }
            self.render_pass();
            passes += 1;
        }
        Ok(passes)
    }

    /// Run every effect cleanup and release all hook state. Idempotent.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        debug!(render_count = self.render_count, "unmounting component");
        self.mounted = false;
        self.slots.release_from(0);
        self.invalidator.clear();
    }

    fn ensure_mounted(&self) -> Result<(), HostError> {
        if self.mounted {
            Ok(())
        } else {
            Err(HostError::Unmounted)
        }
    }

    fn render_pass(&mut self) {
        let pass = self.render_count + 1;
        let (output, pending) = render(
            &mut self.component,
            &mut self.slots,
            &self.invalidator,
            self.config.mode,
            pass,
        );
        self.output = output;
        self.render_count = pass;
        self.commit(pending);
    }

    /// Run cleanups for every changed effect, then every setup.
    fn commit(&mut self, pending: Vec<PendingEffect>) {
        if pending.is_empty() {
            return;
        }
        let count = pending.len();
        for effect in &pending {
            if let Some(slot) = self.slots.effect_mut(effect.slot) {
                slot.run_cleanup();
            }
        }
        for effect in pending {
            let cleanup = (effect.setup)();
            if let Some(slot) = self.slots.effect_mut(effect.slot) {
                slot.set_cleanup(cleanup);
            }
        }
        debug!(effects = count, "committed effects");
    }
}

fn render<C: Component>(
    component: &mut C,
    slots: &mut HookSlots,
    invalidator: &Invalidator,
    mode: RenderMode,
    pass: u64,
) -> (C::Output, Vec<PendingEffect>) {
    let _span = debug_span!("rv.render", pass).entered();
    invalidator.clear();
    let mut cx = RenderCx::new(slots, invalidator, mode);
    let output = component.render(&mut cx);
    let (hooks, pending) = cx.finish();
    if hooks < slots.len() {
        debug!(hooks, slots = slots.len(), "fewer hooks than last render, releasing the rest");
        slots.release_from(hooks);
    }
    (output, pending)
}

impl<C: Component> Drop for Host<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

impl<C: Component> fmt::Debug for Host<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("mode", &self.config.mode)
            .field("mounted", &self.mounted)
            .field("dirty", &self.invalidator.is_dirty())
            .field("render_count", &self.render_count)
            .field("hooks", &self.slots.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::Cleanup;
    use rv_core::Rv;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    fn log() -> Log {
        Rc::new(RefCell::new(Vec::new()))
    }

    fn push(log: &Log, entry: impl Into<String>) {
        log.borrow_mut().push(entry.into());
    }

    #[test]
    fn mount_renders_once() {
        let host = Host::mount(|_: &mut RenderCx<'_>| 42);
        assert_eq!(*host.output(), 42);
        assert_eq!(host.render_count(), 1);
        assert!(host.is_mounted());
        assert!(!host.is_dirty());
    }

    #[test]
    fn flush_when_clean_renders_nothing() {
        let mut host = Host::mount(|_: &mut RenderCx<'_>| ());
        assert_eq!(host.flush(), Ok(0));
        assert_eq!(host.render_count(), 1);
    }

    #[test]
    fn effects_run_after_render_with_cleanup_first() {
        let events = log();
        let dep = Rc::new(Cell::new(1u8));

        let events_render = Rc::clone(&events);
        let dep_render = Rc::clone(&dep);
        let mut host = Host::mount(move |cx: &mut RenderCx<'_>| {
            let d = dep_render.get();
            push(&events_render, format!("render {d}"));
            let events_effect = Rc::clone(&events_render);
            cx.use_effect(d, move || {
                push(&events_effect, format!("setup {d}"));
                let events_cleanup = Rc::clone(&events_effect);
                Some(Box::new(move || push(&events_cleanup, format!("cleanup {d}"))) as Cleanup)
            });
        });

        host.rerender().ok();
        dep.set(2);
        host.rerender().ok();
        host.unmount();

        assert_eq!(
            *events.borrow(),
            vec![
                "render 1", "setup 1", "render 1", "render 2", "cleanup 1", "setup 2",
                "cleanup 2",
            ]
        );
    }

    #[test]
    fn store_change_marks_dirty_until_flush() {
        let rv = Rv::new(0);
        let source = rv.clone();
        let mut host = Host::mount(move |cx: &mut RenderCx<'_>| cx.use_sync_external_store(&source));
        assert_eq!(rv.size(), 1);

        rv.set(1);
        assert!(host.is_dirty());
        assert_eq!(*host.output(), 0);

        assert_eq!(host.flush(), Ok(1));
        assert_eq!(*host.output(), 1);
        assert!(!host.is_dirty());
    }

    #[test]
    fn self_invalidating_render_is_bounded() {
        let rv = Rv::new(0u64);
        let source = rv.clone();
        let mut host = Host::mount_with_config(
            move |cx: &mut RenderCx<'_>| {
                let v = cx.use_sync_external_store(&source);
                // Render-time writes re-invalidate forever.
                source.set(v + 1);
                v
            },
            HostConfig::client().with_max_render_passes(3),
        );

        // The first render wrote before the subscription existed; the commit
        // notices the stale snapshot.
        assert!(host.is_dirty());
        assert_eq!(host.flush(), Err(HostError::RenderLoop { passes: 3 }));
    }

    #[test]
    fn change_before_subscribe_is_caught() {
        let rv = Rv::new(0);
        let source = rv.clone();
        let writer = rv.clone();
        let host = Host::mount(move |cx: &mut RenderCx<'_>| {
            let writer = writer.clone();
            // Commits before the store hook subscribes.
            cx.use_effect((), move || {
                writer.set(5);
                None
            });
            cx.use_sync_external_store(&source)
        });

        assert_eq!(*host.output(), 0);
        assert!(host.is_dirty());
    }

    #[test]
    fn change_after_subscribe_is_caught() {
        let rv = Rv::new(0);
        let source = rv.clone();
        let writer = rv.clone();
        let mut host = Host::mount(move |cx: &mut RenderCx<'_>| {
            let v = cx.use_sync_external_store(&source);
            let writer = writer.clone();
            cx.use_effect((), move || {
                writer.set(5);
                None
            });
            v
        });

        assert!(host.is_dirty());
        assert_eq!(host.flush(), Ok(1));
        assert_eq!(*host.output(), 5);
    }

    #[test]
    fn unmounted_host_rejects_renders() {
        let mut host = Host::mount(|_: &mut RenderCx<'_>| ());
        host.unmount();
        host.unmount();
        assert!(!host.is_mounted());
        assert_eq!(host.rerender(), Err(HostError::Unmounted));
        assert_eq!(host.flush(), Err(HostError::Unmounted));
        assert_eq!(host.rerender_with(|_| {}), Err(HostError::Unmounted));
    }

    #[test]
    fn drop_releases_subscriptions() {
        let rv = Rv::new(0);
        let source = rv.clone();
        let host = Host::mount(move |cx: &mut RenderCx<'_>| cx.use_sync_external_store(&source));
        assert_eq!(rv.size(), 1);
        drop(host);
        assert_eq!(rv.size(), 0);
    }

    #[test]
    fn server_mode_never_subscribes() {
        let rv = Rv::new(7);
        let source = rv.clone();
        let ran = Rc::new(Cell::new(false));
        let ran_clone = Rc::clone(&ran);
        let mut host = Host::mount_with_config(
            move |cx: &mut RenderCx<'_>| {
                let ran = Rc::clone(&ran_clone);
                cx.use_effect((), move || {
                    ran.set(true);
                    None
                });
                (cx.render_mode(), cx.use_sync_external_store(&source))
            },
            HostConfig::server(),
        );

        assert_eq!(*host.output(), (RenderMode::Server, 7));
        assert_eq!(rv.size(), 0);
        assert!(!ran.get());

        rv.set(8);
        assert_eq!(host.flush(), Ok(0));
    }

    struct MaybeBound {
        bound: bool,
        source: Rv<i32>,
    }

    impl Component for MaybeBound {
        type Output = ();

        fn render(&mut self, cx: &mut RenderCx<'_>) {
            if self.bound {
                cx.use_sync_external_store(&self.source);
            }
        }
    }

    #[test]
    fn conditional_hooks_release_trailing_slots() {
        let rv = Rv::new(0);
        let mut host = Host::mount(MaybeBound {
            bound: true,
            source: rv.clone(),
        });
        assert_eq!(rv.size(), 1);

        host.rerender_with(|c| c.bound = false).ok();
        assert_eq!(rv.size(), 0);
        assert!(!host.component().bound);
    }

    #[test]
    fn error_display() {
        assert_eq!(
            HostError::RenderLoop { passes: 4 }.to_string(),
            "component still invalidated after 4 render passes"
        );
        assert_eq!(HostError::Unmounted.to_string(), "component is unmounted");
    }

    #[test]
    fn config_defaults() {
        let config = HostConfig::default();
        assert_eq!(config.mode, RenderMode::Client);
        assert_eq!(config.max_render_passes, 50);
        assert_eq!(HostConfig::server().mode, RenderMode::Server);
        assert_eq!(HostConfig::client().with_max_render_passes(0).max_render_passes, 1);
    }

    #[test]
    fn debug_format() {
        let host = Host::mount(|cx: &mut RenderCx<'_>| {
            let counter = cx.use_ref(|| 0);
            let value = *counter.borrow();
            value
        });
        let dbg = format!("{host:?}");
        assert!(dbg.contains("Host"));
        assert!(dbg.contains("render_count: 1"));
        assert!(dbg.contains("hooks: 1"));
    }
}
