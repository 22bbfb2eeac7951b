//! Seam between the game client and the collar core. The host calls the
//! `render_frame`/`tick`/`world_loaded`/`disconnected` entry points from its
//! own hooks; everything else registers callbacks here.

use crate::events::{EventBus, RenderOverlaysEvent};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

type Callback<A> = Arc<dyn Fn(A) + Send + Sync>;

/// What the host knows when a world finishes loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldLoaded {
    /// `false` for single-player worlds.
    pub on_server: bool,
}

pub struct HostAdapter {
    events: Arc<EventBus>,
    frames: AtomicU64,
    ticks: AtomicU64,
    frame_render: RwLock<Vec<Callback<RenderOverlaysEvent>>>,
    tick: RwLock<Vec<Callback<u64>>>,
    world_loaded: RwLock<Vec<Callback<WorldLoaded>>>,
    disconnect: RwLock<Vec<Callback<()>>>,
}

impl HostAdapter {
    pub fn new(events: Arc<EventBus>) -> Self {
        Self {
            events,
            frames: AtomicU64::new(0),
            ticks: AtomicU64::new(0),
            frame_render: RwLock::new(Vec::new()),
            tick: RwLock::new(Vec::new()),
            world_loaded: RwLock::new(Vec::new()),
            disconnect: RwLock::new(Vec::new()),
        }
    }

    pub fn on_frame_render(&self, f: impl Fn(RenderOverlaysEvent) + Send + Sync + 'static) {
        self.frame_render.write().push(Arc::new(f));
    }

    pub fn on_tick(&self, f: impl Fn(u64) + Send + Sync + 'static) {
        self.tick.write().push(Arc::new(f));
    }

    pub fn on_world_loaded(&self, f: impl Fn(WorldLoaded) + Send + Sync + 'static) {
        self.world_loaded.write().push(Arc::new(f));
    }

    pub fn on_disconnect(&self, f: impl Fn() + Send + Sync + 'static) {
        self.disconnect.write().push(Arc::new(move |()| f()));
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    /// Called by the host once per frame, after the world is drawn.
    pub fn render_frame(&self, partial_ticks: f32) {
        let frame = self.frames.fetch_add(1, Ordering::Relaxed) + 1;
        let event = RenderOverlaysEvent { frame, partial_ticks };
        for cb in snapshot(&self.frame_render) {
            cb(event);
        }
        self.events.publish(event);
    }

    pub fn tick(&self) {
        let tick = self.ticks.fetch_add(1, Ordering::Relaxed) + 1;
        for cb in snapshot(&self.tick) {
            cb(tick);
        }
    }

    pub fn world_loaded(&self, on_server: bool) {
        tracing::debug!(on_server, "world loaded");
        let loaded = WorldLoaded { on_server };
        for cb in snapshot(&self.world_loaded) {
            cb(loaded);
        }
    }

    pub fn disconnected(&self) {
        tracing::debug!("host disconnected");
        for cb in snapshot(&self.disconnect) {
            cb(());
        }
    }
}

/// Callbacks are copied out so one may register another without deadlocking.
fn snapshot<A>(list: &RwLock<Vec<Callback<A>>>) -> Vec<Callback<A>> {
    list.read().clone()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{Handlers, Preference, Subscriber};
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Overlay {
        frames: AtomicUsize,
    }

    impl Subscriber for Overlay {
        fn subscriptions(&self, handlers: &mut Handlers<Self>) {
            handlers.on(Preference::Caller, |me: &Self, _e: &RenderOverlaysEvent| {
                me.frames.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
    }

    #[test]
    fn t_render_frame_runs_callbacks_and_publishes() {
        let bus = Arc::new(EventBus::default());
        let host = HostAdapter::new(bus.clone());
        let overlay = Arc::new(Overlay::default());
        bus.subscribe(&overlay);

        let seen = Arc::new(AtomicU64::new(0));
        let s = seen.clone();
        host.on_frame_render(move |e| s.store(e.frame, Ordering::SeqCst));

        host.render_frame(0.5);
        host.render_frame(0.25);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert_eq!(overlay.frames.load(Ordering::SeqCst), 2);
        assert_eq!(host.frames(), 2);
    }

    #[test]
    fn t_world_and_disconnect_callbacks() {
        let host = HostAdapter::new(Arc::new(EventBus::default()));
        let hits = Arc::new(AtomicUsize::new(0));

        let h = hits.clone();
        host.on_world_loaded(move |w| {
            if w.on_server {
                h.fetch_add(1, Ordering::SeqCst);
            }
        });
        let h = hits.clone();
        host.on_disconnect(move || {
            h.fetch_add(10, Ordering::SeqCst);
        });

        host.world_loaded(false);
        host.world_loaded(true);
        host.disconnected();
        assert_eq!(hits.load(Ordering::SeqCst), 11);
    }

    #[test]
    fn t_ticks_count_up() {
        let host = HostAdapter::new(Arc::new(EventBus::default()));
        let last = Arc::new(AtomicU64::new(0));
        let l = last.clone();
        host.on_tick(move |t| l.store(t, Ordering::SeqCst));
        for _ in 0..3 {
            host.tick();
        }
        assert_eq!(last.load(Ordering::SeqCst), 3);
    }
}
