use std::any::{Any, TypeId};
use std::marker::PhantomData;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::ReentrantMutex;

/// Marker for types that can travel over the [`EventBus`].
///
/// [`EventBus`]: crate::events::EventBus
pub trait Event: Send + Sync + 'static {}

/// Where a handler runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preference {
    /// Inline, on the publisher's call stack, in registration order.
    Caller,
    /// On the bus executor. No ordering across subscribers.
    Global,
}

/// Something that declares its own event handlers.
///
/// ```ignore
/// impl Subscriber for Hud {
///     fn subscriptions(&self, handlers: &mut Handlers<Self>) {
///         handlers.on(Preference::Caller, Hud::on_render);
///     }
/// }
/// ```
pub trait Subscriber: Send + Sync + 'static {
    fn subscriptions(&self, handlers: &mut Handlers<Self>)
    where
        Self: Sized;
}

type Erased = dyn Any + Send + Sync;
type Invoke = Box<dyn Fn(&Erased, &Erased) -> anyhow::Result<()> + Send + Sync>;

pub(crate) struct HandlerSpec {
    pub(crate) event_type: TypeId,
    pub(crate) event_name: &'static str,
    pub(crate) preference: Preference,
    pub(crate) invoke: Invoke,
}

/// Handler list a [`Subscriber`] fills in at subscribe time.
pub struct Handlers<S> {
    pub(crate) specs: Vec<HandlerSpec>,
    _subscriber: PhantomData<fn(&S)>,
}

impl<S: Subscriber> Handlers<S> {
    pub(crate) fn new() -> Self {
        Self {
            specs: Vec::new(),
            _subscriber: PhantomData,
        }
    }

    pub fn on<E, F>(&mut self, preference: Preference, handler: F) -> &mut Self
    where
        E: Event,
        F: Fn(&S, &E) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let invoke: Invoke = Box::new(move |owner, event| {
            match (owner.downcast_ref::<S>(), event.downcast_ref::<E>()) {
                (Some(s), Some(e)) => handler(s, e),
                _ => Ok(()),
            }
        });
        self.specs.push(HandlerSpec {
            event_type: TypeId::of::<E>(),
            event_name: std::any::type_name::<E>(),
            preference,
            invoke,
        });
        self
    }
}

/// Identity of a subscriber instance: the address of its `Arc` allocation.
/// Subscriptions keep a `Weak` to that allocation, so the address cannot be
/// handed to another subscriber while any of them are still registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberKey(usize);

impl SubscriberKey {
    pub fn of<S>(subscriber: &Arc<S>) -> Self {
        Self(Arc::as_ptr(subscriber) as *const () as usize)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriptionState {
    Active,
    Removed,
}

pub(crate) enum Delivery {
    Delivered,
    Failed,
    /// The subscriber has been dropped.
    Gone,
}

pub struct Subscription {
    key: SubscriberKey,
    owner: Weak<Erased>,
    event_name: &'static str,
    preference: Preference,
    invoke: Invoke,
    active: AtomicBool,
    /// Serialises deliveries to this subscription from executor threads.
    delivering: ReentrantMutex<()>,
}

impl Subscription {
    pub(crate) fn new(key: SubscriberKey, owner: Weak<Erased>, spec: HandlerSpec) -> Self {
        Self {
            key,
            owner,
            event_name: spec.event_name,
            preference: spec.preference,
            invoke: spec.invoke,
            active: AtomicBool::new(true),
            delivering: ReentrantMutex::new(()),
        }
    }

    pub fn key(&self) -> SubscriberKey {
        self.key
    }

    pub fn preference(&self) -> Preference {
        self.preference
    }

    pub fn event_name(&self) -> &'static str {
        self.event_name
    }

    pub fn state(&self) -> SubscriptionState {
        if self.active.load(Ordering::Acquire) {
            SubscriptionState::Active
        } else {
            SubscriptionState::Removed
        }
    }

    pub(crate) fn is_active(&self) -> bool {
        self.state() == SubscriptionState::Active
    }

    pub(crate) fn is_alive(&self) -> bool {
        self.owner.strong_count() > 0
    }

    pub(crate) fn remove(&self) {
        self.active.store(false, Ordering::Release);
    }

    /// Runs the handler, isolating errors and panics.
    pub(crate) fn deliver(&self, event: &Erased) -> Delivery {
        let _guard = self.delivering.lock();
        if !self.is_active() {
            return Delivery::Delivered;
        }
        let Some(owner) = self.owner.upgrade() else {
            return Delivery::Gone;
        };

        match catch_unwind(AssertUnwindSafe(|| (self.invoke)(&*owner, event))) {
            Ok(Ok(())) => Delivery::Delivered,
            Ok(Err(e)) => {
                tracing::error!(event = self.event_name, error = %e, "subscriber failed");
                Delivery::Failed
            }
            Err(panic) => {
                let msg = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!(event = self.event_name, panic = %msg, "subscriber panicked");
                Delivery::Failed
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("event", &self.event_name)
            .field("preference", &self.preference)
            .field("state", &self.state())
            .finish()
    }
}
