use crate::events::executor::{Executor, InlineExecutor};
use crate::events::subscription::{
    Delivery, Event, Handlers, Preference, Subscriber, SubscriberKey, Subscription,
};
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, Weak};

/// What a single `publish` call did.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PublishReport {
    /// CALLER handlers that returned normally.
    pub delivered: usize,
    /// CALLER handlers that errored or panicked.
    pub failed: usize,
    /// GLOBAL handlers handed to the executor.
    pub queued: usize,
    /// Subscriptions dropped because their subscriber is gone.
    pub pruned: usize,
}

/// Typed publish/subscribe, keyed by the exact event type.
pub struct EventBus {
    subscriptions: RwLock<HashMap<TypeId, Vec<Arc<Subscription>>>>,
    executor: Arc<dyn Executor>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(Arc::new(InlineExecutor))
    }
}

impl EventBus {
    pub fn new(executor: Arc<dyn Executor>) -> Self {
        Self {
            subscriptions: RwLock::new(HashMap::new()),
            executor,
        }
    }

    /// Registers every handler `subscriber` declares. Returns how many were added;
    /// handlers for an event type this subscriber already listens to are skipped.
    pub fn subscribe<S: Subscriber>(&self, subscriber: &Arc<S>) -> usize {
        let key = SubscriberKey::of(subscriber);
        let mut handlers = Handlers::<S>::new();
        subscriber.subscriptions(&mut handlers);

        let owner: Weak<dyn Any + Send + Sync> = Arc::downgrade(subscriber) as Weak<dyn Any + Send + Sync>;
        let mut added = 0;

        let mut map = self.subscriptions.write();
        for spec in handlers.specs {
            let list = map.entry(spec.event_type).or_default();
            list.retain(|s| s.is_alive());
            if list.iter().any(|s| s.key() == key) {
                tracing::warn!(event = spec.event_name, "subscriber already registered for event");
                continue;
            }
            tracing::debug!(event = spec.event_name, preference = ?spec.preference, "subscribed");
            list.push(Arc::new(Subscription::new(key, owner.clone(), spec)));
            added += 1;
        }
        added
    }

    /// Removes every subscription belonging to `subscriber`. Safe to call repeatedly.
    pub fn unsubscribe<S: Subscriber>(&self, subscriber: &Arc<S>) -> usize {
        self.unsubscribe_key(SubscriberKey::of(subscriber))
    }

    pub fn unsubscribe_key(&self, key: SubscriberKey) -> usize {
        let mut removed = 0;
        let mut map = self.subscriptions.write();
        for list in map.values_mut() {
            list.retain(|s| {
                if s.key() == key {
                    s.remove();
                    removed += 1;
                    false
                } else {
                    true
                }
            });
        }
        map.retain(|_, list| !list.is_empty());
        removed
    }

    /// Delivers `event` to every current subscriber of `E`.
    ///
    /// CALLER handlers run before this returns, in subscription order. GLOBAL
    /// handlers are queued on the executor. A failing handler is logged and
    /// never stops delivery to the rest.
    pub fn publish<E: Event>(&self, event: E) -> PublishReport {
        let mut report = PublishReport::default();
        let snapshot: Vec<Arc<Subscription>> = match self.subscriptions.read().get(&TypeId::of::<E>()) {
            Some(list) => list.clone(),
            None => return report,
        };

        let event: Arc<E> = Arc::new(event);
        let mut gone = false;

        for sub in snapshot {
            if !sub.is_alive() {
                report.pruned += 1;
                gone = true;
                continue;
            }
            if !sub.is_active() {
                continue;
            }
            match sub.preference() {
                Preference::Caller => match sub.deliver(&*event) {
                    Delivery::Delivered => report.delivered += 1,
                    Delivery::Failed => report.failed += 1,
                    Delivery::Gone => {
                        report.pruned += 1;
                        gone = true;
                    }
                },
                Preference::Global => {
                    let event = event.clone();
                    self.executor.execute(Box::new(move || {
                        if let Delivery::Gone = sub.deliver(&*event) {
                            // pruned by the next publish of this type
                            sub.remove();
                            tracing::debug!(event = sub.event_name(), "subscriber dropped before delivery");
                        }
                    }));
                    report.queued += 1;
                }
            }
        }

        if gone {
            self.prune();
        }
        report
    }

    /// Drops subscriptions whose subscriber no longer exists.
    pub fn prune(&self) {
        let mut map = self.subscriptions.write();
        for list in map.values_mut() {
            list.retain(|s| {
                let alive = s.is_alive();
                if !alive {
                    s.remove();
                }
                alive
            });
        }
        map.retain(|_, list| !list.is_empty());
    }

    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscriptions
            .read()
            .get(&TypeId::of::<E>())
            .map(|l| l.iter().filter(|s| s.is_active()).count())
            .unwrap_or(0)
    }

    pub fn is_subscribed<S: Subscriber>(&self, subscriber: &Arc<S>) -> bool {
        let key = SubscriberKey::of(subscriber);
        self.subscriptions
            .read()
            .values()
            .any(|l| l.iter().any(|s| s.key() == key))
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let map = self.subscriptions.read();
        f.debug_struct("EventBus")
            .field("event_types", &map.len())
            .field("subscriptions", &map.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}
