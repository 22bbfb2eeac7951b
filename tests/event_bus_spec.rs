use collar::events::{
    Event, EventBus, Handlers, Preference, PublishReport, Subscriber, TaskQueue, TokioExecutor,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Chat(String);
impl Event for Chat {}

#[derive(Default)]
struct Log {
    lines: Mutex<Vec<String>>,
}

impl Subscriber for Log {
    fn subscriptions(&self, handlers: &mut Handlers<Self>) {
        handlers.on(Preference::Caller, |me: &Self, e: &Chat| {
            me.lines.lock().push(e.0.clone());
            Ok(())
        });
    }
}

struct Failing;

impl Subscriber for Failing {
    fn subscriptions(&self, handlers: &mut Handlers<Self>) {
        handlers.on(Preference::Caller, |_: &Self, _: &Chat| anyhow::bail!("boom"));
    }
}

struct Panicking;

impl Subscriber for Panicking {
    fn subscriptions(&self, handlers: &mut Handlers<Self>) {
        handlers.on(Preference::Caller, |_: &Self, _: &Chat| -> anyhow::Result<()> {
            panic!("handler blew up")
        });
    }
}

#[test]
fn publish_without_subscribers_is_a_no_op() {
    let bus = EventBus::default();
    assert_eq!(bus.publish(Chat("hello".into())), PublishReport::default());
}

#[test]
fn failing_caller_does_not_block_the_next_subscriber() {
    let bus = EventBus::default();
    let failing = Arc::new(Failing);
    let panicking = Arc::new(Panicking);
    let log = Arc::new(Log::default());
    bus.subscribe(&failing);
    bus.subscribe(&panicking);
    bus.subscribe(&log);

    let report = bus.publish(Chat("still delivered".into()));
    assert_eq!(report.failed, 2);
    assert_eq!(report.delivered, 1);
    assert_eq!(*log.lines.lock(), vec!["still delivered".to_string()]);
}

#[test]
fn caller_handlers_run_in_subscription_order() {
    struct Tagged {
        tag: &'static str,
        out: Arc<Mutex<Vec<&'static str>>>,
    }
    impl Subscriber for Tagged {
        fn subscriptions(&self, handlers: &mut Handlers<Self>) {
            handlers.on(Preference::Caller, |me: &Self, _: &Chat| {
                me.out.lock().push(me.tag);
                Ok(())
            });
        }
    }

    let out = Arc::new(Mutex::new(Vec::new()));
    let bus = EventBus::default();
    let subs: Vec<_> = ["a", "b", "c"]
        .into_iter()
        .map(|tag| Arc::new(Tagged { tag, out: out.clone() }))
        .collect();
    for s in &subs {
        bus.subscribe(s);
    }
    bus.publish(Chat(String::new()));
    assert_eq!(*out.lock(), vec!["a", "b", "c"]);
}

#[test]
fn unsubscribed_handler_is_not_invoked() {
    let bus = EventBus::default();
    let log = Arc::new(Log::default());
    bus.subscribe(&log);
    bus.publish(Chat("one".into()));

    bus.unsubscribe(&log);
    bus.publish(Chat("two".into()));

    assert_eq!(*log.lines.lock(), vec!["one".to_string()]);
    assert_eq!(bus.subscriber_count::<Chat>(), 0);
}

#[test]
fn subscriber_may_unsubscribe_itself_while_handling() {
    struct OneShot {
        bus: Arc<EventBus>,
        me: Mutex<Option<std::sync::Weak<OneShot>>>,
        hits: AtomicUsize,
    }
    impl Subscriber for OneShot {
        fn subscriptions(&self, handlers: &mut Handlers<Self>) {
            handlers.on(Preference::Caller, |me: &Self, _: &Chat| {
                me.hits.fetch_add(1, Ordering::SeqCst);
                if let Some(this) = me.me.lock().as_ref().and_then(|w| w.upgrade()) {
                    me.bus.unsubscribe(&this);
                }
                Ok(())
            });
        }
    }

    let bus = Arc::new(EventBus::default());
    let one = Arc::new(OneShot {
        bus: bus.clone(),
        me: Mutex::new(None),
        hits: AtomicUsize::new(0),
    });
    *one.me.lock() = Some(Arc::downgrade(&one));
    bus.subscribe(&one);

    bus.publish(Chat("first".into()));
    bus.publish(Chat("second".into()));
    assert_eq!(one.hits.load(Ordering::SeqCst), 1);
}

#[test]
fn global_handlers_run_when_the_queue_drains() {
    struct Background {
        hits: AtomicUsize,
    }
    impl Subscriber for Background {
        fn subscriptions(&self, handlers: &mut Handlers<Self>) {
            handlers.on(Preference::Global, |me: &Self, _: &Chat| {
                me.hits.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
    }

    let queue = Arc::new(TaskQueue::new());
    let bus = EventBus::new(queue.clone());
    let bg = Arc::new(Background { hits: AtomicUsize::new(0) });
    bus.subscribe(&bg);

    bus.publish(Chat("a".into()));
    bus.publish(Chat("b".into()));
    assert_eq!(bg.hits.load(Ordering::SeqCst), 0);

    // removed before the queue ran: nothing is delivered
    bus.unsubscribe(&bg);
    assert_eq!(queue.run_pending(), 2);
    assert_eq!(bg.hits.load(Ordering::SeqCst), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn global_deliveries_never_overlap_for_one_subscriber() {
    struct Slow {
        in_flight: AtomicUsize,
        max_seen: AtomicUsize,
        done: AtomicUsize,
    }
    impl Subscriber for Slow {
        fn subscriptions(&self, handlers: &mut Handlers<Self>) {
            handlers.on(Preference::Global, |me: &Self, _: &Chat| {
                let now = me.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                me.max_seen.fetch_max(now, Ordering::SeqCst);
                std::thread::sleep(Duration::from_millis(2));
                me.in_flight.fetch_sub(1, Ordering::SeqCst);
                me.done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            });
        }
    }

    let executor = TokioExecutor::current().expect("inside a runtime");
    let bus = EventBus::new(Arc::new(executor));
    let slow = Arc::new(Slow {
        in_flight: AtomicUsize::new(0),
        max_seen: AtomicUsize::new(0),
        done: AtomicUsize::new(0),
    });
    bus.subscribe(&slow);

    for i in 0..20 {
        assert_eq!(bus.publish(Chat(i.to_string())).queued, 1);
    }

    tokio::time::timeout(Duration::from_secs(10), async {
        while slow.done.load(Ordering::SeqCst) < 20 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("deliveries finished");

    assert_eq!(slow.max_seen.load(Ordering::SeqCst), 1);
}
