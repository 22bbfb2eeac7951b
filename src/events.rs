mod bus;
mod client;
mod collar;
mod executor;
mod subscription;

pub use bus::{EventBus, PublishReport};
pub use client::RenderOverlaysEvent;
pub use collar::{CollarStateChangedEvent, WaypointCreatedEvent, WaypointRemovedEvent};
pub use executor::{Executor, InlineExecutor, Job, TaskQueue, TokioExecutor};
pub use subscription::{
    Event, Handlers, Preference, Subscriber, SubscriberKey, Subscription, SubscriptionState,
};
