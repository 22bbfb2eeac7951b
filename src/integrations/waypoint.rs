//! Mirrors collar waypoints into another mod that manages waypoints through
//! chat commands.

use crate::display::Display;
use crate::events::{Handlers, Preference, Subscriber, WaypointCreatedEvent, WaypointRemovedEvent};
use crate::models::group::Group;
use crate::models::waypoint::Waypoint;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// The mod on the receiving end.
pub trait WaypointCommandTarget: Send + Sync + 'static {
    /// Chat prefix that marks a command, e.g. `.` or `#`.
    fn prefix(&self) -> &str;
    fn waypoints_command(&self) -> &str;
    fn is_loaded(&self) -> bool;
}

/// A target described by configuration.
#[derive(Debug)]
pub struct ChatCommandTarget {
    prefix: String,
    command: String,
    loaded: AtomicBool,
}

impl ChatCommandTarget {
    pub fn new(prefix: impl Into<String>, command: impl Into<String>, loaded: bool) -> Self {
        Self {
            prefix: prefix.into(),
            command: command.into(),
            loaded: AtomicBool::new(loaded),
        }
    }

    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.store(loaded, Ordering::Relaxed);
    }
}

impl WaypointCommandTarget for ChatCommandTarget {
    fn prefix(&self) -> &str {
        &self.prefix
    }

    fn waypoints_command(&self) -> &str {
        &self.command
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::Relaxed)
    }
}

pub struct WaypointCommandIntegration<T> {
    target: T,
    display: Arc<dyn Display>,
}

impl<T: WaypointCommandTarget> WaypointCommandIntegration<T> {
    pub fn new(target: T, display: Arc<dyn Display>) -> Self {
        Self { target, display }
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    fn on_created(&self, e: &WaypointCreatedEvent) -> anyhow::Result<()> {
        if !self.target.is_loaded() {
            return Ok(());
        }
        let loc = &e.waypoint.location;
        // {:?} keeps the fractional part on whole numbers ("1.0", not "1")
        self.display.send_chat_message_to_self(&format!(
            "{}{} add \"{}\" {:?} {:?} {:?}",
            self.target.prefix(),
            self.target.waypoints_command(),
            name(&e.waypoint, e.group.as_ref()),
            loc.x,
            loc.y,
            loc.z
        ));
        Ok(())
    }

    fn on_removed(&self, e: &WaypointRemovedEvent) -> anyhow::Result<()> {
        if !self.target.is_loaded() {
            return Ok(());
        }
        self.display.send_chat_message_to_self(&format!(
            "{}{} remove \"{}\"",
            self.target.prefix(),
            self.target.waypoints_command(),
            name(&e.waypoint, e.group.as_ref())
        ));
        Ok(())
    }
}

impl<T: WaypointCommandTarget> Subscriber for WaypointCommandIntegration<T> {
    fn subscriptions(&self, handlers: &mut Handlers<Self>) {
        handlers
            .on(Preference::Caller, Self::on_created)
            .on(Preference::Caller, Self::on_removed);
    }
}

fn name(waypoint: &Waypoint, group: Option<&Group>) -> String {
    match group {
        Some(g) => format!("{} - {}", g.name, waypoint.name),
        None => waypoint.name.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::BufferDisplay;
    use crate::events::EventBus;
    use crate::models::group::GroupType;
    use crate::models::types::{Dimension, GroupId, Location};

    fn setup(loaded: bool) -> (EventBus, Arc<BufferDisplay>, Arc<WaypointCommandIntegration<ChatCommandTarget>>) {
        let bus = EventBus::default();
        let display = Arc::new(BufferDisplay::new());
        let integration = Arc::new(WaypointCommandIntegration::new(
            ChatCommandTarget::new(".", "waypoints", loaded),
            display.clone(),
        ));
        bus.subscribe(&integration);
        (bus, display, integration)
    }

    fn home() -> Waypoint {
        Waypoint::new("Home", Location::new(1.0, 64.0, -20.5, Dimension::Overworld))
    }

    #[test]
    fn t_private_waypoint_commands() {
        let (bus, display, _i) = setup(true);
        bus.publish(WaypointCreatedEvent { waypoint: home(), group: None });
        bus.publish(WaypointRemovedEvent { waypoint: home(), group: None });
        assert_eq!(
            display.chat(),
            vec![
                ".waypoints add \"Home\" 1.0 64.0 -20.5".to_string(),
                ".waypoints remove \"Home\"".to_string(),
            ]
        );
    }

    #[test]
    fn t_group_waypoint_is_namespaced() {
        let (bus, display, _i) = setup(true);
        let group = Group {
            id: GroupId::new(),
            name: "raiders".into(),
            group_type: GroupType::Group,
            members: vec![],
        };
        bus.publish(WaypointRemovedEvent { waypoint: home(), group: Some(group) });
        assert_eq!(display.chat(), vec![".waypoints remove \"raiders - Home\"".to_string()]);
    }

    #[test]
    fn t_silent_when_target_not_loaded() {
        let (bus, display, i) = setup(false);
        bus.publish(WaypointCreatedEvent { waypoint: home(), group: None });
        assert!(display.chat().is_empty());

        i.target().set_loaded(true);
        bus.publish(WaypointCreatedEvent { waypoint: home(), group: None });
        assert_eq!(display.chat().len(), 1);
    }
}
