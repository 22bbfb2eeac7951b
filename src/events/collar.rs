use crate::events::Event;
use crate::models::group::Group;
use crate::models::waypoint::Waypoint;
use crate::services::CollarState;

/// A waypoint was added, privately or to `group`.
#[derive(Debug, Clone)]
pub struct WaypointCreatedEvent {
    pub waypoint: Waypoint,
    pub group: Option<Group>,
}

impl Event for WaypointCreatedEvent {}

#[derive(Debug, Clone)]
pub struct WaypointRemovedEvent {
    pub waypoint: Waypoint,
    pub group: Option<Group>,
}

impl Event for WaypointRemovedEvent {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollarStateChangedEvent {
    pub previous: CollarState,
    pub state: CollarState,
}

impl Event for CollarStateChangedEvent {}
