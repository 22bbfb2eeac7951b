mod waypoint;

pub use waypoint::{ChatCommandTarget, WaypointCommandIntegration, WaypointCommandTarget};
