pub mod friend;
pub mod group;
pub mod player;
pub mod types;
pub mod waypoint;
