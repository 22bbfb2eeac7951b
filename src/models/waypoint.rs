use crate::models::types::{Location, WaypointId};

#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub id: WaypointId,
    pub name: String,
    pub location: Location,
}

impl Waypoint {
    pub fn new(name: impl Into<String>, location: Location) -> Self {
        Self {
            id: WaypointId::new(),
            name: name.into(),
            location,
        }
    }

    pub fn display_name(&self) -> String {
        format!("{} {}", self.name, self.location)
    }
}

impl std::fmt::Display for Waypoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}
