use crate::models::types::{Dimension, PlayerId, ProfileId};

/// A player currently visible in the world.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
        }
    }
}

/// A collar account, known whether or not its owner is online.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
}

impl Profile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: ProfileId::new(),
            name: name.into(),
        }
    }
}

/// Somebody named on the command line: either a player standing in the same
/// world, or a profile the collar service knows about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Player(Player),
    Profile(Profile),
}

impl Identity {
    pub fn name(&self) -> &str {
        match self {
            Identity::Player(p) => &p.name,
            Identity::Profile(p) => &p.name,
        }
    }
}

/// Read-only snapshot of the local player, taken when a command runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub player: Player,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub dimension: Dimension,
}
