//! Parsers that resolve a token against live collar or world state.

use crate::input::arguments::{ArgumentError, ArgumentParser, Parsed};
use crate::input::reader::Cursor;
use crate::models::group::{Group, GroupType, Invitation};
use crate::models::player::{Identity, Player};
use crate::models::waypoint::Waypoint;
use crate::services::{Collar, CollarService};
use crate::world::World;
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

static PLAYER_NAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9_]{3,16}$").unwrap());

/// A resolved waypoint, and the group it lives in when it is not private.
#[derive(Debug, Clone)]
pub struct WaypointRef {
    pub waypoint: Waypoint,
    pub group: Option<Group>,
}

fn read_name<'a>(cursor: Cursor<'a>, what: &str) -> Result<(&'a str, Cursor<'a>), ArgumentError> {
    let (tok, next) = cursor.read_unquoted();
    if tok.is_empty() {
        return Err(ArgumentError::Parse(format!("expected {what}")));
    }
    Ok((tok, next))
}

fn connected<R>(
    collar: &CollarService,
    f: impl FnOnce(&dyn Collar) -> Result<R, ArgumentError>,
) -> Result<R, ArgumentError> {
    collar
        .with(f)
        .unwrap_or_else(|| Err(ArgumentError::Resolution("Collar is disconnected".into())))
}

/// Online player first, then any profile the collar service knows.
pub struct IdentityArg {
    collar: Arc<CollarService>,
    world: Arc<dyn World>,
}

impl ArgumentParser for IdentityArg {
    type Output = Identity;

    fn parser_id(&self) -> &str {
        "collar:identity"
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, Identity> {
        let (name, next) = read_name(cursor, "player name")?;
        if let Some(player) = self.world.find_player(name) {
            return Ok((Identity::Player(player), next));
        }
        let profile = self.collar.with(|c| c.lookup_profile(name)).flatten();
        match profile {
            Some(p) => Ok((Identity::Profile(p), next)),
            None => Err(ArgumentError::Resolution(format!("No player or profile named {name}"))),
        }
    }
}

/// A player visible in the current world.
pub struct PlayerArg {
    world: Arc<dyn World>,
}

impl ArgumentParser for PlayerArg {
    type Output = Player;

    fn parser_id(&self) -> &str {
        "collar:player"
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, Player> {
        let (name, next) = read_name(cursor, "player name")?;
        if !PLAYER_NAME.is_match(name) {
            return Err(ArgumentError::Parse(format!("invalid player name '{name}'")));
        }
        self.world
            .find_player(name)
            .map(|p| (p, next))
            .ok_or_else(|| ArgumentError::Resolution(format!("No player named {name}")))
    }
}

/// A group the local player belongs to, optionally of one type only.
pub struct GroupArg {
    collar: Arc<CollarService>,
    group_type: Option<GroupType>,
    id: String,
}

impl ArgumentParser for GroupArg {
    type Output = Group;

    fn parser_id(&self) -> &str {
        &self.id
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, Group> {
        let (name, next) = cursor.read_string()?;
        if name.is_empty() {
            return Err(ArgumentError::Parse("expected group name".into()));
        }
        let group = connected(&self.collar, |c| {
            Ok(c.groups().all().into_iter().find(|g| {
                g.name.eq_ignore_ascii_case(&name)
                    && self.group_type.is_none_or(|t| t == g.group_type)
            }))
        })?;
        match group {
            Some(g) => Ok((g, next)),
            None => {
                let kind = self.group_type.map(|t| t.name()).unwrap_or("group");
                Err(ArgumentError::Resolution(format!("No {kind} named {name}")))
            }
        }
    }
}

/// A pending invitation to a group of the given type.
pub struct InvitationArg {
    collar: Arc<CollarService>,
    group_type: GroupType,
    id: String,
}

impl ArgumentParser for InvitationArg {
    type Output = Invitation;

    fn parser_id(&self) -> &str {
        &self.id
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, Invitation> {
        let (name, next) = cursor.read_string()?;
        let invitation = connected(&self.collar, |c| {
            Ok(c.groups()
                .invitations()
                .into_iter()
                .find(|i| i.group_type == self.group_type && i.name.eq_ignore_ascii_case(&name)))
        })?;
        invitation.map(|i| (i, next)).ok_or_else(|| {
            ArgumentError::Resolution(format!(
                "You have no invitation to {} {name}",
                self.group_type.name()
            ))
        })
    }
}

/// A waypoint by name: private ones, or ones in any of the player's groups.
pub struct WaypointArg {
    collar: Arc<CollarService>,
    private: bool,
}

impl ArgumentParser for WaypointArg {
    type Output = WaypointRef;

    fn parser_id(&self) -> &str {
        if self.private {
            "collar:private_waypoint"
        } else {
            "collar:group_waypoint"
        }
    }

    fn parse<'a>(&self, cursor: Cursor<'a>) -> Parsed<'a, WaypointRef> {
        let (name, next) = cursor.read_string()?;
        let found = connected(&self.collar, |c| {
            let location = c.location();
            if self.private {
                return Ok(location
                    .private_waypoints()
                    .into_iter()
                    .find(|w| w.name == name)
                    .map(|waypoint| WaypointRef { waypoint, group: None }));
            }
            Ok(c.groups().all().into_iter().find_map(|group| {
                location
                    .group_waypoints(&group)
                    .into_iter()
                    .find(|w| w.name == name)
                    .map(|waypoint| WaypointRef {
                        waypoint,
                        group: Some(group),
                    })
            }))
        })?;
        found
            .map(|w| (w, next))
            .ok_or_else(|| ArgumentError::Resolution(format!("No waypoint named {name}")))
    }
}

pub fn identity(collar: &Arc<CollarService>, world: &Arc<dyn World>) -> IdentityArg {
    IdentityArg {
        collar: collar.clone(),
        world: world.clone(),
    }
}

pub fn player(world: &Arc<dyn World>) -> PlayerArg {
    PlayerArg { world: world.clone() }
}

pub fn group(collar: &Arc<CollarService>, group_type: GroupType) -> GroupArg {
    GroupArg {
        collar: collar.clone(),
        group_type: Some(group_type),
        id: format!("collar:group/{}", group_type.name()),
    }
}

/// Any group regardless of type.
pub fn groups(collar: &Arc<CollarService>) -> GroupArg {
    GroupArg {
        collar: collar.clone(),
        group_type: None,
        id: "collar:groups".into(),
    }
}

pub fn invitation(collar: &Arc<CollarService>, group_type: GroupType) -> InvitationArg {
    InvitationArg {
        collar: collar.clone(),
        group_type,
        id: format!("collar:invitation/{}", group_type.name()),
    }
}

pub fn private_waypoint(collar: &Arc<CollarService>) -> WaypointArg {
    WaypointArg {
        collar: collar.clone(),
        private: true,
    }
}

pub fn group_waypoint(collar: &Arc<CollarService>) -> WaypointArg {
    WaypointArg {
        collar: collar.clone(),
        private: false,
    }
}
