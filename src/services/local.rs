use crate::display::Display;
use crate::events::{EventBus, WaypointCreatedEvent, WaypointRemovedEvent};
use crate::models::friend::{Friend, Status};
use crate::models::group::{Group, GroupType, Invitation, Member};
use crate::models::player::{Identity, Player, Profile};
use crate::models::types::{GroupId, Location, ProfileId};
use crate::models::waypoint::Waypoint;
use crate::services::ServiceError;
use crate::services::collar::{Collar, CollarState, Connector, Friends, Groups, Locations};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;

/// In-memory collar session. Keeps everything a real service would hold for
/// the local player and publishes the same events.
pub struct LocalCollar {
    me: Profile,
    display: Arc<dyn Display>,
    events: Arc<EventBus>,
    /// Keyed by lowercase name.
    profiles: DashMap<String, Profile>,
    friends: DashMap<ProfileId, Friend>,
    groups: DashMap<GroupId, Group>,
    invitations: DashMap<GroupId, Invitation>,
    sharing: RwLock<HashSet<GroupId>>,
    private_waypoints: RwLock<Vec<Waypoint>>,
    group_waypoints: DashMap<GroupId, Vec<Waypoint>>,
}

impl LocalCollar {
    pub fn new(me: Profile, display: Arc<dyn Display>, events: Arc<EventBus>) -> Self {
        let profiles = DashMap::new();
        profiles.insert(me.name.to_lowercase(), me.clone());
        Self {
            me,
            display,
            events,
            profiles,
            friends: DashMap::new(),
            groups: DashMap::new(),
            invitations: DashMap::new(),
            sharing: RwLock::new(HashSet::new()),
            private_waypoints: RwLock::new(Vec::new()),
            group_waypoints: DashMap::new(),
        }
    }

    pub fn register_profile(&self, profile: Profile) {
        self.profiles.insert(profile.name.to_lowercase(), profile);
    }

    /// Queues an invitation as if someone else had sent it.
    pub fn receive_invitation(&self, invitation: Invitation) {
        self.register_profile(invitation.sender.clone());
        self.invitations.insert(invitation.group_id, invitation);
    }

    pub fn set_status(&self, profile: &ProfileId, status: Status) {
        if let Some(mut f) = self.friends.get_mut(profile) {
            f.status = status;
        }
    }

    fn profile_for_player(&self, player: &Player) -> Profile {
        self.profiles
            .entry(player.name.to_lowercase())
            .or_insert_with(|| Profile::new(player.name.clone()))
            .clone()
    }

    fn profile_for(&self, identity: &Identity) -> Profile {
        match identity {
            Identity::Player(p) => self.profile_for_player(p),
            Identity::Profile(p) => p.clone(),
        }
    }

    fn find_group(&self, id: &GroupId) -> Option<Group> {
        self.groups.get(id).map(|g| g.value().clone())
    }
}

impl Collar for LocalCollar {
    fn state(&self) -> CollarState {
        CollarState::Connected
    }

    fn me(&self) -> Profile {
        self.me.clone()
    }

    fn lookup_profile(&self, name: &str) -> Option<Profile> {
        self.profiles.get(&name.to_lowercase()).map(|p| p.value().clone())
    }

    fn friends(&self) -> &dyn Friends {
        self
    }

    fn groups(&self) -> &dyn Groups {
        self
    }

    fn location(&self) -> &dyn Locations {
        self
    }
}

impl Friends for LocalCollar {
    fn add_friend(&self, identity: &Identity) {
        let profile = self.profile_for(identity);
        if profile.id == self.me.id {
            self.display.display_message("You can't add yourself as a friend");
            return;
        }
        if self.friends.contains_key(&profile.id) {
            self.display
                .display_message(&format!("{} is already your friend", profile.name));
            return;
        }
        let status = match identity {
            Identity::Player(_) => Status::Online,
            Identity::Profile(_) => Status::Offline,
        };
        tracing::info!(friend = %profile.name, "friend added");
        self.display
            .display_info_message(&format!("Added {} as a friend", profile.name));
        self.friends.insert(profile.id, Friend { friend: profile, status });
    }

    fn remove_friend(&self, identity: &Identity) {
        let profile = self.profile_for(identity);
        match self.friends.remove(&profile.id) {
            Some(_) => {
                tracing::info!(friend = %profile.name, "friend removed");
                self.display
                    .display_info_message(&format!("Removed {} as a friend", profile.name));
            }
            None => self
                .display
                .display_message(&format!("{} is not your friend", profile.name)),
        }
    }

    fn list(&self) -> Vec<Friend> {
        self.friends.iter().map(|f| f.value().clone()).collect()
    }
}

impl Groups for LocalCollar {
    fn create(&self, name: &str, group_type: GroupType, players: &[Player]) {
        if self.groups.iter().any(|g| g.group_type == group_type && g.name.eq_ignore_ascii_case(name)) {
            self.display.display_message(&format!(
                "You already belong to a {} named {}",
                group_type.name(),
                name
            ));
            return;
        }
        let mut members = vec![Member { profile: self.me.clone() }];
        members.extend(players.iter().map(|p| Member {
            profile: self.profile_for_player(p),
        }));
        let group = Group {
            id: GroupId::new(),
            name: name.to_string(),
            group_type,
            members,
        };
        tracing::info!(group = %group.name, kind = group_type.name(), "group created");
        self.display
            .display_info_message(&format!("Created {} {}", group_type.name(), group.name));
        self.groups.insert(group.id, group);
    }

    fn delete(&self, group: &Group) {
        if self.groups.remove(&group.id).is_none() {
            self.display
                .display_message(&format!("{} {} does not exist", group.group_type.name(), group.name));
            return;
        }
        self.sharing.write().remove(&group.id);
        self.group_waypoints.remove(&group.id);
        tracing::info!(group = %group.name, "group deleted");
        self.display
            .display_info_message(&format!("Deleted {} {}", group.group_type.name(), group.name));
    }

    fn leave(&self, group: &Group) {
        if self.groups.remove(&group.id).is_none() {
            self.display
                .display_message(&format!("You are not a member of {}", group.name));
            return;
        }
        self.sharing.write().remove(&group.id);
        self.group_waypoints.remove(&group.id);
        tracing::info!(group = %group.name, "left group");
        self.display
            .display_info_message(&format!("You left {} {}", group.group_type.name(), group.name));
    }

    fn accept(&self, invitation: &Invitation) {
        let Some((_, invitation)) = self.invitations.remove(&invitation.group_id) else {
            self.display
                .display_message(&format!("No invitation to {}", invitation.name));
            return;
        };
        let group = Group {
            id: invitation.group_id,
            name: invitation.name.clone(),
            group_type: invitation.group_type,
            members: vec![
                Member { profile: invitation.sender.clone() },
                Member { profile: self.me.clone() },
            ],
        };
        tracing::info!(group = %group.name, "invitation accepted");
        self.display.display_info_message(&format!(
            "You joined {} {}",
            group.group_type.name(),
            group.name
        ));
        self.groups.insert(group.id, group);
    }

    fn invite(&self, group: &Group, players: &[Player]) {
        let Some(mut stored) = self.groups.get_mut(&group.id) else {
            self.display
                .display_message(&format!("You are not a member of {}", group.name));
            return;
        };
        for player in players {
            let profile = self.profile_for_player(player);
            if stored.member(&profile).is_some() {
                self.display
                    .display_message(&format!("{} is already in {}", profile.name, stored.name));
                continue;
            }
            self.display
                .display_info_message(&format!("Invited {} to {}", profile.name, stored.name));
            stored.members.push(Member { profile });
        }
    }

    fn remove_member(&self, group: &Group, member: &Member) {
        let Some(mut stored) = self.groups.get_mut(&group.id) else {
            self.display
                .display_message(&format!("You are not a member of {}", group.name));
            return;
        };
        let before = stored.members.len();
        stored.members.retain(|m| m.profile.id != member.profile.id);
        if stored.members.len() == before {
            self.display.display_message(&format!(
                "{} is not a member of {}",
                member.profile.name, stored.name
            ));
        } else {
            self.display.display_info_message(&format!(
                "Removed {} from {}",
                member.profile.name, stored.name
            ));
        }
    }

    fn all(&self) -> Vec<Group> {
        let mut groups: Vec<Group> = self.groups.iter().map(|g| g.value().clone()).collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    fn invitations(&self) -> Vec<Invitation> {
        self.invitations.iter().map(|i| i.value().clone()).collect()
    }
}

impl Locations for LocalCollar {
    fn start_sharing_with(&self, group: &Group) {
        if self.sharing.write().insert(group.id) {
            self.display
                .display_info_message(&format!("Started sharing your location with {}", group.name));
        }
    }

    fn stop_sharing_with(&self, group: &Group) {
        if self.sharing.write().remove(&group.id) {
            self.display
                .display_info_message(&format!("Stopped sharing your location with {}", group.name));
        }
    }

    fn is_sharing_with(&self, group: &Group) -> bool {
        self.sharing.read().contains(&group.id)
    }

    fn add_waypoint(&self, name: &str, location: Location) {
        let waypoint = Waypoint::new(name, location);
        {
            let mut list = self.private_waypoints.write();
            if list.iter().any(|w| w.name == name) {
                drop(list);
                self.display
                    .display_message(&format!("Waypoint {name} already exists"));
                return;
            }
            list.push(waypoint.clone());
        }
        tracing::info!(waypoint = %waypoint.name, location = %waypoint.location, "private waypoint added");
        self.events.publish(WaypointCreatedEvent { waypoint, group: None });
    }

    fn add_group_waypoint(&self, group: &Group, name: &str, location: Location) {
        if self.find_group(&group.id).is_none() {
            self.display
                .display_message(&format!("You are not a member of {}", group.name));
            return;
        }
        let waypoint = Waypoint::new(name, location);
        {
            let mut list = self.group_waypoints.entry(group.id).or_default();
            if list.iter().any(|w| w.name == name) {
                drop(list);
                self.display.display_message(&format!(
                    "Waypoint {name} already exists in {}",
                    group.name
                ));
                return;
            }
            list.push(waypoint.clone());
        }
        tracing::info!(waypoint = %waypoint.name, group = %group.name, "group waypoint added");
        self.events.publish(WaypointCreatedEvent {
            waypoint,
            group: Some(group.clone()),
        });
    }

    fn remove_waypoint(&self, waypoint: &Waypoint) {
        let removed = {
            let mut list = self.private_waypoints.write();
            let before = list.len();
            list.retain(|w| w.id != waypoint.id);
            list.len() != before
        };
        if !removed {
            self.display
                .display_message(&format!("Waypoint {waypoint} does not exist"));
            return;
        }
        tracing::info!(waypoint = %waypoint.name, "private waypoint removed");
        self.events.publish(WaypointRemovedEvent {
            waypoint: waypoint.clone(),
            group: None,
        });
    }

    fn remove_group_waypoint(&self, group: &Group, waypoint: &Waypoint) {
        let removed = match self.group_waypoints.get_mut(&group.id) {
            Some(mut list) => {
                let before = list.len();
                list.retain(|w| w.id != waypoint.id);
                list.len() != before
            }
            None => false,
        };
        if !removed {
            self.display.display_message(&format!(
                "Waypoint {waypoint} does not belong to group {}",
                group.name
            ));
            return;
        }
        tracing::info!(waypoint = %waypoint.name, group = %group.name, "group waypoint removed");
        self.events.publish(WaypointRemovedEvent {
            waypoint: waypoint.clone(),
            group: Some(group.clone()),
        });
    }

    fn private_waypoints(&self) -> Vec<Waypoint> {
        self.private_waypoints.read().clone()
    }

    fn group_waypoints(&self, group: &Group) -> Vec<Waypoint> {
        self.group_waypoints
            .get(&group.id)
            .map(|l| l.value().clone())
            .unwrap_or_default()
    }
}

/// Hands out one shared [`LocalCollar`], or fails every attempt.
pub struct LocalConnector {
    collar: Option<Arc<LocalCollar>>,
    failure: Option<String>,
}

impl LocalConnector {
    pub fn new(collar: Arc<LocalCollar>) -> Self {
        Self {
            collar: Some(collar),
            failure: None,
        }
    }

    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            collar: None,
            failure: Some(reason.into()),
        }
    }
}

#[async_trait]
impl Connector for LocalConnector {
    async fn connect(&self) -> Result<Arc<dyn Collar>, ServiceError> {
        match (&self.collar, &self.failure) {
            (Some(collar), None) => Ok(collar.clone() as Arc<dyn Collar>),
            (_, Some(reason)) => Err(ServiceError::Connect(reason.clone())),
            (None, None) => Err(ServiceError::NotConnected),
        }
    }
}
