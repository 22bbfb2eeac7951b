use crate::models::player::Profile;
use crate::models::types::GroupId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupType {
    Party,
    Group,
}

impl GroupType {
    pub const ALL: [GroupType; 2] = [GroupType::Party, GroupType::Group];

    /// Command literal for this group type.
    pub fn name(&self) -> &'static str {
        match self {
            GroupType::Party => "party",
            GroupType::Group => "group",
        }
    }

    pub fn plural(&self) -> &'static str {
        match self {
            GroupType::Party => "parties",
            GroupType::Group => "groups",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub group_type: GroupType,
    pub members: Vec<Member>,
}

impl Group {
    pub fn member(&self, profile: &Profile) -> Option<&Member> {
        self.members.iter().find(|m| m.profile.id == profile.id)
    }
}

/// Pending invitation to join a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invitation {
    pub group_id: GroupId,
    pub name: String,
    pub group_type: GroupType,
    pub sender: Profile,
}
