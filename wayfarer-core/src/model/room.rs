use std::{collections::BTreeSet, fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::{GroupId, MemberId, RoomId, SuggestionId};

/// The decision a room is responsible for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Accommodation,
    Transportation,
    Activities,
    Dining,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    /// Members are still voting
    #[default]
    Active,
    /// A final decision has been fixed
    Locked,
    /// Locked, and every member has marked the room as done
    Completed,
}

/// The per-category decision unit of a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub group_id: GroupId,
    pub category: Category,
    pub status: RoomStatus,
    /// Members who marked this room as done
    pub completed_by: BTreeSet<MemberId>,
    /// The suggestions fixed by a lock, in the order they were supplied
    pub selected: Vec<SuggestionId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Accommodation,
        Category::Transportation,
        Category::Activities,
        Category::Dining,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Accommodation => "accommodation",
            Category::Transportation => "transportation",
            Category::Activities => "activities",
            Category::Dining => "dining",
        }
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| UnknownVariant(s.to_string()))
    }
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Active => "active",
            RoomStatus::Locked => "locked",
            RoomStatus::Completed => "completed",
        }
    }
}

impl Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(RoomStatus::Active),
            "locked" => Ok(RoomStatus::Locked),
            "completed" => Ok(RoomStatus::Completed),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl Room {
    pub fn new(id: RoomId, group_id: GroupId, category: Category) -> Self {
        Self {
            id,
            group_id,
            category,
            status: RoomStatus::Active,
            completed_by: BTreeSet::new(),
            selected: Vec::new(),
        }
    }

    /// Returns true if the outcome of this room has been fixed.
    pub fn is_locked(&self) -> bool {
        matches!(self.status, RoomStatus::Locked | RoomStatus::Completed)
    }

    /// Drops the decision and reopens voting. Completion records are kept.
    pub fn reset(&mut self) {
        self.status = RoomStatus::Active;
        self.selected.clear();
    }
}

impl Display for UnknownVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unknown variant {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}
