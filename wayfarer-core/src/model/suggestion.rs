use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{RoomId, SuggestionId, UnknownVariant};

/// Which half of a round trip a transportation suggestion covers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Leg {
    Departure,
    Return,
}

/// A candidate produced for a room by the suggestion service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub id: SuggestionId,
    pub room_id: RoomId,
    pub name: String,
    pub description: Option<String>,
    pub details: SuggestionDetails,
    pub leg: Option<Leg>,
}

/// Category specific metadata shown alongside a suggestion
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuggestionDetails {
    pub price: Option<String>,
    pub rating: Option<f32>,
    pub location: Option<String>,
    pub external_url: Option<String>,
    pub booking_url: Option<String>,
    pub maps_url: Option<String>,
}

/// A suggestion that has been generated but not stored yet
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSuggestion {
    pub name: String,
    pub description: Option<String>,
    pub details: SuggestionDetails,
    pub leg: Option<Leg>,
}

impl Leg {
    pub fn as_str(&self) -> &'static str {
        match self {
            Leg::Departure => "departure",
            Leg::Return => "return",
        }
    }
}

impl FromStr for Leg {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "departure" => Ok(Leg::Departure),
            "return" => Ok(Leg::Return),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl Suggestion {
    /// The leg used for ranking. Suggestions without one count as departures.
    pub fn effective_leg(&self) -> Leg {
        self.leg.unwrap_or(Leg::Departure)
    }
}
