use serde::Serialize;

use crate::{
    Category, CoreError, CoreResult, Room, RoomStatus, Session, Suggestion, SuggestionId,
    ValidationError, Vote, VoteDirection,
};

use super::{LegRanking, TopPreference, VoteTally};

/// What happened when a lock was requested
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LockOutcome {
    /// The room moved from active to locked
    Locked,
    /// The room was already locked to exactly this decision
    Unchanged,
    /// Nobody likes any suggestion yet, so there is nothing to lock
    NothingToLock,
}

/// The group outcome of a room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Consensus {
    /// Liked suggestions, most liked first
    pub liked: Vec<TopPreference>,
    /// The locked decision, in the order it was supplied
    pub final_decision: Vec<TopPreference>,
    pub is_locked: bool,
    /// Transportation rooms rank departures and returns separately
    pub legs: Option<LegRanking>,
}

/// A room together with its suggestions and the votes cast on them
#[derive(Debug, Clone)]
pub struct RoomBallot {
    room: Room,
    suggestions: Vec<Suggestion>,
    tally: VoteTally,
}

impl RoomBallot {
    /// Creates a ballot. Suggestions of other rooms are left out.
    pub fn new(room: Room, suggestions: Vec<Suggestion>, votes: Vec<Vote>) -> Self {
        let suggestions: Vec<_> = suggestions
            .into_iter()
            .filter(|s| s.room_id == room.id)
            .collect();

        let tally = VoteTally::from_votes(
            votes
                .into_iter()
                .filter(|v| suggestions.iter().any(|s| s.id == v.suggestion_id)),
        );

        Self {
            room,
            suggestions,
            tally,
        }
    }

    pub fn room(&self) -> &Room {
        &self.room
    }

    pub fn into_room(self) -> Room {
        self.room
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        &self.suggestions
    }

    pub fn tally(&self) -> &VoteTally {
        &self.tally
    }

    /// Records the acting member's vote. Votes on locked rooms are still kept.
    pub fn cast(
        &mut self,
        session: &Session,
        suggestion_id: SuggestionId,
        direction: VoteDirection,
    ) -> CoreResult<Vote> {
        let member_id = session.member_id()?;
        self.ensure_known(suggestion_id)?;

        let vote = Vote {
            suggestion_id,
            member_id,
            direction,
        };

        self.tally.record(vote);
        Ok(vote)
    }

    pub fn rank(&self) -> Vec<TopPreference> {
        self.tally.rank(&self.suggestions)
    }

    pub fn rank_by_leg(&self) -> LegRanking {
        self.tally.rank_by_leg(&self.suggestions)
    }

    /// Fixes the outcome of the room to the given suggestions.
    ///
    /// Nothing changes if the request is invalid or no suggestion has a like yet.
    pub fn lock(&mut self, suggestion_ids: &[SuggestionId]) -> CoreResult<LockOutcome> {
        if suggestion_ids.is_empty() {
            return Err(ValidationError::EmptyLock.into());
        }

        let mut selected: Vec<SuggestionId> = Vec::with_capacity(suggestion_ids.len());

        for id in suggestion_ids {
            self.ensure_known(*id)?;

            if !selected.contains(id) {
                selected.push(*id);
            }
        }

        if self.room.is_locked() {
            return if self.room.selected == selected {
                Ok(LockOutcome::Unchanged)
            } else {
                Err(CoreError::RoomAlreadyLocked {
                    room_id: self.room.id,
                })
            };
        }

        if self.rank().is_empty() {
            return Ok(LockOutcome::NothingToLock);
        }

        self.room.status = RoomStatus::Locked;
        self.room.selected = selected;

        Ok(LockOutcome::Locked)
    }

    pub fn consensus(&self) -> Consensus {
        let final_decision = self
            .room
            .selected
            .iter()
            .filter_map(|id| self.suggestions.iter().find(|s| s.id == *id))
            .map(|s| TopPreference {
                suggestion_id: s.id,
                name: s.name.clone(),
                likes: self.tally.likes(s.id),
            })
            .collect();

        let legs = (self.room.category == Category::Transportation).then(|| self.rank_by_leg());

        Consensus {
            liked: self.rank(),
            final_decision,
            is_locked: self.room.is_locked(),
            legs,
        }
    }

    fn ensure_known(&self, suggestion_id: SuggestionId) -> Result<(), ValidationError> {
        if self.suggestions.iter().any(|s| s.id == suggestion_id) {
            Ok(())
        } else {
            Err(ValidationError::UnknownSuggestion(suggestion_id))
        }
    }
}

impl Consensus {
    /// The picks to display: the final decision once locked, the ranking before.
    pub fn outcome(&self) -> &[TopPreference] {
        if self.is_locked {
            &self.final_decision
        } else {
            &self.liked
        }
    }
}
