//! Turns member votes into ranked preferences and final decisions.

mod consensus;

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

pub use consensus::*;

use crate::{Leg, MemberId, Suggestion, SuggestionId, Vote, VoteDirection};

/// A suggestion ranked by how many members like it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopPreference {
    pub suggestion_id: SuggestionId,
    pub name: String,
    pub likes: usize,
}

/// Transportation rankings, split by which way the trip goes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegRanking {
    pub departure: Vec<TopPreference>,
    #[serde(rename = "return")]
    pub return_leg: Vec<TopPreference>,
}

/// The latest vote of every member on every suggestion.
///
/// Always built from the complete set of current votes, so rebuilding it from
/// a re-fetch, or from votes delivered out of order, gives the same counts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VoteTally {
    votes: HashMap<(SuggestionId, MemberId), VoteDirection>,
}

impl VoteTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tally where later votes by the same member replace earlier ones.
    pub fn from_votes<I>(votes: I) -> Self
    where
        I: IntoIterator<Item = Vote>,
    {
        let mut tally = Self::new();

        for vote in votes {
            tally.record(vote);
        }

        tally
    }

    /// Records a vote, replacing the member's previous vote on the same suggestion.
    pub fn record(&mut self, vote: Vote) {
        self.votes
            .insert((vote.suggestion_id, vote.member_id), vote.direction);
    }

    /// The number of distinct members whose latest vote on the suggestion is up.
    pub fn likes(&self, suggestion_id: SuggestionId) -> usize {
        self.votes
            .iter()
            .filter(|((s, _), d)| *s == suggestion_id && **d == VoteDirection::Up)
            .count()
    }

    /// Like counts of every suggestion that has received a vote.
    pub fn counts(&self) -> BTreeMap<SuggestionId, usize> {
        let mut counts = BTreeMap::new();

        for ((suggestion_id, _), direction) in &self.votes {
            let count = counts.entry(*suggestion_id).or_insert(0);

            if *direction == VoteDirection::Up {
                *count += 1;
            }
        }

        counts
    }

    /// The latest vote of a member on a suggestion, if any.
    pub fn vote_of(
        &self,
        suggestion_id: SuggestionId,
        member_id: MemberId,
    ) -> Option<VoteDirection> {
        self.votes.get(&(suggestion_id, member_id)).copied()
    }

    /// Ranks the liked suggestions by like count, breaking ties by suggestion id.
    pub fn rank(&self, suggestions: &[Suggestion]) -> Vec<TopPreference> {
        let counts = self.counts();

        let mut ranked: Vec<_> = suggestions
            .iter()
            .filter_map(|s| {
                let likes = counts.get(&s.id).copied().unwrap_or_default();

                (likes > 0).then(|| TopPreference {
                    suggestion_id: s.id,
                    name: s.name.clone(),
                    likes,
                })
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.likes
                .cmp(&a.likes)
                .then(a.suggestion_id.cmp(&b.suggestion_id))
        });
        ranked.dedup_by_key(|p| p.suggestion_id);

        ranked
    }

    /// Ranks departure and return suggestions independently.
    pub fn rank_by_leg(&self, suggestions: &[Suggestion]) -> LegRanking {
        let (departure, return_leg): (Vec<_>, Vec<_>) = suggestions
            .iter()
            .cloned()
            .partition(|s| s.effective_leg() == Leg::Departure);

        LegRanking {
            departure: self.rank(&departure),
            return_leg: self.rank(&return_leg),
        }
    }
}
