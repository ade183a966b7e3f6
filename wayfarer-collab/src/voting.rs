use std::collections::BTreeMap;

use log::{info, warn};
use serde::Serialize;
use wayfarer_core::{
    voting::{Consensus, LegRanking, LockOutcome, RoomBallot, TopPreference},
    CacheKey, ClientCacheExt, RoomId, RoomStatus, Session, Suggestion, SuggestionId, Vote,
    VoteDirection,
};

use crate::{PlannerContext, PlannerError, PlannerResult, PlanningEvent};

pub struct VotingManager {
    context: PlannerContext,
}

/// The ranked preferences of a room alongside the raw like counts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopPreferences {
    pub ranked: Vec<TopPreference>,
    pub counts: BTreeMap<SuggestionId, usize>,
    /// Only present in transportation rooms
    pub legs: Option<LegRanking>,
}

impl VotingManager {
    pub fn new(context: &PlannerContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Returns the suggestions of a room.
    ///
    /// Suggestions cached within their window are reused. If the database can't be
    /// reached, an expired copy is better than nothing.
    pub async fn suggestions(&self, room_id: RoomId) -> PlannerResult<Vec<Suggestion>> {
        let key = CacheKey::Suggestions(room_id);
        let now = self.context.clock.now();
        let ttl = self.context.config.suggestion_cache_ttl();

        let cached = self.context.cache.get(&key).and_then(|entry| {
            let is_fresh = entry.is_fresh(now, ttl);
            serde_json::from_value::<Vec<Suggestion>>(entry.value)
                .ok()
                .map(|suggestions| (suggestions, is_fresh))
        });

        let expired = match cached {
            Some((suggestions, true)) => return Ok(suggestions),
            Some((suggestions, false)) => Some(suggestions),
            None => None,
        };

        match self.context.database.suggestions(room_id).await {
            Ok(suggestions) => {
                self.context.cache.write(key, &suggestions, now);
                Ok(suggestions)
            }
            Err(e) => match expired {
                Some(expired) => {
                    warn!(
                        "Could not load suggestions of room {}, using an expired copy: {}",
                        room_id, e
                    );
                    Ok(expired)
                }
                None => Err(e.into()),
            },
        }
    }

    /// Asks the suggestion service for candidates based on every answer in the room.
    pub async fn generate_suggestions(&self, room_id: RoomId) -> PlannerResult<Vec<Suggestion>> {
        let generator = self
            .context
            .generator
            .as_ref()
            .ok_or(PlannerError::NoGenerator)?;

        let database = &self.context.database;
        let room = database.room_by_id(room_id).await?;
        let group = database.group_by_id(room.group_id).await?;
        let answers = database.answers(room_id, None).await?;

        let generated = generator.generate(&group, &room, &answers).await?;
        database.store_suggestions(room_id, generated).await?;

        let suggestions = database.suggestions(room_id).await?;
        self.context.cache.write(
            CacheKey::Suggestions(room_id),
            &suggestions,
            self.context.clock.now(),
        );

        info!(
            "Generated suggestions for room {}, it now has {}",
            room_id,
            suggestions.len()
        );

        self.context.emit(PlanningEvent::SuggestionsGenerated {
            room_id,
            suggestion_ids: suggestions.iter().map(|s| s.id).collect(),
        });

        Ok(suggestions)
    }

    /// Loads a room with its current suggestions and votes
    pub async fn ballot(&self, room_id: RoomId) -> PlannerResult<RoomBallot> {
        let database = &self.context.database;

        let room = database.room_by_id(room_id).await?;
        let suggestions = database.suggestions(room_id).await?;
        let votes = database.room_votes(room_id).await?;

        Ok(RoomBallot::new(room, suggestions, votes))
    }

    /// Records the member's vote, replacing any earlier vote on the same suggestion.
    pub async fn record_vote(
        &self,
        room_id: RoomId,
        session: &Session,
        suggestion_id: SuggestionId,
        direction: VoteDirection,
    ) -> PlannerResult<Vote> {
        session.member_id()?;

        let mut ballot = self.ballot(room_id).await?;
        let vote = ballot.cast(session, suggestion_id, direction)?;

        self.context.database.submit_vote(&vote).await?;
        self.context.emit(PlanningEvent::VoteRecorded {
            room_id,
            suggestion_id,
            member_id: vote.member_id,
            direction,
        });

        Ok(vote)
    }

    pub async fn top_preferences(&self, room_id: RoomId) -> PlannerResult<TopPreferences> {
        let ballot = self.ballot(room_id).await?;
        let consensus = ballot.consensus();

        Ok(TopPreferences {
            ranked: consensus.liked,
            counts: ballot.tally().counts(),
            legs: consensus.legs,
        })
    }

    /// Fixes the decision of a room.
    ///
    /// If every member already marked the room as done, it completes right away.
    pub async fn lock(
        &self,
        room_id: RoomId,
        suggestion_ids: &[SuggestionId],
    ) -> PlannerResult<LockOutcome> {
        let mut ballot = self.ballot(room_id).await?;
        let outcome = ballot.lock(suggestion_ids)?;

        if outcome != LockOutcome::Locked {
            return Ok(outcome);
        }

        let database = &self.context.database;
        let selected = ballot.room().selected.clone();

        database.lock_room(room_id, &selected).await?;
        info!("Locked room {} to {:?}", room_id, selected);

        self.context.emit(PlanningEvent::RoomLocked {
            room_id,
            suggestion_ids: selected,
        });

        let mut room = ballot.into_room();
        let group = database.group_by_id(room.group_id).await?;

        if room.settle_completion(group.group_size) {
            database
                .update_room_status(room_id, RoomStatus::Completed)
                .await?;
            self.context.emit(PlanningEvent::RoomCompleted { room_id });
        }

        Ok(outcome)
    }

    pub async fn consensus(&self, room_id: RoomId) -> PlannerResult<Consensus> {
        Ok(self.ballot(room_id).await?.consensus())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::Duration;
    use wayfarer_core::{
        voting::LockOutcome, Category, CoreError, Leg, RoomStatus, Session, VoteDirection,
    };

    use crate::{
        testing::{
            drain_events, new_group, planner, planner_with_generator, room_of, suggestion,
            StaticGenerator,
        },
        Database, FailPoint, PlannerError, PlanningEvent,
    };

    #[tokio::test]
    async fn later_votes_replace_earlier_ones() {
        let test = planner();
        let voting = &test.planner.voting;
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let room = room_of(&rooms, Category::Activities);

        let stored = test
            .database
            .store_suggestions(
                room.id,
                vec![suggestion("Surfing", None), suggestion("Museum", None)],
            )
            .await
            .unwrap();
        let (surfing, museum) = (stored[0].id, stored[1].id);

        voting
            .record_vote(room.id, &Session::new(1), surfing, VoteDirection::Up)
            .await
            .unwrap();
        voting
            .record_vote(room.id, &Session::new(2), museum, VoteDirection::Up)
            .await
            .unwrap();
        voting
            .record_vote(room.id, &Session::new(1), museum, VoteDirection::Up)
            .await
            .unwrap();
        voting
            .record_vote(room.id, &Session::new(1), surfing, VoteDirection::Down)
            .await
            .unwrap();

        let preferences = voting.top_preferences(room.id).await.unwrap();

        assert_eq!(preferences.ranked.len(), 1);
        assert_eq!(preferences.ranked[0].suggestion_id, museum);
        assert_eq!(preferences.ranked[0].likes, 2);
        assert_eq!(preferences.counts.get(&surfing), Some(&0));
        assert!(preferences.legs.is_none());
    }

    #[tokio::test]
    async fn votes_need_a_member_and_a_known_suggestion() {
        let test = planner();
        let voting = &test.planner.voting;
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let dining = room_of(&rooms, Category::Dining);
        let activities = room_of(&rooms, Category::Activities);

        let stored = test
            .database
            .store_suggestions(activities.id, vec![suggestion("Surfing", None)])
            .await
            .unwrap();

        let result = voting
            .record_vote(dining.id, &Session::anonymous(), stored[0].id, VoteDirection::Up)
            .await;
        assert!(matches!(
            result,
            Err(PlannerError::Core(CoreError::Unauthenticated))
        ));

        let result = voting
            .record_vote(dining.id, &Session::new(1), stored[0].id, VoteDirection::Up)
            .await;
        assert!(matches!(result, Err(PlannerError::Core(CoreError::Validation(_)))));
        assert!(test.database.room_votes(activities.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn locking_requires_a_liked_suggestion() {
        let test = planner();
        let voting = &test.planner.voting;
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let room = room_of(&rooms, Category::Accommodation);

        let stored = test
            .database
            .store_suggestions(
                room.id,
                vec![suggestion("Hotel", None), suggestion("Hostel", None)],
            )
            .await
            .unwrap();

        let outcome = voting.lock(room.id, &[stored[0].id]).await.unwrap();
        assert_eq!(outcome, LockOutcome::NothingToLock);
        assert_eq!(
            test.database.room_by_id(room.id).await.unwrap().status,
            RoomStatus::Active
        );

        voting
            .record_vote(room.id, &Session::new(1), stored[1].id, VoteDirection::Up)
            .await
            .unwrap();
        drain_events(&test.planner);

        let outcome = voting.lock(room.id, &[stored[0].id]).await.unwrap();
        assert_eq!(outcome, LockOutcome::Locked);
        assert_eq!(
            drain_events(&test.planner),
            vec![PlanningEvent::RoomLocked {
                room_id: room.id,
                suggestion_ids: vec![stored[0].id],
            }]
        );

        let outcome = voting.lock(room.id, &[stored[0].id]).await.unwrap();
        assert_eq!(outcome, LockOutcome::Unchanged);

        let result = voting.lock(room.id, &[stored[1].id]).await;
        assert!(matches!(
            result,
            Err(PlannerError::Core(CoreError::RoomAlreadyLocked { .. }))
        ));

        let consensus = voting.consensus(room.id).await.unwrap();
        assert!(consensus.is_locked);
        assert_eq!(consensus.final_decision[0].name, "Hotel");
        assert_eq!(consensus.liked[0].name, "Hostel");
    }

    #[tokio::test]
    async fn transportation_ranks_each_leg() {
        let test = planner();
        let voting = &test.planner.voting;
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let room = room_of(&rooms, Category::Transportation);

        let stored = test
            .database
            .store_suggestions(
                room.id,
                vec![
                    suggestion("Morning flight", Some(Leg::Departure)),
                    suggestion("Night train", Some(Leg::Return)),
                ],
            )
            .await
            .unwrap();

        for item in &stored {
            voting
                .record_vote(room.id, &Session::new(1), item.id, VoteDirection::Up)
                .await
                .unwrap();
        }

        let legs = voting.top_preferences(room.id).await.unwrap().legs.unwrap();
        assert_eq!(legs.departure[0].name, "Morning flight");
        assert_eq!(legs.return_leg[0].name, "Night train");
    }

    #[tokio::test]
    async fn expired_suggestions_cover_for_outages() {
        let test = planner();
        let voting = &test.planner.voting;
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let room = room_of(&rooms, Category::Dining);

        test.database
            .store_suggestions(room.id, vec![suggestion("Tasca", None)])
            .await
            .unwrap();

        assert_eq!(voting.suggestions(room.id).await.unwrap().len(), 1);

        test.clock.advance(Duration::hours(1));
        test.database.fail(FailPoint::Suggestions);

        let fallback = voting.suggestions(room.id).await.unwrap();
        assert_eq!(fallback[0].name, "Tasca");

        let other = room_of(&rooms, Category::Activities);
        assert!(voting.suggestions(other.id).await.is_err());
    }

    #[tokio::test]
    async fn generates_suggestions_when_a_service_is_configured() {
        let test = planner();
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let room = room_of(&rooms, Category::Dining);

        let result = test.planner.voting.generate_suggestions(room.id).await;
        assert!(matches!(result, Err(PlannerError::NoGenerator)));

        let generator = StaticGenerator {
            names: vec!["Tasca", "Marisqueira"],
        };
        let test = planner_with_generator(Some(Arc::new(generator)));
        let (_, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();
        let room = room_of(&rooms, Category::Dining);

        let generated = test
            .planner
            .voting
            .generate_suggestions(room.id)
            .await
            .unwrap();

        assert_eq!(generated.len(), 2);
        assert_eq!(test.planner.voting.suggestions(room.id).await.unwrap(), generated);
        assert!(drain_events(&test.planner)
            .iter()
            .any(|e| matches!(e, PlanningEvent::SuggestionsGenerated { .. })));
    }
}
