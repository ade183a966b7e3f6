use std::collections::BTreeMap;

use log::{debug, info, warn};
use serde::Serialize;
use tokio::sync::watch;
use wayfarer_core::{
    completion::CompletionStatus,
    itinerary::{synthesize, CategoryPreferences, Day},
    voting::Consensus,
    Category, GroupId, Room, RoomId, RoomStatus, Session,
};

use crate::{AnswerManager, PlannerContext, PlannerResult, PlanningEvent, VotingManager};

#[derive(Clone)]
pub struct ResultsManager {
    context: PlannerContext,
}

/// Everything the group has decided in one room
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoomResults {
    pub room: Room,
    pub consensus: Consensus,
    pub completion: CompletionStatus,
}

pub type ConsolidatedResults = BTreeMap<RoomId, RoomResults>;

impl ResultsManager {
    pub fn new(context: &PlannerContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Records that the member is done with a room.
    /// A locked room completes once every member is done.
    pub async fn mark_complete(
        &self,
        room_id: RoomId,
        session: &Session,
    ) -> PlannerResult<CompletionStatus> {
        let member_id = session.member_id()?;
        let database = &self.context.database;

        let mut room = database.room_by_id(room_id).await?;
        let newly_completed = room.mark_complete(session)?;

        if newly_completed {
            room = database.mark_complete(room_id, member_id).await?;
            self.context
                .emit(PlanningEvent::MemberCompleted { room_id, member_id });
        }

        let group = database.group_by_id(room.group_id).await?;

        if room.settle_completion(group.group_size) {
            database
                .update_room_status(room_id, RoomStatus::Completed)
                .await?;

            info!("Every member completed room {}", room_id);
            self.context.emit(PlanningEvent::RoomCompleted { room_id });
        }

        Ok(room.completion(group.group_size))
    }

    pub async fn completion(&self, room_id: RoomId) -> PlannerResult<CompletionStatus> {
        let database = &self.context.database;

        let room = database.room_by_id(room_id).await?;
        let group = database.group_by_id(room.group_id).await?;

        Ok(room.completion(group.group_size))
    }

    /// The outcome and completion of every room of a group
    pub async fn consolidated(&self, group_id: GroupId) -> PlannerResult<ConsolidatedResults> {
        let voting = VotingManager::new(&self.context);
        let group = self.context.database.group_by_id(group_id).await?;
        let rooms = self.context.database.rooms_by_group(group_id).await?;

        let mut results = BTreeMap::new();

        for room in rooms {
            let ballot = voting.ballot(room.id).await?;

            let room_results = RoomResults {
                consensus: ballot.consensus(),
                completion: room.completion(group.group_size),
                room: ballot.into_room(),
            };

            results.insert(room_results.room.id, room_results);
        }

        Ok(results)
    }

    /// Lays the decisions of the group out over the days of the trip.
    ///
    /// Rooms without liked suggestions fall back to what members selected in their answers.
    pub async fn itinerary(&self, group_id: GroupId) -> PlannerResult<Vec<Day>> {
        let answers = AnswerManager::new(&self.context);
        let group = self.context.database.group_by_id(group_id).await?;
        let consolidated = self.consolidated(group_id).await?;

        let mut preferences = CategoryPreferences::new();

        for (room_id, results) in consolidated {
            let category = results.room.category;
            let consensus = results.consensus;

            let ranked = match (consensus.is_locked, consensus.legs) {
                (true, _) => consensus.final_decision,
                (false, Some(legs)) if category == Category::Transportation => legs.departure,
                (false, _) => consensus.liked,
            };

            let selections = answers.selections(room_id).await.unwrap_or_else(|e| {
                warn!("Could not load selections of room {}: {}", room_id, e);
                vec![]
            });

            preferences.set_ranked(category, ranked);
            preferences.set_selections(category, selections);
        }

        Ok(synthesize(&group, &preferences))
    }

    /// Recomputes the consolidated results of a group periodically.
    ///
    /// Stops once every receiver has been dropped. Must be called within a tokio runtime.
    pub fn watch(&self, group_id: GroupId) -> watch::Receiver<Option<ConsolidatedResults>> {
        let (sender, receiver) = watch::channel(None);
        let manager = self.clone();
        let interval = self.context.config.results_refresh_interval();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);

            loop {
                ticker.tick().await;

                if sender.is_closed() {
                    break;
                }

                match manager.consolidated(group_id).await {
                    Ok(results) => {
                        if sender.send(Some(results)).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("Could not refresh results of group {}: {}", group_id, e),
                }
            }

            debug!("Stopped watching results of group {}", group_id);
        });

        receiver
    }
}
