use log::info;
use wayfarer_core::{
    CacheKey, CoreError, Group, GroupId, GroupUpdate, MemberId, NewGroup, Room, RoomStatus, Session,
};

use crate::{PlannerContext, PlannerResult, PlanningEvent};

pub struct GroupManager {
    context: PlannerContext,
}

/// Whether the member agreed to discard the voting progress of every room
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetConfirmation {
    Unconfirmed,
    Confirmed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupUpdateOutcome {
    pub group: Group,
    /// True if the destination changed and the rooms were reopened
    pub reset: bool,
}

impl GroupManager {
    pub fn new(context: &PlannerContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Creates a group and its four rooms
    pub async fn create_group(&self, new_group: NewGroup) -> PlannerResult<(Group, Vec<Room>)> {
        new_group.validate()?;

        let group = self.context.database.create_group(new_group).await?;
        let rooms = self.context.database.rooms_by_group(group.id).await?;

        info!("Created group {} ({})", group.name, group.id);
        self.context
            .emit(PlanningEvent::GroupCreated { group_id: group.id });

        Ok((group, rooms))
    }

    pub async fn group(&self, group_id: GroupId) -> PlannerResult<Group> {
        Ok(self.context.database.group_by_id(group_id).await?)
    }

    pub async fn rooms(&self, group_id: GroupId) -> PlannerResult<Vec<Room>> {
        Ok(self.context.database.rooms_by_group(group_id).await?)
    }

    /// Returns the session of a member, with the currency of the group's origin
    pub async fn session(
        &self,
        group_id: GroupId,
        member_id: Option<MemberId>,
    ) -> PlannerResult<Session> {
        let group = self.group(group_id).await?;
        Ok(Session::anonymous()
            .with_member(member_id)
            .for_origin(&group.origin))
    }

    /// Applies an update to a group.
    ///
    /// Changing the destination discards the suggestions, votes, and decisions of every
    /// room, so it is refused unless confirmed. Answers and completion records are kept.
    pub async fn update_group(
        &self,
        group_id: GroupId,
        update: GroupUpdate,
        confirmation: ResetConfirmation,
    ) -> PlannerResult<GroupUpdateOutcome> {
        let group = self.group(group_id).await?;
        let updated = group.apply(&update)?;
        let reset = group.destination_changes(&update);

        if reset && confirmation == ResetConfirmation::Unconfirmed {
            return Err(CoreError::ResetNotConfirmed.into());
        }

        // Rooms are reset first so a failed attempt can simply be retried
        if reset {
            self.reset_rooms(group_id).await?;
        }

        let group = self.context.database.update_group(&updated).await?;
        self.context
            .emit(PlanningEvent::GroupUpdated { group_id: group.id });

        Ok(GroupUpdateOutcome { group, reset })
    }

    async fn reset_rooms(&self, group_id: GroupId) -> PlannerResult<()> {
        let database = &self.context.database;
        let rooms = database.rooms_by_group(group_id).await?;

        for room in &rooms {
            database.clear_room_voting_data(room.id).await?;
            database
                .update_room_status(room.id, RoomStatus::Active)
                .await?;

            self.context
                .cache
                .remove(&CacheKey::Suggestions(room.id));
        }

        let room_ids: Vec<_> = rooms.iter().map(|r| r.id).collect();
        info!("Reset rooms {:?} of group {}", room_ids, group_id);

        self.context
            .emit(PlanningEvent::GroupReset { group_id, room_ids });

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use wayfarer_core::{
        Answer, AnswerValue, Category, CoreError, GroupUpdate, Leg, RoomStatus, Session,
        VoteDirection,
    };

    use crate::{
        testing::{drain_events, new_group, planner, room_of, suggestion},
        Database, PlannerError, PlanningEvent, ResetConfirmation,
    };

    #[tokio::test]
    async fn creates_a_room_per_category() {
        let test = planner();
        let (group, rooms) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();

        assert_eq!(rooms.len(), 4);
        assert!(rooms.iter().all(|r| r.group_id == group.id));
        assert_eq!(
            drain_events(&test.planner),
            vec![PlanningEvent::GroupCreated { group_id: group.id }]
        );
    }

    #[tokio::test]
    async fn rejects_invalid_groups() {
        let test = planner();
        let mut invalid = new_group("Lisbon", 2);
        invalid.group_size = 0;

        let result = test.planner.groups.create_group(invalid).await;
        assert!(matches!(result, Err(PlannerError::Core(CoreError::Validation(_)))));
    }

    #[tokio::test]
    async fn destination_change_needs_confirmation() {
        let test = planner();
        let (group, _) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();

        let update = GroupUpdate {
            destination: Some("Porto".to_string()),
            ..Default::default()
        };

        let result = test
            .planner
            .groups
            .update_group(group.id, update, ResetConfirmation::Unconfirmed)
            .await;

        assert!(matches!(
            result,
            Err(PlannerError::Core(CoreError::ResetNotConfirmed))
        ));

        let unchanged = test.planner.groups.group(group.id).await.unwrap();
        assert_eq!(unchanged.destination, "Lisbon");
    }

    #[tokio::test]
    async fn confirmed_destination_change_reopens_every_room() {
        let test = planner();
        let groups = &test.planner.groups;
        let (group, rooms) = groups.create_group(new_group("Lisbon", 2)).await.unwrap();
        let room = room_of(&rooms, Category::Accommodation);
        let member = Session::new(1);

        let stored = test
            .database
            .store_suggestions(room.id, vec![suggestion("Hotel A", None)])
            .await
            .unwrap();

        test.planner
            .voting
            .record_vote(room.id, &member, stored[0].id, VoteDirection::Up)
            .await
            .unwrap();
        test.planner.voting.lock(room.id, &[stored[0].id]).await.unwrap();
        test.planner
            .results
            .mark_complete(room.id, &member)
            .await
            .unwrap();

        test.database.regenerate_questions(room.id).await.unwrap();
        let question = test.database.questions(room.id).await.unwrap().remove(0);
        let answer = Answer::new(question.id, 1, AnswerValue::Scalar("Yes".into()));
        test.database.submit_answer(room.id, &answer).await.unwrap();

        drain_events(&test.planner);

        let update = GroupUpdate {
            destination: Some("Porto".to_string()),
            ..Default::default()
        };
        let outcome = groups
            .update_group(group.id, update, ResetConfirmation::Confirmed)
            .await
            .unwrap();

        assert!(outcome.reset);
        assert_eq!(outcome.group.destination, "Porto");

        let room = test.database.room_by_id(room.id).await.unwrap();
        assert_eq!(room.status, RoomStatus::Active);
        assert!(room.selected.is_empty());
        assert!(room.completed_by.contains(&1));

        assert!(test.database.suggestions(room.id).await.unwrap().is_empty());
        assert!(test.database.room_votes(room.id).await.unwrap().is_empty());
        assert_eq!(test.database.answers(room.id, None).await.unwrap().len(), 1);

        let events = drain_events(&test.planner);
        assert!(events.iter().any(|e| matches!(
            e,
            PlanningEvent::GroupReset { room_ids, .. } if room_ids.len() == 4
        )));
    }

    #[tokio::test]
    async fn other_updates_keep_voting_progress() {
        let test = planner();
        let groups = &test.planner.groups;
        let (group, rooms) = groups.create_group(new_group("Lisbon", 2)).await.unwrap();
        let room = room_of(&rooms, Category::Transportation);

        test.database
            .store_suggestions(room.id, vec![suggestion("Train", Some(Leg::Departure))])
            .await
            .unwrap();

        let update = GroupUpdate {
            name: Some("Autumn trip".to_string()),
            destination: Some("LISBON".to_string()),
            ..Default::default()
        };
        let outcome = groups
            .update_group(group.id, update, ResetConfirmation::Unconfirmed)
            .await
            .unwrap();

        assert!(!outcome.reset);
        assert_eq!(outcome.group.name, "Autumn trip");
        assert_eq!(test.database.suggestions(room.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn sessions_use_the_currency_of_the_origin() {
        let test = planner();
        let (group, _) = test
            .planner
            .groups
            .create_group(new_group("Lisbon", 2))
            .await
            .unwrap();

        let session = test.planner.groups.session(group.id, Some(4)).await.unwrap();
        assert_eq!(session.currency(), "EUR");
        assert_eq!(session.member(), Some(4));
    }
}
