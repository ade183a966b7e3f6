use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use parking_lot::Mutex;
use wayfarer_core::{
    catalog::default_catalog, currency_for_origin, Answer, Category, Group, GroupId, MemberId,
    NewGroup, NewSuggestion, PrimaryKey, Question, QuestionId, Room, RoomId, RoomStatus,
    Suggestion, SuggestionId, Vote,
};

use crate::{Database, DatabaseError, Result};

/// Operations of [MemoryDatabase] that can be made to fail on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    Questions,
    RegenerateQuestions,
    Answers,
    SubmitAnswer(QuestionId),
    Suggestions,
    RoomVotes,
}

/// A database kept entirely in memory.
/// Used when no database url is configured, and in tests.
#[derive(Debug, Default)]
pub struct MemoryDatabase {
    state: Mutex<MemoryState>,
    failures: Mutex<HashSet<FailPoint>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    last_id: PrimaryKey,
    groups: BTreeMap<GroupId, Group>,
    rooms: BTreeMap<RoomId, Room>,
    questions: BTreeMap<QuestionId, Question>,
    answers: BTreeMap<(QuestionId, MemberId), (RoomId, Answer)>,
    suggestions: BTreeMap<SuggestionId, Suggestion>,
    votes: BTreeMap<(SuggestionId, MemberId), Vote>,
}

impl MemoryState {
    fn next_id(&mut self) -> PrimaryKey {
        self.last_id += 1;
        self.last_id
    }

    fn room_mut(&mut self, room_id: RoomId) -> Result<&mut Room> {
        self.rooms.get_mut(&room_id).ok_or(DatabaseError::NotFound {
            resource: "room",
            identifier: "id",
        })
    }

    /// Answers to replaced questions are dropped with them.
    fn replace_questions(&mut self, room_id: RoomId, questions: Vec<Question>) {
        self.questions.retain(|_, q| q.room_id != room_id);
        self.answers.retain(|_, (r, _)| *r != room_id);

        for mut question in questions {
            if question.id <= 0 {
                question.id = self.next_id();
            }

            question.room_id = room_id;
            self.questions.insert(question.id, question);
        }
    }
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every following call of the operation fail until [Self::recover] is called.
    pub fn fail(&self, point: FailPoint) {
        self.failures.lock().insert(point);
    }

    pub fn recover(&self, point: FailPoint) {
        self.failures.lock().remove(&point);
    }

    /// Replaces the stored questions of a room.
    /// Questions without a positive id are assigned one.
    pub fn seed_questions(&self, room_id: RoomId, questions: Vec<Question>) {
        self.state.lock().replace_questions(room_id, questions);
    }

    fn check(&self, point: FailPoint) -> Result<()> {
        if self.failures.lock().contains(&point) {
            let error = std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("Injected failure at {:?}", point),
            );

            return Err(DatabaseError::Internal(Box::new(error)));
        }

        Ok(())
    }
}

fn group_not_found() -> DatabaseError {
    DatabaseError::NotFound {
        resource: "group",
        identifier: "id",
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    async fn create_group(&self, new_group: NewGroup) -> Result<Group> {
        let mut state = self.state.lock();

        let group = Group {
            id: state.next_id(),
            name: new_group.name,
            origin: new_group.origin,
            destination: new_group.destination,
            start_date: new_group.start_date,
            end_date: new_group.end_date,
            group_size: new_group.group_size,
        };

        for category in Category::ALL {
            let room = Room::new(state.next_id(), group.id, category);
            state.rooms.insert(room.id, room);
        }

        state.groups.insert(group.id, group.clone());
        Ok(group)
    }

    async fn group_by_id(&self, group_id: GroupId) -> Result<Group> {
        self.state
            .lock()
            .groups
            .get(&group_id)
            .cloned()
            .ok_or_else(group_not_found)
    }

    async fn update_group(&self, group: &Group) -> Result<Group> {
        let mut state = self.state.lock();
        let stored = state.groups.get_mut(&group.id).ok_or_else(group_not_found)?;

        *stored = group.clone();
        Ok(stored.clone())
    }

    async fn room_by_id(&self, room_id: RoomId) -> Result<Room> {
        self.state.lock().room_mut(room_id).map(|r| r.clone())
    }

    async fn rooms_by_group(&self, group_id: GroupId) -> Result<Vec<Room>> {
        let state = self.state.lock();

        if !state.groups.contains_key(&group_id) {
            return Err(group_not_found());
        }

        Ok(state
            .rooms
            .values()
            .filter(|r| r.group_id == group_id)
            .cloned()
            .collect())
    }

    async fn update_room_status(&self, room_id: RoomId, status: RoomStatus) -> Result<()> {
        self.state.lock().room_mut(room_id)?.status = status;
        Ok(())
    }

    async fn lock_room(&self, room_id: RoomId, suggestion_ids: &[SuggestionId]) -> Result<()> {
        let mut state = self.state.lock();
        let room = state.room_mut(room_id)?;

        room.status = RoomStatus::Locked;
        room.selected = suggestion_ids.to_vec();
        Ok(())
    }

    async fn mark_complete(&self, room_id: RoomId, member_id: MemberId) -> Result<Room> {
        let mut state = self.state.lock();
        let room = state.room_mut(room_id)?;

        room.completed_by.insert(member_id);
        Ok(room.clone())
    }

    async fn clear_room_voting_data(&self, room_id: RoomId) -> Result<()> {
        let mut state = self.state.lock();
        state.room_mut(room_id)?.selected.clear();

        let removed: HashSet<SuggestionId> = state
            .suggestions
            .values()
            .filter(|s| s.room_id == room_id)
            .map(|s| s.id)
            .collect();

        state.suggestions.retain(|id, _| !removed.contains(id));
        state
            .votes
            .retain(|(suggestion_id, _), _| !removed.contains(suggestion_id));

        Ok(())
    }

    async fn questions(&self, room_id: RoomId) -> Result<Vec<Question>> {
        self.check(FailPoint::Questions)?;

        Ok(self
            .state
            .lock()
            .questions
            .values()
            .filter(|q| q.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn regenerate_questions(&self, room_id: RoomId) -> Result<()> {
        self.check(FailPoint::RegenerateQuestions)?;

        let mut state = self.state.lock();
        let room = state.room_mut(room_id)?.clone();
        let group = state
            .groups
            .get(&room.group_id)
            .ok_or_else(group_not_found)?;

        let currency = currency_for_origin(&group.origin);
        let catalog = default_catalog(room_id, room.category, currency);

        state.replace_questions(room_id, catalog);
        Ok(())
    }

    async fn answers(&self, room_id: RoomId, member_id: Option<MemberId>) -> Result<Vec<Answer>> {
        self.check(FailPoint::Answers)?;

        Ok(self
            .state
            .lock()
            .answers
            .values()
            .filter(|(r, a)| *r == room_id && member_id.map_or(true, |m| a.is_owned_by(m)))
            .map(|(_, a)| a.clone())
            .collect())
    }

    async fn submit_answer(&self, room_id: RoomId, answer: &Answer) -> Result<()> {
        self.check(FailPoint::SubmitAnswer(answer.question_id))?;

        let mut state = self.state.lock();
        let member_id = answer.member_id.ok_or(DatabaseError::NotFound {
            resource: "member",
            identifier: "id",
        })?;

        let belongs = state
            .questions
            .get(&answer.question_id)
            .is_some_and(|q| q.room_id == room_id);

        if !belongs {
            return Err(DatabaseError::NotFound {
                resource: "question",
                identifier: "id",
            });
        }

        state
            .answers
            .insert((answer.question_id, member_id), (room_id, answer.clone()));

        Ok(())
    }

    async fn suggestions(&self, room_id: RoomId) -> Result<Vec<Suggestion>> {
        self.check(FailPoint::Suggestions)?;

        Ok(self
            .state
            .lock()
            .suggestions
            .values()
            .filter(|s| s.room_id == room_id)
            .cloned()
            .collect())
    }

    async fn store_suggestions(
        &self,
        room_id: RoomId,
        suggestions: Vec<NewSuggestion>,
    ) -> Result<Vec<Suggestion>> {
        let mut state = self.state.lock();
        state.room_mut(room_id)?;

        let stored: Vec<_> = suggestions
            .into_iter()
            .map(|s| Suggestion {
                id: state.next_id(),
                room_id,
                name: s.name,
                description: s.description,
                details: s.details,
                leg: s.leg,
            })
            .collect();

        for suggestion in &stored {
            state.suggestions.insert(suggestion.id, suggestion.clone());
        }

        Ok(stored)
    }

    async fn submit_vote(&self, vote: &Vote) -> Result<()> {
        let mut state = self.state.lock();

        if !state.suggestions.contains_key(&vote.suggestion_id) {
            return Err(DatabaseError::NotFound {
                resource: "suggestion",
                identifier: "id",
            });
        }

        state
            .votes
            .insert((vote.suggestion_id, vote.member_id), *vote);

        Ok(())
    }

    async fn votes(&self, suggestion_id: SuggestionId) -> Result<Vec<Vote>> {
        Ok(self
            .state
            .lock()
            .votes
            .values()
            .filter(|v| v.suggestion_id == suggestion_id)
            .copied()
            .collect())
    }

    async fn room_votes(&self, room_id: RoomId) -> Result<Vec<Vote>> {
        self.check(FailPoint::RoomVotes)?;

        let state = self.state.lock();

        Ok(state
            .votes
            .values()
            .filter(|v| {
                state
                    .suggestions
                    .get(&v.suggestion_id)
                    .is_some_and(|s| s.room_id == room_id)
            })
            .copied()
            .collect())
    }
}
