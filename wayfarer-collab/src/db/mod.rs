use async_trait::async_trait;
use thiserror::Error;
use wayfarer_core::{
    Answer, Group, GroupId, MemberId, NewGroup, NewSuggestion, Question, Room, RoomId, RoomStatus,
    Suggestion, SuggestionId, Vote,
};

mod memory;
pub use memory::*;

mod pg;
pub use pg::*;

pub type Result<T> = std::result::Result<T, DatabaseError>;
pub type BoxedDatabase = Box<dyn Database>;

#[derive(Debug, Error)]
pub enum DatabaseError {
    /// An unknown or internal error happened with the database
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),
    /// A resource in the database doesn't exist
    #[error("{resource}:{identifier} doesn't exist")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
}

/// Helper trait to reduce boilerplate
pub trait IntoDatabaseError {
    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError;
    fn any(self) -> DatabaseError;
}

/// The persistence layer shared by every member of every group.
///
/// Answers and votes are keyed by question and member, and suggestion and member,
/// respectively. Writing either replaces the previous record for that key.
#[async_trait]
pub trait Database: Send + Sync {
    /// Creates a group along with one room per category
    async fn create_group(&self, new_group: NewGroup) -> Result<Group>;
    async fn group_by_id(&self, group_id: GroupId) -> Result<Group>;
    async fn update_group(&self, group: &Group) -> Result<Group>;

    async fn room_by_id(&self, room_id: RoomId) -> Result<Room>;
    async fn rooms_by_group(&self, group_id: GroupId) -> Result<Vec<Room>>;
    async fn update_room_status(&self, room_id: RoomId, status: RoomStatus) -> Result<()>;
    /// Locks the room and stores the selected suggestions
    async fn lock_room(&self, room_id: RoomId, suggestion_ids: &[SuggestionId]) -> Result<()>;
    /// Records a member as done with the room and returns the updated room
    async fn mark_complete(&self, room_id: RoomId, member_id: MemberId) -> Result<Room>;
    /// Removes the suggestions of a room, every vote on them, and the selected decision
    async fn clear_room_voting_data(&self, room_id: RoomId) -> Result<()>;

    async fn questions(&self, room_id: RoomId) -> Result<Vec<Question>>;
    /// Replaces the questions of a room with the current catalog of its category
    async fn regenerate_questions(&self, room_id: RoomId) -> Result<()>;

    /// Answers of a room, optionally only those of one member
    async fn answers(&self, room_id: RoomId, member_id: Option<MemberId>) -> Result<Vec<Answer>>;
    async fn submit_answer(&self, room_id: RoomId, answer: &Answer) -> Result<()>;

    async fn suggestions(&self, room_id: RoomId) -> Result<Vec<Suggestion>>;
    async fn store_suggestions(
        &self,
        room_id: RoomId,
        suggestions: Vec<NewSuggestion>,
    ) -> Result<Vec<Suggestion>>;

    async fn submit_vote(&self, vote: &Vote) -> Result<()>;
    async fn votes(&self, suggestion_id: SuggestionId) -> Result<Vec<Vote>>;
    /// Every vote on every suggestion of a room
    async fn room_votes(&self, room_id: RoomId) -> Result<Vec<Vote>>;
}
