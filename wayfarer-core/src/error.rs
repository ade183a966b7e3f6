use chrono::NaiveDate;
use thiserror::Error;

use crate::{QuestionId, RoomId, SuggestionId};

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// The operation needs to know which member is acting
    #[error("A member identity is required for this operation")]
    Unauthenticated,
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Room {room_id} is already locked to a different decision")]
    RoomAlreadyLocked { room_id: RoomId },
    /// A destination change would discard votes and suggestions
    #[error("Changing the destination clears all votes and suggestions and must be confirmed")]
    ResetNotConfirmed,
}

/// A request was rejected before anything was changed
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Start date {start} is after end date {end}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("A trip of {days} days is longer than the {max} days a group can plan")]
    TripTooLong { days: i64, max: i64 },
    #[error("Group size must be at least 1")]
    InvalidGroupSize,
    #[error("No suggestions were supplied to lock")]
    EmptyLock,
    #[error("Suggestion {0} does not belong to this room")]
    UnknownSuggestion(SuggestionId),
    #[error("Question {0} does not belong to this room")]
    UnknownQuestion(QuestionId),
    #[error("A {edit} edit cannot be applied to a {kind} question")]
    EditMismatch {
        edit: &'static str,
        kind: &'static str,
    },
}
