use thiserror::Error;
use wayfarer_core::{CoreError, RoomId, ValidationError};

use crate::{DatabaseError, GeneratorError};

pub type PlannerResult<T> = Result<T, PlannerError>;

#[derive(Debug, Error)]
pub enum PlannerError {
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error(transparent)]
    Database(#[from] DatabaseError),
    #[error(transparent)]
    Generator(#[from] GeneratorError),
    #[error("No suggestion service is configured")]
    NoGenerator,
    #[error("Questions of room {room_id} are still stale after regeneration: {reason}")]
    StaleCatalog { room_id: RoomId, reason: String },
}

impl From<ValidationError> for PlannerError {
    fn from(value: ValidationError) -> Self {
        Self::Core(value.into())
    }
}
