use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use log::error;
use thiserror::Error;
use wayfarer_collab::{DatabaseError, PlannerError};
use wayfarer_core::CoreError;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("{resource}:{identifier} not found")]
    NotFound {
        resource: &'static str,
        identifier: &'static str,
    },
    #[error("A member id is required")]
    Unauthenticated,
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unavailable(String),
    #[error("Unknown internal error: {0}")]
    Unknown(String),
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.as_status_code();

        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        (status, self.to_string()).into_response()
    }
}

impl From<DatabaseError> for ServerError {
    fn from(value: DatabaseError) -> Self {
        match value {
            DatabaseError::NotFound {
                resource,
                identifier,
            } => Self::NotFound {
                resource,
                identifier,
            },
            e => Self::Unknown(e.to_string()),
        }
    }
}

impl From<CoreError> for ServerError {
    fn from(value: CoreError) -> Self {
        match value {
            CoreError::Unauthenticated => Self::Unauthenticated,
            CoreError::Validation(e) => Self::Invalid(e.to_string()),
            e @ (CoreError::RoomAlreadyLocked { .. } | CoreError::ResetNotConfirmed) => {
                Self::Conflict(e.to_string())
            }
        }
    }
}

impl From<PlannerError> for ServerError {
    fn from(value: PlannerError) -> Self {
        match value {
            PlannerError::Core(e) => e.into(),
            PlannerError::Database(e) => e.into(),
            e @ (PlannerError::Generator(_) | PlannerError::NoGenerator) => {
                Self::Unavailable(e.to_string())
            }
            e => Self::Unknown(e.to_string()),
        }
    }
}

#[cfg(test)]
mod test {
    use axum::http::StatusCode;
    use wayfarer_collab::{DatabaseError, PlannerError};
    use wayfarer_core::{CoreError, ValidationError};

    use super::ServerError;

    fn status_of(error: PlannerError) -> StatusCode {
        ServerError::from(error).as_status_code()
    }

    #[test]
    fn planner_errors_map_to_statuses() {
        let not_found = DatabaseError::NotFound {
            resource: "room",
            identifier: "id",
        };

        assert_eq!(status_of(not_found.into()), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(CoreError::Unauthenticated.into()),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(ValidationError::EmptyLock.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(ValidationError::TripTooLong { days: 1000, max: 90 }.into()),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            status_of(CoreError::RoomAlreadyLocked { room_id: 1 }.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(CoreError::ResetNotConfirmed.into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(PlannerError::NoGenerator),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }
}
