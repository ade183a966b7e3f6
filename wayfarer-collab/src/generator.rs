use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use wayfarer_core::{Answer, Group, NewSuggestion, Room};

pub type ArcedGenerator = Arc<dyn SuggestionGenerator>;

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("Suggestion service is unavailable: {0}")]
    Unavailable(String),
    #[error("Suggestion service returned an invalid response: {0}")]
    InvalidResponse(String),
}

/// Produces candidate suggestions for a room from the answers of its members.
#[async_trait]
pub trait SuggestionGenerator: Send + Sync {
    async fn generate(
        &self,
        group: &Group,
        room: &Room,
        answers: &[Answer],
    ) -> Result<Vec<NewSuggestion>, GeneratorError>;
}
