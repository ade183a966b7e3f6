use axum::{response::IntoResponse, Json};
use utoipa::{
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
    Modify, OpenApi,
};

use crate::{groups, member::MEMBER_HEADER, rooms, schemas, serialized, sse};

#[derive(OpenApi)]
#[openapi(
    paths(
        groups::create_group,
        groups::group,
        groups::update_group,
        groups::rooms,
        groups::results,
        groups::itinerary,
        rooms::room,
        rooms::questions,
        rooms::regenerate_questions,
        rooms::focus_question,
        rooms::edit_question,
        rooms::submit_answers,
        rooms::suggestions,
        rooms::generate_suggestions,
        rooms::vote,
        rooms::preferences,
        rooms::lock,
        rooms::consensus,
        rooms::complete,
        rooms::completion,
        sse::event_stream,
    ),
    components(schemas(
        schemas::NewGroupSchema,
        schemas::UpdateGroupSchema,
        schemas::EditSchema,
        schemas::VoteSchema,
        schemas::LockSchema,
        serialized::Group,
        serialized::GroupWithRooms,
        serialized::GroupUpdateResult,
        serialized::Room,
        serialized::Question,
        serialized::Catalog,
        serialized::AnsweredQuestion,
        serialized::AnsweredQuestions,
        serialized::Draft,
        serialized::FailedSubmission,
        serialized::SubmissionReport,
        serialized::Suggestion,
        serialized::Vote,
        serialized::TopPreference,
        serialized::LegRanking,
        serialized::TopPreferences,
        serialized::Consensus,
        serialized::LockResult,
        serialized::CompletionStatus,
        serialized::RoomResults,
        serialized::Pick,
        serialized::Day,
        sse::ServerEvent,
    )),
    modifiers(&MemberIdentity),
    info(
        description = "wayfarer-server exposes endpoints to plan a trip together with a group"
    )
)]
pub struct ApiDoc;

/// Documents the header members identify themselves with
struct MemberIdentity;

impl Modify for MemberIdentity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            let scheme = ApiKey::Header(ApiKeyValue::new(MEMBER_HEADER));
            components.add_security_scheme("MemberId", SecurityScheme::ApiKey(scheme))
        }
    }
}

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}

#[cfg(test)]
mod test {
    use utoipa::OpenApi;

    use super::ApiDoc;

    #[test]
    fn documents_every_route() {
        let doc = ApiDoc::openapi();
        let paths = &doc.paths.paths;

        assert!(paths.contains_key("/v1/groups"));
        assert!(paths.contains_key("/v1/rooms/{id}/questions/{question_id}/edits"));
        assert!(paths.contains_key("/v1/events"));
        assert_eq!(paths.len(), 19);

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("MemberId"));
    }
}
