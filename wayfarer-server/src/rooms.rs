use axum::{
    extract::Path,
    routing::{get, post},
    Json,
};
use wayfarer_core::{Room as CoreRoom, Session};

use crate::{
    context::ServerContext,
    errors::ServerResult,
    member::Member,
    schemas::{EditSchema, LockSchema, ValidatedJson, VoteSchema},
    serialized::{
        AnsweredQuestions, Catalog, CompletionStatus, Consensus, Draft, LockResult, Room,
        SubmissionReport, Suggestion, ToSerialized, TopPreferences, Vote,
    },
    Router,
};

/// Looks up a room and builds the session of the acting member within its group
async fn room_session(
    context: &ServerContext,
    room_id: i32,
    member: Member,
) -> ServerResult<(CoreRoom, Session)> {
    let room = context.planner.context().database.room_by_id(room_id).await?;
    let session = context
        .planner
        .groups
        .session(room.group_id, member.0)
        .await?;

    Ok((room, session))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}",
    tag = "rooms",
    responses(
        (status = 200, body = Room)
    )
)]
async fn room(context: ServerContext, Path(room_id): Path<i32>) -> ServerResult<Json<Room>> {
    let room = context.planner.context().database.room_by_id(room_id).await?;

    Ok(Json(room.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/questions",
    tag = "questions",
    security(("MemberId" = [])),
    responses(
        (status = 200, description = "Questions with the member's answers merged in", body = AnsweredQuestions)
    )
)]
async fn questions(
    member: Member,
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<AnsweredQuestions>> {
    let (_, session) = room_session(&context, room_id, member).await?;
    let answered = context
        .planner
        .answers
        .answered_questions(room_id, &session)
        .await?;

    Ok(Json(answered.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/questions/regenerate",
    tag = "questions",
    responses(
        (status = 200, body = Catalog)
    )
)]
async fn regenerate_questions(
    member: Member,
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<Catalog>> {
    let (room, session) = room_session(&context, room_id, member).await?;
    let catalog = context.planner.questions.regenerate(&room, &session).await?;

    Ok(Json(catalog.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/questions/{question_id}/focus",
    tag = "questions",
    security(("MemberId" = [])),
    responses(
        (status = 200, description = "The member is now editing the question")
    )
)]
async fn focus_question(
    member: Member,
    context: ServerContext,
    Path((room_id, question_id)): Path<(i32, i32)>,
) -> ServerResult<()> {
    let (_, session) = room_session(&context, room_id, member).await?;
    context
        .planner
        .answers
        .begin_edit(room_id, &session, question_id)?;

    Ok(())
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/questions/{question_id}/edits",
    tag = "questions",
    request_body = EditSchema,
    security(("MemberId" = [])),
    responses(
        (status = 200, description = "The draft after the edit", body = Draft)
    )
)]
async fn edit_question(
    member: Member,
    context: ServerContext,
    Path((room_id, question_id)): Path<(i32, i32)>,
    Json(body): Json<EditSchema>,
) -> ServerResult<Json<Draft>> {
    let (_, session) = room_session(&context, room_id, member).await?;
    let value = context
        .planner
        .answers
        .record_edit(room_id, &session, question_id, body.into())
        .await?;

    Ok(Json(value.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/answers",
    tag = "questions",
    security(("MemberId" = [])),
    responses(
        (status = 200, description = "Which drafts were stored and which were not", body = SubmissionReport)
    )
)]
async fn submit_answers(
    member: Member,
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<SubmissionReport>> {
    let (_, session) = room_session(&context, room_id, member).await?;
    let report = context.planner.answers.submit_all(room_id, &session).await?;

    Ok(Json(report.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/suggestions",
    tag = "voting",
    responses(
        (status = 200, body = Vec<Suggestion>)
    )
)]
async fn suggestions(
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<Vec<Suggestion>>> {
    let suggestions = context.planner.voting.suggestions(room_id).await?;

    Ok(Json(suggestions.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/suggestions",
    tag = "voting",
    responses(
        (status = 200, body = Vec<Suggestion>),
        (status = 503, description = "No suggestion generator is available")
    )
)]
async fn generate_suggestions(
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<Vec<Suggestion>>> {
    let suggestions = context.planner.voting.generate_suggestions(room_id).await?;

    Ok(Json(suggestions.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/votes",
    tag = "voting",
    request_body = VoteSchema,
    security(("MemberId" = [])),
    responses(
        (status = 200, body = Vote)
    )
)]
async fn vote(
    member: Member,
    context: ServerContext,
    Path(room_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<VoteSchema>,
) -> ServerResult<Json<Vote>> {
    let (_, session) = room_session(&context, room_id, member).await?;
    let vote = context
        .planner
        .voting
        .record_vote(room_id, &session, body.suggestion_id, body.direction)
        .await?;

    Ok(Json(vote.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/preferences",
    tag = "voting",
    responses(
        (status = 200, body = TopPreferences)
    )
)]
async fn preferences(
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<TopPreferences>> {
    let preferences = context.planner.voting.top_preferences(room_id).await?;

    Ok(Json(preferences.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/lock",
    tag = "voting",
    request_body = LockSchema,
    responses(
        (status = 200, body = LockResult),
        (status = 409, description = "The room is already locked to another decision")
    )
)]
async fn lock(
    context: ServerContext,
    Path(room_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<LockSchema>,
) -> ServerResult<Json<LockResult>> {
    let outcome = context
        .planner
        .voting
        .lock(room_id, &body.suggestion_ids)
        .await?;

    Ok(Json(outcome.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/consensus",
    tag = "voting",
    responses(
        (status = 200, body = Consensus)
    )
)]
async fn consensus(context: ServerContext, Path(room_id): Path<i32>) -> ServerResult<Json<Consensus>> {
    let consensus = context.planner.voting.consensus(room_id).await?;

    Ok(Json(consensus.to_serialized()))
}

#[utoipa::path(
    post,
    path = "/v1/rooms/{id}/complete",
    tag = "results",
    security(("MemberId" = [])),
    responses(
        (status = 200, body = CompletionStatus)
    )
)]
async fn complete(
    member: Member,
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<CompletionStatus>> {
    let (_, session) = room_session(&context, room_id, member).await?;
    let status = context
        .planner
        .results
        .mark_complete(room_id, &session)
        .await?;

    Ok(Json(status.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/rooms/{id}/completion",
    tag = "results",
    responses(
        (status = 200, body = CompletionStatus)
    )
)]
async fn completion(
    context: ServerContext,
    Path(room_id): Path<i32>,
) -> ServerResult<Json<CompletionStatus>> {
    let status = context.planner.results.completion(room_id).await?;

    Ok(Json(status.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/:id", get(room))
        .route("/:id/questions", get(questions))
        .route("/:id/questions/regenerate", post(regenerate_questions))
        .route("/:id/questions/:question_id/focus", post(focus_question))
        .route("/:id/questions/:question_id/edits", post(edit_question))
        .route("/:id/answers", post(submit_answers))
        .route("/:id/suggestions", get(suggestions).post(generate_suggestions))
        .route("/:id/votes", post(vote))
        .route("/:id/preferences", get(preferences))
        .route("/:id/lock", post(lock))
        .route("/:id/consensus", get(consensus))
        .route("/:id/complete", post(complete))
        .route("/:id/completion", get(completion))
}
