use axum::{
    extract::Path,
    routing::{get, post},
    Json,
};
use wayfarer_collab::ResetConfirmation;

use crate::{
    context::ServerContext,
    errors::ServerResult,
    schemas::{NewGroupSchema, UpdateGroupSchema, ValidatedJson},
    serialized::{Day, Group, GroupUpdateResult, GroupWithRooms, Room, RoomResults, ToSerialized},
    Router,
};

#[utoipa::path(
    post,
    path = "/v1/groups",
    tag = "groups",
    request_body = NewGroupSchema,
    responses(
        (status = 200, body = GroupWithRooms),
        (status = 422, description = "The group is invalid")
    )
)]
async fn create_group(
    context: ServerContext,
    ValidatedJson(body): ValidatedJson<NewGroupSchema>,
) -> ServerResult<Json<GroupWithRooms>> {
    let created = context.planner.groups.create_group(body.into()).await?;

    Ok(Json(created.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{id}",
    tag = "groups",
    responses(
        (status = 200, body = Group)
    )
)]
async fn group(context: ServerContext, Path(group_id): Path<i32>) -> ServerResult<Json<Group>> {
    let group = context.planner.groups.group(group_id).await?;

    Ok(Json(group.to_serialized()))
}

#[utoipa::path(
    patch,
    path = "/v1/groups/{id}",
    tag = "groups",
    request_body = UpdateGroupSchema,
    responses(
        (status = 200, body = GroupUpdateResult),
        (status = 409, description = "Changing the destination was not confirmed")
    )
)]
async fn update_group(
    context: ServerContext,
    Path(group_id): Path<i32>,
    ValidatedJson(body): ValidatedJson<UpdateGroupSchema>,
) -> ServerResult<Json<GroupUpdateResult>> {
    let confirmation = if body.confirm_reset {
        ResetConfirmation::Confirmed
    } else {
        ResetConfirmation::Unconfirmed
    };

    let outcome = context
        .planner
        .groups
        .update_group(group_id, body.into(), confirmation)
        .await?;

    Ok(Json(outcome.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{id}/rooms",
    tag = "groups",
    responses(
        (status = 200, body = Vec<Room>)
    )
)]
async fn rooms(context: ServerContext, Path(group_id): Path<i32>) -> ServerResult<Json<Vec<Room>>> {
    let rooms = context.planner.groups.rooms(group_id).await?;

    Ok(Json(rooms.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{id}/results",
    tag = "groups",
    responses(
        (status = 200, description = "The outcome of every room, in category order", body = Vec<RoomResults>)
    )
)]
async fn results(
    context: ServerContext,
    Path(group_id): Path<i32>,
) -> ServerResult<Json<Vec<RoomResults>>> {
    let results = context.planner.results.consolidated(group_id).await?;
    let mut results: Vec<_> = results.into_values().collect();

    results.sort_by_key(|r| r.room.category);

    Ok(Json(results.to_serialized()))
}

#[utoipa::path(
    get,
    path = "/v1/groups/{id}/itinerary",
    tag = "groups",
    responses(
        (status = 200, body = Vec<Day>)
    )
)]
async fn itinerary(context: ServerContext, Path(group_id): Path<i32>) -> ServerResult<Json<Vec<Day>>> {
    let days = context.planner.results.itinerary(group_id).await?;

    Ok(Json(days.to_serialized()))
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_group))
        .route("/:id", get(group).patch(update_group))
        .route("/:id/rooms", get(rooms))
        .route("/:id/results", get(results))
        .route("/:id/itinerary", get(itinerary))
}
