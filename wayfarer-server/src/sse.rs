use axum::{
    extract::Query,
    response::{
        sse::{Event, KeepAlive},
        Sse,
    },
    routing::get,
};
use futures_util::Stream;
use log::warn;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::{
    collections::VecDeque,
    convert::Infallible,
    pin::Pin,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Weak,
    },
    task::{Context, Poll, Waker},
};
use utoipa::{IntoParams, ToSchema};
use wayfarer_collab::PlanningEvent;

use crate::{context::ServerContext, Router};

type ConnectionId = usize;

static NEXT_CONNECTION_ID: AtomicUsize = AtomicUsize::new(1);

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EventFilter {
    /// Only receive events of this room, along with events of whole groups
    room_id: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// A group was created along with its rooms
    GroupCreated { group_id: i32 },
    /// The details of a group changed
    GroupUpdated { group_id: i32 },
    /// The destination changed and every room of the group was reopened
    GroupReset { group_id: i32, room_ids: Vec<i32> },
    /// The questions of a room were replaced by the current catalog
    CatalogRegenerated { room_id: i32 },
    /// A member submitted their drafts
    AnswersSubmitted {
        room_id: i32,
        member_id: i32,
        submitted: Vec<i32>,
        /// Questions whose answer could not be stored
        failed: Vec<i32>,
    },
    /// New suggestions are available for voting
    SuggestionsGenerated {
        room_id: i32,
        suggestion_ids: Vec<i32>,
    },
    /// A member voted on a suggestion
    VoteRecorded {
        room_id: i32,
        suggestion_id: i32,
        member_id: i32,
        #[schema(example = "up")]
        direction: String,
    },
    /// The decision of a room was fixed
    RoomLocked {
        room_id: i32,
        suggestion_ids: Vec<i32>,
    },
    /// A member marked a room as done
    MemberCompleted { room_id: i32, member_id: i32 },
    /// Every member finished a locked room
    RoomCompleted { room_id: i32 },
}

impl From<PlanningEvent> for ServerEvent {
    fn from(value: PlanningEvent) -> Self {
        match value {
            PlanningEvent::GroupCreated { group_id } => Self::GroupCreated { group_id },
            PlanningEvent::GroupUpdated { group_id } => Self::GroupUpdated { group_id },
            PlanningEvent::GroupReset { group_id, room_ids } => {
                Self::GroupReset { group_id, room_ids }
            }
            PlanningEvent::CatalogRegenerated { room_id } => Self::CatalogRegenerated { room_id },
            PlanningEvent::AnswersSubmitted {
                room_id,
                member_id,
                submitted,
                failed,
            } => Self::AnswersSubmitted {
                room_id,
                member_id,
                submitted,
                failed,
            },
            PlanningEvent::SuggestionsGenerated {
                room_id,
                suggestion_ids,
            } => Self::SuggestionsGenerated {
                room_id,
                suggestion_ids,
            },
            PlanningEvent::VoteRecorded {
                room_id,
                suggestion_id,
                member_id,
                direction,
            } => Self::VoteRecorded {
                room_id,
                suggestion_id,
                member_id,
                direction: direction.as_str().to_string(),
            },
            PlanningEvent::RoomLocked {
                room_id,
                suggestion_ids,
            } => Self::RoomLocked {
                room_id,
                suggestion_ids,
            },
            PlanningEvent::MemberCompleted { room_id, member_id } => {
                Self::MemberCompleted { room_id, member_id }
            }
            PlanningEvent::RoomCompleted { room_id } => Self::RoomCompleted { room_id },
        }
    }
}

/// Manages server sent event connections
pub struct ServerSentEvents {
    me: Weak<Self>,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: ConnectionId,
    room_id: Option<i32>,
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

pub struct ConnectionHandle {
    id: ConnectionId,
    /// A reference to [Connection]'s pending messages
    pending_messages: Arc<Mutex<VecDeque<ServerEvent>>>,
    /// A reference to [Connection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
    /// Required to remove connection when dropped
    manager: Weak<ServerSentEvents>,
}

impl ServerSentEvents {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    /// Sends an event to every connection interested in the room it concerns
    pub fn broadcast(&self, room_id: Option<i32>, event: ServerEvent) {
        let connections = self.connections.lock();

        for connection in connections.iter().filter(|c| c.wants(room_id)) {
            connection.send(event.clone())
        }
    }

    pub fn connection_count(&self) -> usize {
        self.connections.lock().len()
    }

    fn connect(&self, filter: EventFilter) -> ConnectionHandle {
        let connection = Connection::new(filter.room_id);
        let handle = connection.handle(self.me.clone());

        self.connections.lock().push(connection);
        handle
    }

    fn disconnect(&self, id: ConnectionId) {
        self.connections.lock().retain(|c| c.id != id)
    }
}

impl Connection {
    fn new(room_id: Option<i32>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            room_id,
            pending_messages: Default::default(),
            waker: Default::default(),
        }
    }

    fn wants(&self, room_id: Option<i32>) -> bool {
        match (self.room_id, room_id) {
            (Some(wanted), Some(room_id)) => wanted == room_id,
            _ => true,
        }
    }

    fn send(&self, message: ServerEvent) {
        self.pending_messages.lock().push_back(message);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    fn handle(&self, manager: Weak<ServerSentEvents>) -> ConnectionHandle {
        ConnectionHandle {
            id: self.id,
            pending_messages: self.pending_messages.clone(),
            waker: self.waker.clone(),
            manager,
        }
    }
}

impl Stream for ConnectionHandle {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut pending_messages = self.pending_messages.lock();

        while let Some(message) = pending_messages.pop_front() {
            match serde_json::to_string(&message) {
                Ok(data) => return Poll::Ready(Some(Ok(Event::default().data(data)))),
                Err(e) => warn!("Skipping event that failed to serialize: {}", e),
            }
        }

        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

#[utoipa::path(
    get,
    path = "/v1/events",
    tag = "events",
    params(EventFilter),
    responses(
        (
            status = 200,
            content_type = "text/event-stream",
            description = "A stream of planning events",
            body = ServerEvent
        )
    )
)]
async fn event_stream(
    context: ServerContext,
    Query(filter): Query<EventFilter>,
) -> Sse<ConnectionHandle> {
    Sse::new(context.sse.connect(filter)).keep_alive(KeepAlive::default())
}

pub fn router() -> Router {
    Router::new().route("/", get(event_stream))
}
