use crossbeam::channel::{Receiver, Sender};
use serde::Serialize;
use wayfarer_core::{GroupId, MemberId, QuestionId, RoomId, SuggestionId, VoteDirection};

pub type EventSender = Sender<PlanningEvent>;
pub type EventReceiver = Receiver<PlanningEvent>;

/// Events emitted by the planner whenever shared state changes
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanningEvent {
    GroupCreated {
        group_id: GroupId,
    },
    GroupUpdated {
        group_id: GroupId,
    },
    /// The destination changed and every room of the group was reopened
    GroupReset {
        group_id: GroupId,
        room_ids: Vec<RoomId>,
    },
    /// Stale questions were replaced by the current catalog
    CatalogRegenerated {
        room_id: RoomId,
    },
    AnswersSubmitted {
        room_id: RoomId,
        member_id: MemberId,
        submitted: Vec<QuestionId>,
        failed: Vec<QuestionId>,
    },
    SuggestionsGenerated {
        room_id: RoomId,
        suggestion_ids: Vec<SuggestionId>,
    },
    VoteRecorded {
        room_id: RoomId,
        suggestion_id: SuggestionId,
        member_id: MemberId,
        direction: VoteDirection,
    },
    RoomLocked {
        room_id: RoomId,
        suggestion_ids: Vec<SuggestionId>,
    },
    MemberCompleted {
        room_id: RoomId,
        member_id: MemberId,
    },
    /// Every member finished a locked room
    RoomCompleted {
        room_id: RoomId,
    },
}

impl PlanningEvent {
    /// The room the event concerns, if it concerns a single room
    pub fn room_id(&self) -> Option<RoomId> {
        match self {
            Self::GroupCreated { .. } | Self::GroupUpdated { .. } | Self::GroupReset { .. } => None,
            Self::CatalogRegenerated { room_id }
            | Self::AnswersSubmitted { room_id, .. }
            | Self::SuggestionsGenerated { room_id, .. }
            | Self::VoteRecorded { room_id, .. }
            | Self::RoomLocked { room_id, .. }
            | Self::MemberCompleted { room_id, .. }
            | Self::RoomCompleted { room_id } => Some(*room_id),
        }
    }
}
