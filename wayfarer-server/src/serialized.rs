//! All schemas that are exposed from endpoints are defined here
//! along with the ToSerialized impls

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::Value;
use utoipa::ToSchema;
use wayfarer_collab::{
    AnsweredQuestion as CollabAnsweredQuestion, AnsweredQuestions as CollabAnsweredQuestions,
    FailedSubmission as CollabFailedSubmission, GroupUpdateOutcome, RoomResults as CollabRoomResults,
    SubmissionReport as CollabSubmissionReport, TopPreferences as CollabTopPreferences,
};
use wayfarer_core::{
    catalog::ResolvedCatalog,
    completion::CompletionStatus as CoreCompletionStatus,
    itinerary::{Day as CoreDay, Pick as CorePick},
    voting::{
        Consensus as CoreConsensus, LegRanking as CoreLegRanking, LockOutcome,
        TopPreference as CoreTopPreference,
    },
    AnswerValue, Group as CoreGroup, Question as CoreQuestion, Room as CoreRoom,
    Suggestion as CoreSuggestion, Vote as CoreVote,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct Group {
    id: i32,
    name: String,
    origin: String,
    destination: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    group_size: u32,
    day_count: u32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupWithRooms {
    group: Group,
    rooms: Vec<Room>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct GroupUpdateResult {
    group: Group,
    /// True if the destination changed and every room was reopened
    reset: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Room {
    id: i32,
    group_id: i32,
    #[schema(example = "accommodation")]
    category: String,
    #[schema(example = "active")]
    status: String,
    completed_by: Vec<i32>,
    selected: Vec<i32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Question {
    id: i32,
    text: String,
    order: i32,
    schema_version: u32,
    #[schema(value_type = Object)]
    kind: Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Catalog {
    #[schema(example = "fetched")]
    source: String,
    questions: Vec<Question>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnsweredQuestion {
    question: Question,
    #[schema(value_type = Option<Object>)]
    value: Option<Value>,
    is_editing: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AnsweredQuestions {
    #[schema(example = "cached")]
    source: String,
    questions: Vec<AnsweredQuestion>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Draft {
    #[schema(value_type = Option<Object>)]
    value: Option<Value>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct FailedSubmission {
    question_id: i32,
    reason: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionReport {
    submitted: Vec<i32>,
    failed: Vec<FailedSubmission>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Suggestion {
    id: i32,
    room_id: i32,
    name: String,
    description: Option<String>,
    #[schema(value_type = Object)]
    details: Value,
    leg: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Vote {
    suggestion_id: i32,
    member_id: i32,
    #[schema(example = "up")]
    direction: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopPreference {
    suggestion_id: i32,
    name: String,
    likes: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LegRanking {
    departure: Vec<TopPreference>,
    #[serde(rename = "return")]
    return_leg: Vec<TopPreference>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TopPreferences {
    ranked: Vec<TopPreference>,
    /// Like counts keyed by suggestion id
    counts: BTreeMap<i32, usize>,
    legs: Option<LegRanking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Consensus {
    liked: Vec<TopPreference>,
    final_decision: Vec<TopPreference>,
    is_locked: bool,
    legs: Option<LegRanking>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LockResult {
    #[schema(example = "locked")]
    outcome: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompletionStatus {
    completed_by: Vec<i32>,
    is_complete: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RoomResults {
    room: Room,
    consensus: Consensus,
    completion: CompletionStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Pick {
    suggestion_id: Option<i32>,
    name: String,
    likes: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Day {
    number: u32,
    date: NaiveDate,
    travel: Option<Pick>,
    stay: Option<Pick>,
    activities: Vec<Pick>,
    dining: Option<Pick>,
}

/// Helper trait to convert any type into a serialized version
pub trait ToSerialized<T>
where
    T: Serialize,
{
    fn to_serialized(&self) -> T;
}

impl<I, O> ToSerialized<Vec<O>> for Vec<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Vec<O> {
        self.iter().map(|x| x.to_serialized()).collect()
    }
}

impl<I, O> ToSerialized<Option<O>> for Option<I>
where
    I: ToSerialized<O>,
    O: Serialize,
{
    fn to_serialized(&self) -> Option<O> {
        self.as_ref().map(|x| x.to_serialized())
    }
}

fn to_value<T>(value: &T) -> Value
where
    T: Serialize,
{
    serde_json::to_value(value).unwrap_or_default()
}

impl ToSerialized<Group> for CoreGroup {
    fn to_serialized(&self) -> Group {
        Group {
            id: self.id,
            name: self.name.clone(),
            origin: self.origin.clone(),
            destination: self.destination.clone(),
            start_date: self.start_date,
            end_date: self.end_date,
            group_size: self.group_size,
            day_count: self.day_count(),
        }
    }
}

impl ToSerialized<GroupWithRooms> for (CoreGroup, Vec<CoreRoom>) {
    fn to_serialized(&self) -> GroupWithRooms {
        GroupWithRooms {
            group: self.0.to_serialized(),
            rooms: self.1.to_serialized(),
        }
    }
}

impl ToSerialized<GroupUpdateResult> for GroupUpdateOutcome {
    fn to_serialized(&self) -> GroupUpdateResult {
        GroupUpdateResult {
            group: self.group.to_serialized(),
            reset: self.reset,
        }
    }
}

impl ToSerialized<Room> for CoreRoom {
    fn to_serialized(&self) -> Room {
        Room {
            id: self.id,
            group_id: self.group_id,
            category: self.category.to_string(),
            status: self.status.to_string(),
            completed_by: self.completed_by.iter().copied().collect(),
            selected: self.selected.clone(),
        }
    }
}

impl ToSerialized<Question> for CoreQuestion {
    fn to_serialized(&self) -> Question {
        Question {
            id: self.id,
            text: self.text.clone(),
            order: self.order,
            schema_version: self.schema_version,
            kind: to_value(&self.kind),
        }
    }
}

impl ToSerialized<Catalog> for ResolvedCatalog {
    fn to_serialized(&self) -> Catalog {
        Catalog {
            source: to_value(&self.source).as_str().unwrap_or_default().to_string(),
            questions: self.questions.to_serialized(),
        }
    }
}

impl ToSerialized<AnsweredQuestion> for CollabAnsweredQuestion {
    fn to_serialized(&self) -> AnsweredQuestion {
        AnsweredQuestion {
            question: self.question.to_serialized(),
            value: self.value.as_ref().map(to_value),
            is_editing: self.is_editing,
        }
    }
}

impl ToSerialized<AnsweredQuestions> for CollabAnsweredQuestions {
    fn to_serialized(&self) -> AnsweredQuestions {
        AnsweredQuestions {
            source: to_value(&self.source).as_str().unwrap_or_default().to_string(),
            questions: self.questions.to_serialized(),
        }
    }
}

impl ToSerialized<Draft> for Option<AnswerValue> {
    fn to_serialized(&self) -> Draft {
        Draft {
            value: self.as_ref().map(to_value),
        }
    }
}

impl ToSerialized<FailedSubmission> for CollabFailedSubmission {
    fn to_serialized(&self) -> FailedSubmission {
        FailedSubmission {
            question_id: self.question_id,
            reason: self.reason.clone(),
        }
    }
}

impl ToSerialized<SubmissionReport> for CollabSubmissionReport {
    fn to_serialized(&self) -> SubmissionReport {
        SubmissionReport {
            submitted: self.submitted.clone(),
            failed: self.failed.to_serialized(),
        }
    }
}

impl ToSerialized<Suggestion> for CoreSuggestion {
    fn to_serialized(&self) -> Suggestion {
        Suggestion {
            id: self.id,
            room_id: self.room_id,
            name: self.name.clone(),
            description: self.description.clone(),
            details: to_value(&self.details),
            leg: self.leg.map(|l| l.as_str().to_string()),
        }
    }
}

impl ToSerialized<Vote> for CoreVote {
    fn to_serialized(&self) -> Vote {
        Vote {
            suggestion_id: self.suggestion_id,
            member_id: self.member_id,
            direction: self.direction.as_str().to_string(),
        }
    }
}

impl ToSerialized<TopPreference> for CoreTopPreference {
    fn to_serialized(&self) -> TopPreference {
        TopPreference {
            suggestion_id: self.suggestion_id,
            name: self.name.clone(),
            likes: self.likes,
        }
    }
}

impl ToSerialized<LegRanking> for CoreLegRanking {
    fn to_serialized(&self) -> LegRanking {
        LegRanking {
            departure: self.departure.to_serialized(),
            return_leg: self.return_leg.to_serialized(),
        }
    }
}

impl ToSerialized<TopPreferences> for CollabTopPreferences {
    fn to_serialized(&self) -> TopPreferences {
        TopPreferences {
            ranked: self.ranked.to_serialized(),
            counts: self.counts.clone(),
            legs: self.legs.to_serialized(),
        }
    }
}

impl ToSerialized<Consensus> for CoreConsensus {
    fn to_serialized(&self) -> Consensus {
        Consensus {
            liked: self.liked.to_serialized(),
            final_decision: self.final_decision.to_serialized(),
            is_locked: self.is_locked,
            legs: self.legs.to_serialized(),
        }
    }
}

impl ToSerialized<LockResult> for LockOutcome {
    fn to_serialized(&self) -> LockResult {
        LockResult {
            outcome: to_value(self).as_str().unwrap_or_default().to_string(),
        }
    }
}

impl ToSerialized<CompletionStatus> for CoreCompletionStatus {
    fn to_serialized(&self) -> CompletionStatus {
        CompletionStatus {
            completed_by: self.completed_by.clone(),
            is_complete: self.is_complete,
        }
    }
}

impl ToSerialized<RoomResults> for CollabRoomResults {
    fn to_serialized(&self) -> RoomResults {
        RoomResults {
            room: self.room.to_serialized(),
            consensus: self.consensus.to_serialized(),
            completion: self.completion.to_serialized(),
        }
    }
}

impl ToSerialized<Pick> for CorePick {
    fn to_serialized(&self) -> Pick {
        Pick {
            suggestion_id: self.suggestion_id,
            name: self.name.clone(),
            likes: self.likes,
        }
    }
}

impl ToSerialized<Day> for CoreDay {
    fn to_serialized(&self) -> Day {
        Day {
            number: self.number,
            date: self.date,
            travel: self.travel.to_serialized(),
            stay: self.stay.to_serialized(),
            activities: self.activities.to_serialized(),
            dining: self.dining.to_serialized(),
        }
    }
}
