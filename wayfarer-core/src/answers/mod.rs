//! Reconciles a member's draft answers with what the server holds.

mod lease;

use std::collections::{BTreeMap, HashMap, HashSet};

use log::debug;
use parking_lot::Mutex;

pub use lease::*;

use crate::{
    Answer, AnswerValue, ArcedClock, CacheKey, ClientCache, ClientCacheExt, Config, CoreResult,
    MemberId, Question, QuestionId, QuestionKind, RoomId, Session, ValidationError,
};

/// A single interaction with a question's input
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Picks an option or enters text. Toggles the option on multi-select questions.
    Select(String),
    /// Sets the lower bound of a range
    Min(Option<f64>),
    /// Sets the upper bound of a range
    Max(Option<f64>),
    /// Removes the draft entirely
    Clear,
}

/// Holds the draft answers of every member of one room.
pub struct AnswerReconciler {
    room_id: RoomId,
    clock: ArcedClock,
    answer_cache_ttl: chrono::Duration,
    state: Mutex<ReconcilerState>,
}

struct ReconcilerState {
    drafts: HashMap<MemberId, BTreeMap<QuestionId, AnswerValue>>,
    leases: EditLeases,
    /// Questions that left the catalog, and the question that replaced each, if any
    retired: HashMap<QuestionId, Option<QuestionId>>,
}

/// What happened to drafts when the catalog of a room changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogAdoption {
    /// Drafts moved onto a question of the new catalog
    pub moved: usize,
    /// Drafts whose question has no counterpart, or whose counterpart was already answered
    pub dropped: usize,
}

impl AnswerReconciler {
    pub fn new(room_id: RoomId, config: &Config, clock: ArcedClock) -> Self {
        Self {
            room_id,
            clock,
            answer_cache_ttl: config.answer_cache_ttl(),
            state: Mutex::new(ReconcilerState {
                drafts: HashMap::new(),
                leases: EditLeases::new(config.edit_quiescence()),
                retired: HashMap::new(),
            }),
        }
    }

    /// Marks the member as editing a question, without changing its value.
    pub fn begin_edit(&self, session: &Session, question_id: QuestionId) -> CoreResult<()> {
        let member_id = session.member_id()?;
        let now = self.clock.now();

        let mut state = self.state.lock();
        state.leases.prune(now);
        state.leases.touch(member_id, question_id, now);

        Ok(())
    }

    /// Gives up the member's edit lease, letting server answers through again.
    pub fn end_edit(&self, member_id: MemberId, question_id: QuestionId) {
        self.state.lock().leases.release(member_id, question_id)
    }

    /// Returns true while a member's edit lease on the question has not lapsed.
    pub fn is_editing(&self, member_id: MemberId, question_id: QuestionId) -> bool {
        self.state
            .lock()
            .leases
            .is_held(member_id, question_id, self.clock.now())
    }

    /// Applies an edit to the member's draft and renews their edit lease.
    /// Returns the draft as it stands afterwards.
    pub fn record_edit(
        &self,
        session: &Session,
        question: &Question,
        edit: Edit,
    ) -> CoreResult<Option<AnswerValue>> {
        let member_id = session.member_id()?;
        let now = self.clock.now();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let drafts = state.drafts.entry(member_id).or_default();
        let current = drafts.remove(&question.id);

        // Put the previous value back if the edit doesn't fit the question
        let updated = match apply_edit(question, current.clone(), edit) {
            Ok(updated) => updated,
            Err(e) => {
                if let Some(current) = current {
                    drafts.insert(question.id, current);
                }
                return Err(e.into());
            }
        };

        if let Some(value) = &updated {
            drafts.insert(question.id, value.clone());
        }

        state.leases.touch(member_id, question.id, now);

        Ok(updated)
    }

    /// Merges a fetched server answer into the member's draft and returns the result.
    ///
    /// The server value is only taken when the member is not editing the question
    /// and has no non-empty draft for it. Answers owned by anyone else, or by no one,
    /// are ignored.
    pub fn reconcile(
        &self,
        session: &Session,
        question_id: QuestionId,
        server: Option<&Answer>,
    ) -> Option<AnswerValue> {
        let member_id = session.member()?;
        let now = self.clock.now();

        let mut guard = self.state.lock();
        let state = &mut *guard;

        let incoming = server
            .filter(|a| a.question_id == question_id && a.is_owned_by(member_id))
            .map(|a| &a.value)
            .filter(|v| !v.is_empty());

        if let Some(value) = incoming {
            if state.leases.is_held(member_id, question_id, now) {
                debug!(
                    "Discarding server answer to question {} while member {} is editing it",
                    question_id, member_id
                );
            } else {
                let drafts = state.drafts.entry(member_id).or_default();
                let local_is_empty = drafts.get(&question_id).map_or(true, |v| v.is_empty());

                if local_is_empty {
                    drafts.insert(question_id, value.clone());
                }
            }
        }

        state
            .drafts
            .get(&member_id)
            .and_then(|d| d.get(&question_id))
            .cloned()
    }

    pub fn draft(&self, member_id: MemberId, question_id: QuestionId) -> Option<AnswerValue> {
        self.state
            .lock()
            .drafts
            .get(&member_id)
            .and_then(|d| d.get(&question_id))
            .cloned()
    }

    /// Every non-empty draft of the member, ready to be submitted.
    pub fn pending(&self, session: &Session) -> CoreResult<Vec<Answer>> {
        let member_id = session.member_id()?;

        let answers = self
            .state
            .lock()
            .drafts
            .get(&member_id)
            .map(|drafts| {
                drafts
                    .iter()
                    .filter(|(_, value)| !value.is_empty())
                    .map(|(question_id, value)| Answer::new(*question_id, member_id, value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(answers)
    }

    /// Restores the member's drafts from the client cache.
    /// Drafts that already hold a value are left alone. Returns how many were restored.
    pub fn hydrate(&self, session: &Session, cache: &dyn ClientCache) -> usize {
        let Some(member_id) = session.member() else {
            return 0;
        };

        let key = self.cache_key(member_id);
        let Some(cached) =
            cache.read_fresh::<Vec<Answer>>(&key, self.clock.now(), self.answer_cache_ttl)
        else {
            return 0;
        };

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let drafts = state.drafts.entry(member_id).or_default();
        let mut restored = 0;

        for answer in cached.into_iter().filter(|a| a.is_owned_by(member_id)) {
            // Drafts cached before the catalog changed follow their question
            let Some(question_id) = current_id(&state.retired, answer.question_id) else {
                continue;
            };

            let local_is_empty = drafts.get(&question_id).map_or(true, |v| v.is_empty());

            if local_is_empty && !answer.value.is_empty() {
                drafts.insert(question_id, answer.value);
                restored += 1;
            }
        }

        restored
    }

    /// Writes the member's drafts to the client cache.
    pub fn persist(&self, session: &Session, cache: &dyn ClientCache) {
        let Some(member_id) = session.member() else {
            return;
        };

        let answers: Vec<_> = self
            .state
            .lock()
            .drafts
            .get(&member_id)
            .map(|drafts| {
                drafts
                    .iter()
                    .map(|(question_id, value)| Answer::new(*question_id, member_id, value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        cache.write(self.cache_key(member_id), &answers, self.clock.now());
    }

    /// Moves drafts made against one catalog onto the matching questions of another.
    ///
    /// Questions are matched by normalized text. This lets members answer the
    /// built-in catalog before the authoritative one arrives, and keeps their drafts
    /// when the catalog is regenerated. Drafts on questions of `from` that have no
    /// counterpart in `to` are dropped, as is a draft whose counterpart already holds
    /// a value. Drafts restored from the client cache later are moved the same way.
    pub fn adopt_catalog(&self, from: &[Question], to: &[Question]) -> CatalogAdoption {
        let live: HashSet<_> = to.iter().map(|q| q.id).collect();
        let targets: HashMap<_, _> = to.iter().map(|q| (q.normalized_text(), q.id)).collect();

        let moves: Vec<_> = from
            .iter()
            .filter(|q| !live.contains(&q.id))
            .map(|q| (q.id, targets.get(&q.normalized_text()).copied()))
            .collect();

        let mut guard = self.state.lock();
        let state = &mut *guard;
        let mut adoption = CatalogAdoption::default();

        for id in &live {
            state.retired.remove(id);
        }

        for (old_id, new_id) in &moves {
            state.retired.insert(*old_id, *new_id);
        }

        for (member_id, drafts) in state.drafts.iter_mut() {
            for (old_id, new_id) in &moves {
                let Some(value) = drafts.remove(old_id) else {
                    continue;
                };

                let target = new_id.filter(|id| drafts.get(id).map_or(true, |v| v.is_empty()));

                match target {
                    Some(new_id) => {
                        drafts.insert(new_id, value);
                        adoption.moved += 1;
                    }
                    None => {
                        debug!(
                            "Dropping draft of member {} on question {}, which left the catalog of room {}",
                            member_id, old_id, self.room_id
                        );
                        adoption.dropped += 1;
                    }
                }
            }
        }

        adoption
    }

    fn cache_key(&self, member_id: MemberId) -> CacheKey {
        CacheKey::Answers {
            room_id: self.room_id,
            member_id,
        }
    }
}

impl Edit {
    fn name(&self) -> &'static str {
        match self {
            Edit::Select(_) => "select",
            Edit::Min(_) => "minimum",
            Edit::Max(_) => "maximum",
            Edit::Clear => "clear",
        }
    }
}

/// Follows retired questions to the one that currently stands in for them.
/// Returns `None` if the question left the catalog without a replacement.
fn current_id(
    retired: &HashMap<QuestionId, Option<QuestionId>>,
    question_id: QuestionId,
) -> Option<QuestionId> {
    let mut current = question_id;

    // Live ids are never retired, so a chain can't be longer than the table
    for _ in 0..=retired.len() {
        match retired.get(&current) {
            Some(Some(next)) => current = *next,
            Some(None) => return None,
            None => return Some(current),
        }
    }

    None
}

fn apply_edit(
    question: &Question,
    current: Option<AnswerValue>,
    edit: Edit,
) -> Result<Option<AnswerValue>, ValidationError> {
    let mismatch = ValidationError::EditMismatch {
        edit: edit.name(),
        kind: question.kind.name(),
    };

    match (&question.kind, edit) {
        (_, Edit::Clear) => Ok(None),
        (QuestionKind::MultiSelect { .. }, Edit::Select(option)) => {
            Ok(Some(toggle(current, option)))
        }
        (QuestionKind::Range { .. }, Edit::Select(_)) => Err(mismatch),
        (_, Edit::Select(value)) => Ok(Some(AnswerValue::Scalar(value))),
        (QuestionKind::Range { .. }, Edit::Min(new_min)) => {
            let (_, max) = bounds(current);
            Ok(Some(AnswerValue::Range { min: new_min, max }))
        }
        (QuestionKind::Range { .. }, Edit::Max(new_max)) => {
            let (min, _) = bounds(current);
            Ok(Some(AnswerValue::Range { min, max: new_max }))
        }
        (_, Edit::Min(_) | Edit::Max(_)) => Err(mismatch),
    }
}

fn toggle(current: Option<AnswerValue>, option: String) -> AnswerValue {
    let mut selections = match current {
        Some(AnswerValue::MultiSelect(selections)) => selections,
        Some(AnswerValue::Scalar(value)) if !value.trim().is_empty() => vec![value],
        _ => vec![],
    };

    match selections.iter().position(|s| *s == option) {
        Some(index) => {
            selections.remove(index);
        }
        None => selections.push(option),
    }

    AnswerValue::MultiSelect(selections)
}

fn bounds(current: Option<AnswerValue>) -> (Option<f64>, Option<f64>) {
    match current {
        Some(AnswerValue::Range { min, max }) => (min, max),
        _ => (None, None),
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::{AnswerReconciler, CatalogAdoption, Edit};
    use crate::{
        util::TestCache, Answer, AnswerValue, CoreError, Config, ManualClock, Question,
        QuestionKind, Session, ValidationError,
    };

    fn setup() -> (AnswerReconciler, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let reconciler = AnswerReconciler::new(1, &Config::default(), clock.clone());

        (reconciler, clock)
    }

    fn range_question() -> Question {
        Question {
            id: 10,
            room_id: 1,
            schema_version: 2,
            text: "What is your nightly budget per person?".to_string(),
            order: 0,
            kind: QuestionKind::Range {
                min: 0.,
                max: 1000.,
                step: 25.,
                currency: "USD".to_string(),
            },
        }
    }

    fn multi_question() -> Question {
        Question {
            id: 11,
            room_id: 1,
            schema_version: 2,
            text: "Which amenities are must-haves?".to_string(),
            order: 1,
            kind: QuestionKind::MultiSelect {
                options: vec!["Pool".to_string(), "Gym".to_string()],
            },
        }
    }

    fn text_question(id: i32, text: &str) -> Question {
        Question {
            id,
            room_id: 1,
            schema_version: 2,
            text: text.to_string(),
            order: 2,
            kind: QuestionKind::FreeText { placeholder: None },
        }
    }

    fn scalar(value: &str) -> AnswerValue {
        AnswerValue::Scalar(value.to_string())
    }

    #[test]
    fn local_range_minimum_dominates_server_answer() {
        let (reconciler, clock) = setup();
        let session = Session::new(7);
        let question = range_question();

        reconciler
            .record_edit(&session, &question, Edit::Min(Some(100.)))
            .unwrap();

        // Let the edit lease lapse so only the merge rule is in play
        clock.advance(Duration::seconds(1));

        let server = Answer::new(
            question.id,
            7,
            AnswerValue::Range {
                min: Some(50.),
                max: Some(200.),
            },
        );

        assert_eq!(
            reconciler.reconcile(&session, question.id, Some(&server)),
            Some(AnswerValue::Range {
                min: Some(100.),
                max: None
            })
        );
    }

    #[test]
    fn non_empty_local_answers_are_never_clobbered() {
        let (reconciler, clock) = setup();
        let session = Session::new(7);
        let question = text_question(12, "Any must-see places?");

        reconciler
            .record_edit(&session, &question, Edit::Select("Belem tower".to_string()))
            .unwrap();
        clock.advance(Duration::seconds(1));

        let incoming = [
            scalar("Alfama"),
            scalar(""),
            AnswerValue::MultiSelect(vec!["x".to_string()]),
            AnswerValue::Range {
                min: Some(1.),
                max: None,
            },
        ];

        for value in incoming {
            let server = Answer::new(question.id, 7, value);
            let merged = reconciler.reconcile(&session, question.id, Some(&server));

            assert_eq!(merged, Some(scalar("Belem tower")));
        }
    }

    #[test]
    fn adopts_server_answer_when_local_is_absent_or_empty() {
        let (reconciler, clock) = setup();
        let session = Session::new(7);
        let question = multi_question();

        let server = Answer::new(
            question.id,
            7,
            AnswerValue::MultiSelect(vec!["Pool".to_string()]),
        );

        assert_eq!(
            reconciler.reconcile(&session, question.id, Some(&server)),
            Some(server.value.clone())
        );

        // Toggling the only option off leaves an empty draft
        reconciler
            .record_edit(&session, &question, Edit::Select("Pool".to_string()))
            .unwrap();
        clock.advance(Duration::seconds(1));

        let replacement = Answer::new(
            question.id,
            7,
            AnswerValue::MultiSelect(vec!["Gym".to_string()]),
        );

        assert_eq!(
            reconciler.reconcile(&session, question.id, Some(&replacement)),
            Some(replacement.value.clone())
        );
    }

    #[test]
    fn server_answers_are_discarded_while_editing() {
        let (reconciler, clock) = setup();
        let session = Session::new(7);
        let question = text_question(12, "Any must-see places?");

        reconciler.begin_edit(&session, question.id).unwrap();
        assert!(reconciler.is_editing(7, question.id));

        let server = Answer::new(question.id, 7, scalar("Alfama"));
        assert_eq!(reconciler.reconcile(&session, question.id, Some(&server)), None);

        clock.advance(Duration::milliseconds(100));
        assert!(!reconciler.is_editing(7, question.id));

        assert_eq!(
            reconciler.reconcile(&session, question.id, Some(&server)),
            Some(scalar("Alfama"))
        );
    }

    #[test]
    fn answers_of_other_members_are_unset() {
        let (reconciler, _) = setup();
        let session = Session::new(7);

        let foreign = Answer::new(12, 8, scalar("Alfama"));
        let unowned = Answer {
            question_id: 12,
            member_id: None,
            value: scalar("Baixa"),
        };

        assert_eq!(reconciler.reconcile(&session, 12, Some(&foreign)), None);
        assert_eq!(reconciler.reconcile(&session, 12, Some(&unowned)), None);
        assert_eq!(reconciler.draft(8, 12), None);
    }

    #[test]
    fn toggling_twice_restores_presence() {
        let (reconciler, _) = setup();
        let session = Session::new(7);
        let question = multi_question();

        reconciler
            .record_edit(&session, &question, Edit::Select("Gym".to_string()))
            .unwrap();
        let before = reconciler.draft(7, question.id);

        reconciler
            .record_edit(&session, &question, Edit::Select("Pool".to_string()))
            .unwrap();
        reconciler
            .record_edit(&session, &question, Edit::Select("Pool".to_string()))
            .unwrap();

        assert_eq!(reconciler.draft(7, question.id), before);
        assert_eq!(before, Some(AnswerValue::MultiSelect(vec!["Gym".to_string()])));
    }

    #[test]
    fn mismatched_edits_are_rejected_without_side_effects() {
        let (reconciler, _) = setup();
        let session = Session::new(7);
        let question = range_question();

        reconciler
            .record_edit(&session, &question, Edit::Max(Some(300.)))
            .unwrap();

        let result = reconciler.record_edit(&session, &question, Edit::Select("cheap".to_string()));

        assert_eq!(
            result,
            Err(CoreError::Validation(ValidationError::EditMismatch {
                edit: "select",
                kind: "range"
            }))
        );
        assert_eq!(
            reconciler.draft(7, question.id),
            Some(AnswerValue::Range {
                min: None,
                max: Some(300.)
            })
        );
    }

    #[test]
    fn editing_requires_a_member() {
        let (reconciler, _) = setup();
        let question = multi_question();

        assert_eq!(
            reconciler.record_edit(
                &Session::anonymous(),
                &question,
                Edit::Select("Gym".to_string())
            ),
            Err(CoreError::Unauthenticated)
        );
        assert_eq!(
            reconciler.pending(&Session::anonymous()),
            Err(CoreError::Unauthenticated)
        );
    }

    #[test]
    fn pending_skips_empty_drafts() {
        let (reconciler, _) = setup();
        let session = Session::new(7);

        reconciler
            .record_edit(&session, &range_question(), Edit::Min(None))
            .unwrap();
        reconciler
            .record_edit(
                &session,
                &text_question(12, "Any must-see places?"),
                Edit::Select("Sintra".to_string()),
            )
            .unwrap();

        let pending = reconciler.pending(&session).unwrap();

        assert_eq!(pending, vec![Answer::new(12, 7, scalar("Sintra"))]);
    }

    #[test]
    fn drafts_survive_through_the_client_cache() {
        let cache = TestCache::default();
        let session = Session::new(7);
        let question = text_question(12, "Any must-see places?");

        let (first, _) = setup();
        first
            .record_edit(&session, &question, Edit::Select("Sintra".to_string()))
            .unwrap();
        first.persist(&session, &cache);

        let (second, _) = setup();
        assert_eq!(second.hydrate(&session, &cache), 1);
        assert_eq!(second.draft(7, question.id), Some(scalar("Sintra")));

        // Another member sees nothing
        assert_eq!(second.hydrate(&Session::new(8), &cache), 0);
    }

    #[test]
    fn drafts_follow_questions_into_the_fetched_catalog() {
        let (reconciler, _) = setup();
        let session = Session::new(7);

        let default = text_question(-4, "Any must-see places?");
        let fetched = text_question(40, "  any must-see places? ");

        reconciler
            .record_edit(&session, &default, Edit::Select("Sintra".to_string()))
            .unwrap();

        let adoption = reconciler.adopt_catalog(&[default.clone()], &[fetched.clone()]);

        assert_eq!(adoption.moved, 1);
        assert_eq!(reconciler.draft(7, fetched.id), Some(scalar("Sintra")));
        assert_eq!(reconciler.draft(7, default.id), None);
    }

    #[test]
    fn answered_counterparts_are_kept_over_adopted_drafts() {
        let (reconciler, _) = setup();
        let session = Session::new(7);

        let default = text_question(-4, "Any must-see places?");
        let fetched = text_question(40, "Any must-see places?");

        reconciler
            .record_edit(&session, &default, Edit::Select("Sintra".to_string()))
            .unwrap();
        reconciler
            .record_edit(&session, &fetched, Edit::Select("Belem tower".to_string()))
            .unwrap();

        let adoption = reconciler.adopt_catalog(&[default.clone()], &[fetched.clone()]);

        assert_eq!(adoption.moved, 0);
        assert_eq!(adoption.dropped, 1);
        assert_eq!(reconciler.draft(7, fetched.id), Some(scalar("Belem tower")));
        assert_eq!(reconciler.draft(7, default.id), None);
        assert_eq!(
            reconciler.pending(&session).unwrap(),
            vec![Answer::new(40, 7, scalar("Belem tower"))]
        );
    }

    #[test]
    fn regenerated_catalogs_carry_drafts_and_drop_orphans() {
        let cache = TestCache::default();
        let (reconciler, _) = setup();
        let (other_device, _) = setup();

        let old = [
            text_question(7, "Any must-see places?"),
            text_question(8, "Anything to avoid?"),
        ];
        let new = [text_question(13, "any must-see places?")];

        for (device, session) in [(&reconciler, Session::new(7)), (&other_device, Session::new(8))] {
            device
                .record_edit(&session, &old[0], Edit::Select("Sintra".to_string()))
                .unwrap();
            device
                .record_edit(&session, &old[1], Edit::Select("Crowds".to_string()))
                .unwrap();
            device.persist(&session, &cache);
        }

        let adoption = reconciler.adopt_catalog(&old, &new);

        assert_eq!(adoption, CatalogAdoption { moved: 1, dropped: 1 });
        assert_eq!(
            reconciler.pending(&Session::new(7)).unwrap(),
            vec![Answer::new(13, 7, scalar("Sintra"))]
        );

        // Member 8's drafts only exist in the client cache, under the old ids
        assert_eq!(reconciler.hydrate(&Session::new(8), &cache), 1);
        assert_eq!(reconciler.draft(8, 13), Some(scalar("Sintra")));
        assert_eq!(reconciler.draft(8, 7), None);
        assert_eq!(reconciler.draft(8, 8), None);
    }
}
