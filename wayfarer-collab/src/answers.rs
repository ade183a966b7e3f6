use std::collections::{BTreeSet, HashSet};

use log::{info, warn};
use serde::Serialize;
use wayfarer_core::{
    answers::Edit,
    catalog::{CatalogResolver, CatalogSource},
    Answer, AnswerValue, Question, QuestionId, RoomId, Session,
};

use crate::{PlannerContext, PlannerResult, PlanningEvent, QuestionManager};

pub struct AnswerManager {
    context: PlannerContext,
    questions: QuestionManager,
}

/// A question together with the member's current answer to it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnsweredQuestion {
    pub question: Question,
    pub value: Option<AnswerValue>,
    pub is_editing: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnsweredQuestions {
    pub source: CatalogSource,
    pub questions: Vec<AnsweredQuestion>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailedSubmission {
    pub question_id: QuestionId,
    pub reason: String,
}

/// The result of submitting every draft of a member.
/// Each answer is submitted on its own, so some may fail while others succeed.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SubmissionReport {
    pub submitted: Vec<QuestionId>,
    pub failed: Vec<FailedSubmission>,
}

impl SubmissionReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

impl AnswerManager {
    pub fn new(context: &PlannerContext) -> Self {
        Self {
            context: context.clone(),
            questions: QuestionManager::new(context),
        }
    }

    /// Returns the questions of a room with the member's answers merged in.
    ///
    /// Drafts are restored from the client cache first. Server answers only fill in
    /// questions the member has not answered and is not currently editing.
    pub async fn answered_questions(
        &self,
        room_id: RoomId,
        session: &Session,
    ) -> PlannerResult<AnsweredQuestions> {
        let room = self.context.database.room_by_id(room_id).await?;
        let catalog = self.questions.resolve(&room, session).await;
        let reconciler = self.context.reconciler(room_id);

        reconciler.hydrate(session, self.context.cache.as_ref());

        if catalog.source != CatalogSource::Default {
            let defaults = CatalogResolver::defaults(room_id, room.category, session);
            reconciler.adopt_catalog(&defaults, &catalog.questions);
        }

        let server_answers = match session.member() {
            Some(member_id) => self
                .context
                .database
                .answers(room_id, Some(member_id))
                .await
                .unwrap_or_else(|e| {
                    warn!("Could not load answers of room {}: {}", room_id, e);
                    vec![]
                }),
            None => vec![],
        };

        let questions = catalog
            .questions
            .into_iter()
            .map(|question| {
                let server = server_answers.iter().find(|a| a.question_id == question.id);
                let value = reconciler.reconcile(session, question.id, server);
                let is_editing = session
                    .member()
                    .is_some_and(|m| reconciler.is_editing(m, question.id));

                AnsweredQuestion {
                    question,
                    value,
                    is_editing,
                }
            })
            .collect();

        reconciler.persist(session, self.context.cache.as_ref());

        Ok(AnsweredQuestions {
            source: catalog.source,
            questions,
        })
    }

    /// Marks the member as editing a question, so incoming answers don't overwrite it.
    pub fn begin_edit(
        &self,
        room_id: RoomId,
        session: &Session,
        question_id: QuestionId,
    ) -> PlannerResult<()> {
        Ok(self
            .context
            .reconciler(room_id)
            .begin_edit(session, question_id)?)
    }

    /// Applies an edit to the member's draft and keeps the draft in the client cache.
    pub async fn record_edit(
        &self,
        room_id: RoomId,
        session: &Session,
        question_id: QuestionId,
        edit: Edit,
    ) -> PlannerResult<Option<AnswerValue>> {
        session.member_id()?;

        let room = self.context.database.room_by_id(room_id).await?;
        let question = self.questions.question(&room, session, question_id).await?;
        let reconciler = self.context.reconciler(room_id);

        let value = reconciler.record_edit(session, &question, edit)?;
        reconciler.persist(session, self.context.cache.as_ref());

        Ok(value)
    }

    /// Submits every non-empty draft of the member.
    pub async fn submit_all(
        &self,
        room_id: RoomId,
        session: &Session,
    ) -> PlannerResult<SubmissionReport> {
        let member_id = session.member_id()?;
        let reconciler = self.context.reconciler(room_id);

        reconciler.hydrate(session, self.context.cache.as_ref());

        let mut report = SubmissionReport::default();

        for answer in reconciler.pending(session)? {
            match self.context.database.submit_answer(room_id, &answer).await {
                Ok(()) => {
                    reconciler.end_edit(member_id, answer.question_id);
                    report.submitted.push(answer.question_id)
                }
                Err(e) => {
                    warn!(
                        "Could not submit answer to question {} for member {}: {}",
                        answer.question_id, member_id, e
                    );

                    report.failed.push(FailedSubmission {
                        question_id: answer.question_id,
                        reason: e.to_string(),
                    });
                }
            }
        }

        info!(
            "Member {} submitted {} answers to room {}, {} failed",
            member_id,
            report.submitted.len(),
            room_id,
            report.failed.len()
        );

        self.context.emit(PlanningEvent::AnswersSubmitted {
            room_id,
            member_id,
            submitted: report.submitted.clone(),
            failed: report.failed.iter().map(|f| f.question_id).collect(),
        });

        Ok(report)
    }

    /// Every answer given to the room, by any member
    pub async fn room_answers(&self, room_id: RoomId) -> PlannerResult<Vec<Answer>> {
        Ok(self.context.database.answers(room_id, None).await?)
    }

    /// The distinct options members picked on questions that offer options, in the
    /// order they were first seen.
    pub async fn selections(&self, room_id: RoomId) -> PlannerResult<Vec<String>> {
        let with_options: HashSet<_> = self
            .context
            .database
            .questions(room_id)
            .await?
            .iter()
            .filter(|q| q.offers_options())
            .map(|q| q.id)
            .collect();

        let answers = self.room_answers(room_id).await?;
        let mut seen = BTreeSet::new();

        Ok(answers
            .iter()
            .filter(|a| with_options.contains(&a.question_id))
            .flat_map(|a| a.value.selections())
            .filter(|s| seen.insert(s.to_string()))
            .cloned()
            .collect())
    }
}
