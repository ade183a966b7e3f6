use log::{info, warn};
use wayfarer_core::{
    answers::CatalogAdoption,
    catalog::{
        normalize, staleness, CatalogResolver, CatalogSource, LastKnownCatalog, ResolvedCatalog,
        Staleness,
    },
    Question, QuestionId, Room, Session, ValidationError,
};

use crate::{PlannerContext, PlannerError, PlannerResult, PlanningEvent};

pub struct QuestionManager {
    context: PlannerContext,
}

impl QuestionManager {
    pub fn new(context: &PlannerContext) -> Self {
        Self {
            context: context.clone(),
        }
    }

    /// Returns questions for a room without waiting on the database.
    pub fn resolve_now(&self, room: &Room, session: &Session) -> ResolvedCatalog {
        self.context.resolver.resolve(room.id, room.category, session)
    }

    /// Returns the authoritative questions of a room.
    ///
    /// Stale questions are regenerated and fetched again once. If that still doesn't
    /// produce a current catalog, or the database is unreachable, the last cached
    /// catalog is returned even if it expired, and the built-in catalog otherwise.
    pub async fn resolve(&self, room: &Room, session: &Session) -> ResolvedCatalog {
        let last_known = match self.context.resolver.last_known(room.id) {
            Some(LastKnownCatalog {
                questions,
                is_fresh: true,
            }) => {
                return ResolvedCatalog {
                    questions,
                    source: CatalogSource::Cached,
                }
            }
            Some(expired) => Some(expired.questions),
            None => None,
        };

        match self.refresh(room, session, last_known.as_deref()).await {
            Ok(questions) => ResolvedCatalog {
                questions,
                source: CatalogSource::Fetched,
            },
            Err(e) => match last_known {
                Some(questions) => {
                    warn!(
                        "Could not load questions of room {}, using expired ones: {}",
                        room.id, e
                    );

                    ResolvedCatalog {
                        questions,
                        source: CatalogSource::Cached,
                    }
                }
                None => Self::fall_back(room, session, e),
            },
        }
    }

    /// Replaces the questions of a room with the current catalog, regardless of staleness.
    /// Drafts on the replaced questions move to their counterparts in the new catalog.
    pub async fn regenerate(
        &self,
        room: &Room,
        session: &Session,
    ) -> PlannerResult<ResolvedCatalog> {
        let database = &self.context.database;

        // The questions drafts were made against, even if they were never cached here
        let previous = match self.context.resolver.last_known(room.id) {
            Some(last_known) => Some(last_known.questions),
            None => database.questions(room.id).await.ok().map(normalize),
        };

        database.regenerate_questions(room.id).await?;
        self.context.resolver.invalidate(room.id);
        self.context
            .emit(PlanningEvent::CatalogRegenerated { room_id: room.id });

        let catalog = match self.refresh(room, session, previous.as_deref()).await {
            Ok(questions) => ResolvedCatalog {
                questions,
                source: CatalogSource::Fetched,
            },
            Err(e) => Self::fall_back(room, session, e),
        };

        Ok(catalog)
    }

    /// Finds a question of a room by id
    pub async fn question(
        &self,
        room: &Room,
        session: &Session,
        question_id: QuestionId,
    ) -> PlannerResult<Question> {
        self.resolve(room, session)
            .await
            .questions
            .into_iter()
            .find(|q| q.id == question_id)
            .ok_or_else(|| ValidationError::UnknownQuestion(question_id).into())
    }

    /// Fetches and caches the current catalog, then moves drafts onto it from the
    /// built-in catalog and from `previous`.
    async fn refresh(
        &self,
        room: &Room,
        session: &Session,
        previous: Option<&[Question]>,
    ) -> PlannerResult<Vec<Question>> {
        let questions = self.fetch_current(room).await?;
        let questions = self.context.resolver.store(room.id, questions);
        let reconciler = self.context.reconciler(room.id);

        let defaults = CatalogResolver::defaults(room.id, room.category, session);
        reconciler.adopt_catalog(&defaults, &questions);

        if let Some(previous) = previous {
            let adoption = reconciler.adopt_catalog(previous, &questions);

            if adoption != CatalogAdoption::default() {
                info!(
                    "Questions of room {} changed, moved {} drafts and dropped {}",
                    room.id, adoption.moved, adoption.dropped
                );
            }
        }

        Ok(questions)
    }

    fn fall_back(room: &Room, session: &Session, error: PlannerError) -> ResolvedCatalog {
        warn!(
            "Could not load questions of room {}, using defaults: {}",
            room.id, error
        );

        ResolvedCatalog {
            questions: CatalogResolver::defaults(room.id, room.category, session),
            source: CatalogSource::Default,
        }
    }

    async fn fetch_current(&self, room: &Room) -> PlannerResult<Vec<Question>> {
        let database = &self.context.database;
        let fetched = normalize(database.questions(room.id).await?);

        let reason = match staleness(room.category, &fetched) {
            Staleness::Fresh => return Ok(fetched),
            Staleness::Stale(reason) => reason,
        };

        info!(
            "Questions of room {} are stale ({}), regenerating",
            room.id, reason
        );

        database.regenerate_questions(room.id).await?;
        self.context
            .emit(PlanningEvent::CatalogRegenerated { room_id: room.id });

        let regenerated = normalize(database.questions(room.id).await?);

        match staleness(room.category, &regenerated) {
            Staleness::Fresh => {
                self.context
                    .reconciler(room.id)
                    .adopt_catalog(&fetched, &regenerated);
                Ok(regenerated)
            }
            Staleness::Stale(reason) => Err(PlannerError::StaleCatalog {
                room_id: room.id,
                reason: reason.to_string(),
            }),
        }
    }
}
