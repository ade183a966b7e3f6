mod answers;
mod db;
mod error;
mod events;
mod generator;
mod groups;
mod questions;
mod results;
mod voting;

#[cfg(test)]
mod testing;

use std::sync::Arc;

use crossbeam::channel::unbounded;
use dashmap::DashMap;
use log::debug;

pub use answers::*;
pub use db::*;
pub use error::*;
pub use events::*;
pub use generator::*;
pub use groups::*;
pub use questions::*;
pub use results::*;
pub use voting::*;

use wayfarer_core::{
    answers::AnswerReconciler, catalog::CatalogResolver, ArcedCache, ArcedClock, Config, RoomId,
    SystemClock,
};
use wayfarer_impls::MemoryCache;

// Reduces verbosity
type Store<Id, T> = Arc<DashMap<Id, Arc<T>>>;

/// The wayfarer planner, facilitating groups, questions, answers, voting, and results.
pub struct Planner {
    context: PlannerContext,
    event_receiver: EventReceiver,

    pub groups: GroupManager,
    pub questions: QuestionManager,
    pub answers: AnswerManager,
    pub voting: VotingManager,
    pub results: ResultsManager,
}

/// A type passed to the managers of the planner, to access state and emit events.
#[derive(Clone)]
pub struct PlannerContext {
    pub config: Config,
    pub database: Arc<dyn Database>,
    pub cache: ArcedCache,
    pub clock: ArcedClock,
    pub generator: Option<ArcedGenerator>,
    pub resolver: Arc<CatalogResolver>,

    pub reconcilers: Store<RoomId, AnswerReconciler>,

    event_sender: EventSender,
}

pub struct PlannerOptions {
    pub config: Config,
    /// Where drafts, catalogs, and suggestions are kept between sessions
    pub cache: ArcedCache,
    pub clock: ArcedClock,
    pub generator: Option<ArcedGenerator>,
}

impl Planner {
    pub fn new<Db>(database: Db, options: PlannerOptions) -> Self
    where
        Db: Database + 'static,
    {
        Self::with_database(Arc::new(database), options)
    }

    /// Creates a planner on a database that is also used elsewhere.
    pub fn with_database(database: Arc<dyn Database>, options: PlannerOptions) -> Self {
        let (event_sender, event_receiver) = unbounded();

        let resolver = CatalogResolver::new(
            &options.config,
            options.clock.clone(),
            options.cache.clone(),
        );

        let context = PlannerContext {
            config: options.config,
            database,
            cache: options.cache,
            clock: options.clock,
            generator: options.generator,
            resolver: Arc::new(resolver),

            reconcilers: Default::default(),

            event_sender,
        };

        Self {
            groups: GroupManager::new(&context),
            questions: QuestionManager::new(&context),
            answers: AnswerManager::new(&context),
            voting: VotingManager::new(&context),
            results: ResultsManager::new(&context),
            context,
            event_receiver,
        }
    }

    pub fn context(&self) -> &PlannerContext {
        &self.context
    }

    /// Blocks until the planner emits an event.
    /// Returns [None] if the planner has been dropped.
    pub fn wait_for_event(&self) -> Option<PlanningEvent> {
        self.event_receiver.recv().ok()
    }

    /// Returns the next event if one is pending.
    pub fn try_event(&self) -> Option<PlanningEvent> {
        self.event_receiver.try_recv().ok()
    }

    /// A handle that receives events independently of the planner.
    pub fn events(&self) -> EventReceiver {
        self.event_receiver.clone()
    }
}

impl PlannerContext {
    pub fn emit(&self, event: PlanningEvent) {
        if self.event_sender.send(event).is_err() {
            debug!("Dropped event, the planner no longer listens");
        }
    }

    /// Returns the reconciler holding the drafts of a room, creating it if needed.
    pub fn reconciler(&self, room_id: RoomId) -> Arc<AnswerReconciler> {
        self.reconcilers
            .entry(room_id)
            .or_insert_with(|| {
                Arc::new(AnswerReconciler::new(
                    room_id,
                    &self.config,
                    self.clock.clone(),
                ))
            })
            .clone()
    }
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            config: Config::default(),
            cache: Arc::new(MemoryCache::new()),
            clock: Arc::new(SystemClock),
            generator: None,
        }
    }
}
