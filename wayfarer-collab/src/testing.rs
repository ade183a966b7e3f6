//! Helpers shared by the tests of this crate.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use wayfarer_core::{
    Answer, Category, Group, Leg, ManualClock, NewGroup, NewSuggestion, Room, SuggestionDetails,
};
use wayfarer_impls::MemoryCache;

use crate::{
    ArcedGenerator, GeneratorError, MemoryDatabase, Planner, PlannerOptions, PlanningEvent,
    SuggestionGenerator,
};

pub struct TestPlanner {
    pub planner: Planner,
    pub database: Arc<MemoryDatabase>,
    pub clock: Arc<ManualClock>,
}

/// Returns a fixed list of suggestions for every room
pub struct StaticGenerator {
    pub names: Vec<&'static str>,
}

#[async_trait]
impl SuggestionGenerator for StaticGenerator {
    async fn generate(
        &self,
        _group: &Group,
        room: &Room,
        _answers: &[Answer],
    ) -> Result<Vec<NewSuggestion>, GeneratorError> {
        let leg = (room.category == Category::Transportation).then_some(Leg::Departure);

        Ok(self
            .names
            .iter()
            .map(|name| NewSuggestion {
                name: name.to_string(),
                description: None,
                details: SuggestionDetails::default(),
                leg,
            })
            .collect())
    }
}

pub fn planner() -> TestPlanner {
    planner_with_generator(None)
}

pub fn planner_with_generator(generator: Option<ArcedGenerator>) -> TestPlanner {
    let database = Arc::new(MemoryDatabase::new());
    let clock = Arc::new(ManualClock::new(Utc::now()));

    let options = PlannerOptions {
        cache: Arc::new(MemoryCache::new()),
        clock: clock.clone(),
        generator,
        ..Default::default()
    };

    TestPlanner {
        planner: Planner::with_database(database.clone(), options),
        database,
        clock,
    }
}

pub fn new_group(destination: &str, group_size: u32) -> NewGroup {
    NewGroup {
        name: "Summer trip".to_string(),
        origin: "Berlin, Germany".to_string(),
        destination: destination.to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 6, 4).unwrap(),
        group_size,
    }
}

pub fn suggestion(name: &str, leg: Option<Leg>) -> NewSuggestion {
    NewSuggestion {
        name: name.to_string(),
        description: None,
        details: SuggestionDetails::default(),
        leg,
    }
}

/// Every event emitted so far
pub fn drain_events(planner: &Planner) -> Vec<PlanningEvent> {
    std::iter::from_fn(|| planner.try_event()).collect()
}

pub fn room_of(rooms: &[Room], category: Category) -> Room {
    rooms
        .iter()
        .find(|r| r.category == category)
        .cloned()
        .unwrap()
}
