//! Resolves which questions a room asks.

mod defaults;
mod schema;

use std::collections::HashSet;

use log::{debug, warn};
use serde::Serialize;

pub use defaults::*;
pub use schema::*;

use crate::{
    ArcedCache, ArcedClock, CacheKey, Category, ClientCacheExt, Config, Question, RoomId, Session,
};

/// Where a resolved catalog came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Built in, shown while the authoritative catalog loads
    Default,
    /// Reused from an earlier resolution within the cache window
    Cached,
    /// Freshly fetched from the server
    Fetched,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCatalog {
    pub questions: Vec<Question>,
    pub source: CatalogSource,
}

/// A cached catalog along with whether it is still within the cache window
#[derive(Debug, Clone, PartialEq)]
pub struct LastKnownCatalog {
    pub questions: Vec<Question>,
    pub is_fresh: bool,
}

/// Produces an ordered question list for a room without ever blocking on the network.
pub struct CatalogResolver {
    config: Config,
    clock: ArcedClock,
    cache: ArcedCache,
}

impl CatalogResolver {
    pub fn new(config: &Config, clock: ArcedClock, cache: ArcedCache) -> Self {
        Self {
            config: config.clone(),
            clock,
            cache,
        }
    }

    /// Returns the last cached catalog, otherwise the built-in catalog for the category.
    ///
    /// A cached catalog past its window is still preferred over the built-in one,
    /// since drafts are keyed by the ids it carries.
    pub fn resolve(&self, room_id: RoomId, category: Category, session: &Session) -> ResolvedCatalog {
        match self.last_known(room_id) {
            Some(last_known) => ResolvedCatalog {
                questions: last_known.questions,
                source: CatalogSource::Cached,
            },
            None => ResolvedCatalog {
                questions: Self::defaults(room_id, category, session),
                source: CatalogSource::Default,
            },
        }
    }

    /// Returns the cached catalog, if any was stored within the cache window.
    pub fn cached(&self, room_id: RoomId) -> Option<Vec<Question>> {
        self.last_known(room_id)
            .filter(|l| l.is_fresh)
            .map(|l| l.questions)
    }

    /// Returns the cached catalog regardless of its age.
    ///
    /// Expired catalogs stay in the cache until [Self::store] or [Self::invalidate]
    /// replaces them, so they can stand in while the database is unreachable.
    pub fn last_known(&self, room_id: RoomId) -> Option<LastKnownCatalog> {
        let key = CacheKey::Questions(room_id);
        let entry = self.cache.get(&key)?;
        let is_fresh = entry.is_fresh(self.clock.now(), self.config.catalog_ttl());

        match serde_json::from_value(entry.value) {
            Ok(questions) => Some(LastKnownCatalog {
                questions,
                is_fresh,
            }),
            Err(e) => {
                warn!("Discarding unreadable cached questions of room {}: {}", room_id, e);
                self.cache.remove(&key);
                None
            }
        }
    }

    /// Normalizes a fetched catalog and caches it. Returns what was cached.
    pub fn store(&self, room_id: RoomId, questions: Vec<Question>) -> Vec<Question> {
        let questions = normalize(questions);

        debug!("Caching {} questions for room {}", questions.len(), room_id);
        self.cache
            .write(CacheKey::Questions(room_id), &questions, self.clock.now());

        questions
    }

    pub fn invalidate(&self, room_id: RoomId) {
        self.cache.remove(&CacheKey::Questions(room_id))
    }

    /// The built-in catalog, priced in the session currency.
    pub fn defaults(room_id: RoomId, category: Category, session: &Session) -> Vec<Question> {
        normalize(default_catalog(room_id, category, session.currency()))
    }
}

/// Removes questions with duplicate text and sorts the rest deterministically.
///
/// Text is compared trimmed and lowercased, and the first occurrence wins.
/// The result is ordered by explicit order, then id, then text.
pub fn normalize(questions: Vec<Question>) -> Vec<Question> {
    let mut seen = HashSet::new();

    let mut unique: Vec<_> = questions
        .into_iter()
        .filter(|q| seen.insert(q.normalized_text()))
        .collect();

    unique.sort_by(|a, b| {
        a.order
            .cmp(&b.order)
            .then(a.id.cmp(&b.id))
            .then_with(|| a.normalized_text().cmp(&b.normalized_text()))
    });

    unique
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use chrono::{Duration, Utc};

    use super::{normalize, CatalogResolver, CatalogSource};
    use crate::{
        util::TestCache, Category, Config, ManualClock, Question, QuestionKind, Session,
    };

    fn question(id: i32, order: i32, text: &str) -> Question {
        Question {
            id,
            room_id: 1,
            schema_version: 2,
            text: text.to_string(),
            order,
            kind: QuestionKind::Date,
        }
    }

    fn texts(questions: &[Question]) -> Vec<&str> {
        questions.iter().map(|q| q.text.as_str()).collect()
    }

    #[test]
    fn first_duplicate_wins() {
        let questions = vec![
            question(3, 0, "Where to?"),
            question(1, 0, "  where TO? "),
            question(2, 1, "When?"),
        ];

        let normalized = normalize(questions);

        assert_eq!(normalized.len(), 2);
        assert_eq!(normalized[0].id, 3);
        assert_eq!(texts(&normalized), vec!["Where to?", "When?"]);
    }

    #[test]
    fn orders_by_order_then_id_then_text() {
        let questions = vec![
            question(5, 2, "c"),
            question(4, 1, "b"),
            question(2, 1, "a"),
            question(2, 1, "0"),
        ];

        let normalized = normalize(questions);

        assert_eq!(texts(&normalized), vec!["0", "a", "b", "c"]);
    }

    #[test]
    fn normalizing_twice_changes_nothing() {
        let questions = vec![
            question(3, 2, "One"),
            question(1, 0, "Two"),
            question(2, 0, "one"),
            question(7, 1, "Three"),
        ];

        let once = normalize(questions);
        let twice = normalize(once.clone());

        assert_eq!(once, twice);
    }

    #[test]
    fn resolves_defaults_then_cache_within_window() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let resolver = CatalogResolver::new(
            &Config::default(),
            clock.clone(),
            Arc::new(TestCache::default()),
        );
        let session = Session::new(1).with_currency("EUR");

        let first = resolver.resolve(1, Category::Dining, &session);
        assert_eq!(first.source, CatalogSource::Default);
        assert!(!first.questions.is_empty());
        assert!(first.questions.iter().any(|q| matches!(
            &q.kind,
            QuestionKind::Range { currency, .. } if currency == "EUR"
        )));

        resolver.store(1, vec![question(10, 0, "Fetched")]);

        let second = resolver.resolve(1, Category::Dining, &session);
        assert_eq!(second.source, CatalogSource::Cached);
        assert_eq!(texts(&second.questions), vec!["Fetched"]);

        clock.advance(Duration::minutes(6));

        let third = resolver.resolve(1, Category::Dining, &session);
        assert_eq!(third.source, CatalogSource::Cached);
        assert_eq!(texts(&third.questions), vec!["Fetched"]);

        resolver.invalidate(1);

        let fourth = resolver.resolve(1, Category::Dining, &session);
        assert_eq!(fourth.source, CatalogSource::Default);
    }

    #[test]
    fn expired_catalogs_are_kept_until_replaced() {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let resolver = CatalogResolver::new(
            &Config::default(),
            clock.clone(),
            Arc::new(TestCache::default()),
        );

        resolver.store(1, vec![question(7, 0, "Old")]);
        clock.advance(Duration::minutes(6));

        assert_eq!(resolver.cached(1), None);

        let last_known = resolver.last_known(1).unwrap();
        assert!(!last_known.is_fresh);
        assert_eq!(texts(&last_known.questions), vec!["Old"]);

        // Reading an expired catalog doesn't evict it
        assert!(resolver.last_known(1).is_some());

        resolver.store(1, vec![question(13, 0, "New")]);

        let last_known = resolver.last_known(1).unwrap();
        assert!(last_known.is_fresh);
        assert_eq!(texts(&resolver.cached(1).unwrap()), vec!["New"]);
    }

    #[test]
    fn defaults_are_deterministic() {
        let session = Session::anonymous();

        assert_eq!(
            CatalogResolver::defaults(1, Category::Transportation, &session),
            CatalogResolver::defaults(1, Category::Transportation, &session)
        );
    }
}
