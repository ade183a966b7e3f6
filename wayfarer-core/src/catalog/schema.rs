use std::fmt::Display;

use crate::{normalize_text, Category, Question};

/// What the current catalog of a category must look like
#[derive(Debug)]
pub struct CategorySchema {
    pub version: u32,
    /// Question texts every current catalog contains
    pub required: &'static [&'static str],
    /// Wording that only appeared in retired schemas
    pub retired: &'static [&'static str],
}

#[derive(Debug, Clone, PartialEq)]
pub enum Staleness {
    Fresh,
    Stale(StaleReason),
}

#[derive(Debug, Clone, PartialEq)]
pub enum StaleReason {
    Empty,
    OutdatedVersion { found: u32, current: u32 },
    RetiredWording(String),
    MissingRequired(&'static str),
}

pub const ACCOMMODATION_SCHEMA: CategorySchema = CategorySchema {
    version: 2,
    required: &[
        "What is your nightly budget per person?",
        "What type of accommodation do you prefer?",
        "Which amenities are must-haves?",
    ],
    retired: &["star rating", "how many beds"],
};

pub const TRANSPORTATION_SCHEMA: CategorySchema = CategorySchema {
    version: 2,
    required: &[
        "What is your transportation budget per person?",
        "How would you like to get there?",
        "What date would you like to depart?",
        "What date would you like to return?",
    ],
    retired: &["preferred airline", "seat preference"],
};

pub const ACTIVITIES_SCHEMA: CategorySchema = CategorySchema {
    version: 2,
    required: &[
        "What is your daily activity budget per person?",
        "Which kinds of activities interest you?",
    ],
    retired: &["adventure level"],
};

pub const DINING_SCHEMA: CategorySchema = CategorySchema {
    version: 3,
    required: &[
        "What is your budget per meal?",
        "Which cuisines are you excited about?",
        "Do you have any dietary needs?",
    ],
    retired: &["dietary restrictions", "any food allergies"],
};

pub fn schema_for(category: Category) -> &'static CategorySchema {
    match category {
        Category::Accommodation => &ACCOMMODATION_SCHEMA,
        Category::Transportation => &TRANSPORTATION_SCHEMA,
        Category::Activities => &ACTIVITIES_SCHEMA,
        Category::Dining => &DINING_SCHEMA,
    }
}

/// Decides whether a fetched catalog still matches the current schema of its category.
///
/// Versioned questions are compared by version. Retired wording and required texts
/// are checked for every question, which also covers rows written before versioning.
pub fn staleness(category: Category, questions: &[Question]) -> Staleness {
    let schema = schema_for(category);

    if questions.is_empty() {
        return Staleness::Stale(StaleReason::Empty);
    }

    let outdated = questions
        .iter()
        .map(|q| q.schema_version)
        .filter(|v| *v > 0 && *v < schema.version)
        .min();

    if let Some(found) = outdated {
        return Staleness::Stale(StaleReason::OutdatedVersion {
            found,
            current: schema.version,
        });
    }

    let texts: Vec<_> = questions.iter().map(|q| q.normalized_text()).collect();

    for text in &texts {
        if let Some(marker) = schema.retired.iter().find(|m| text.contains(*m)) {
            return Staleness::Stale(StaleReason::RetiredWording(marker.to_string()));
        }
    }

    for required in schema.required {
        if !texts.contains(&normalize_text(required)) {
            return Staleness::Stale(StaleReason::MissingRequired(*required));
        }
    }

    Staleness::Fresh
}

impl Staleness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Staleness::Stale(_))
    }
}

impl Display for StaleReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaleReason::Empty => write!(f, "catalog is empty"),
            StaleReason::OutdatedVersion { found, current } => {
                write!(f, "schema version {} is older than {}", found, current)
            }
            StaleReason::RetiredWording(marker) => {
                write!(f, "contains retired wording \"{}\"", marker)
            }
            StaleReason::MissingRequired(text) => write!(f, "missing \"{}\"", text),
        }
    }
}

#[cfg(test)]
mod test {
    use super::{schema_for, staleness, StaleReason, Staleness};
    use crate::{catalog::default_catalog, Category, Question, QuestionKind};

    fn question(text: &str, version: u32) -> Question {
        Question {
            id: 1,
            room_id: 1,
            schema_version: version,
            text: text.to_string(),
            order: 0,
            kind: QuestionKind::FreeText { placeholder: None },
        }
    }

    #[test]
    fn defaults_are_fresh() {
        for category in Category::ALL {
            let catalog = default_catalog(1, category, "USD");
            assert_eq!(staleness(category, &catalog), Staleness::Fresh);
        }
    }

    #[test]
    fn detects_retired_dietary_wording() {
        let mut catalog = default_catalog(1, Category::Dining, "USD");
        catalog.push(question("Any Dietary Restrictions?", 0));

        assert_eq!(
            staleness(Category::Dining, &catalog),
            Staleness::Stale(StaleReason::RetiredWording(
                "dietary restrictions".to_string()
            ))
        );
    }

    #[test]
    fn detects_older_versions() {
        let mut catalog = default_catalog(1, Category::Dining, "USD");
        catalog[0].schema_version = 2;

        assert_eq!(
            staleness(Category::Dining, &catalog),
            Staleness::Stale(StaleReason::OutdatedVersion {
                found: 2,
                current: schema_for(Category::Dining).version
            })
        );
    }

    #[test]
    fn detects_missing_required_questions() {
        let catalog = vec![question("What is your budget per meal?", 3)];

        assert!(matches!(
            staleness(Category::Dining, &catalog),
            Staleness::Stale(StaleReason::MissingRequired(_))
        ));
    }

    #[test]
    fn unversioned_rows_with_current_wording_are_fresh() {
        let catalog: Vec<_> = default_catalog(1, Category::Activities, "USD")
            .into_iter()
            .map(|mut q| {
                q.schema_version = 0;
                q
            })
            .collect();

        assert_eq!(staleness(Category::Activities, &catalog), Staleness::Fresh);
    }

    #[test]
    fn empty_catalogs_are_stale() {
        assert_eq!(
            staleness(Category::Accommodation, &[]),
            Staleness::Stale(StaleReason::Empty)
        );
    }
}
