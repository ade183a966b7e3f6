//! Lays ranked group preferences out over the days of a trip.

use std::collections::{HashMap, HashSet};

use chrono::{Days, NaiveDate};
use serde::Serialize;

use crate::{normalize_text, voting::TopPreference, Category, Group, SuggestionId};

/// Something placed on a day of the itinerary
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pick {
    /// Absent for picks that come from raw member selections
    pub suggestion_id: Option<SuggestionId>,
    pub name: String,
    pub likes: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Day {
    /// 1-indexed
    pub number: u32,
    pub date: NaiveDate,
    pub travel: Option<Pick>,
    pub stay: Option<Pick>,
    pub activities: Vec<Pick>,
    pub dining: Option<Pick>,
}

/// The ranked preferences of every category, with raw selections to fall back on
#[derive(Debug, Clone, Default)]
pub struct CategoryPreferences {
    ranked: HashMap<Category, Vec<TopPreference>>,
    selections: HashMap<Category, Vec<String>>,
}

impl Pick {
    /// Ranked picks match by suggestion, selection picks by name.
    pub fn is_same_as(&self, other: &Pick) -> bool {
        match (self.suggestion_id, other.suggestion_id) {
            (Some(a), Some(b)) => a == b,
            (None, None) => normalize_text(&self.name) == normalize_text(&other.name),
            _ => false,
        }
    }
}

impl From<&TopPreference> for Pick {
    fn from(value: &TopPreference) -> Self {
        Self {
            suggestion_id: Some(value.suggestion_id),
            name: value.name.clone(),
            likes: value.likes,
        }
    }
}

impl CategoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ranked(mut self, category: Category, ranked: Vec<TopPreference>) -> Self {
        self.set_ranked(category, ranked);
        self
    }

    pub fn with_selections(mut self, category: Category, selections: Vec<String>) -> Self {
        self.set_selections(category, selections);
        self
    }

    pub fn set_ranked(&mut self, category: Category, ranked: Vec<TopPreference>) {
        self.ranked.insert(category, ranked);
    }

    pub fn set_selections(&mut self, category: Category, selections: Vec<String>) {
        self.selections.insert(category, selections);
    }

    /// The candidates of a category, best first.
    ///
    /// Uses the ranking when there is one, otherwise the distinct raw selections
    /// as zero-like picks.
    pub fn picks(&self, category: Category) -> Vec<Pick> {
        if let Some(ranked) = self.ranked.get(&category).filter(|r| !r.is_empty()) {
            return ranked.iter().map(Pick::from).collect();
        }

        let mut seen = HashSet::new();

        self.selections
            .get(&category)
            .into_iter()
            .flatten()
            .filter(|s| !s.trim().is_empty() && seen.insert(normalize_text(s)))
            .map(|s| Pick {
                suggestion_id: None,
                name: s.trim().to_string(),
                likes: 0,
            })
            .collect()
    }
}

/// Builds one entry per day of the trip.
///
/// Travel goes on the first day, the top stay repeats every day, activities and
/// dining rotate through their rankings. Categories without candidates are left out.
pub fn synthesize(group: &Group, preferences: &CategoryPreferences) -> Vec<Day> {
    let first_date = group.start_date.min(group.end_date);

    let travel = preferences.picks(Category::Transportation);
    let stays = preferences.picks(Category::Accommodation);
    let activities = preferences.picks(Category::Activities);
    let dining = preferences.picks(Category::Dining);

    (1..=group.day_count())
        .map(|number| {
            let index = (number - 1) as usize;

            Day {
                number,
                date: first_date + Days::new(index as u64),
                travel: (number == 1).then(|| travel.first().cloned()).flatten(),
                stay: stays.first().cloned(),
                activities: activities_for(&activities, index),
                dining: rotate(&dining, index).cloned(),
            }
        })
        .collect()
}

fn rotate(picks: &[Pick], index: usize) -> Option<&Pick> {
    if picks.is_empty() {
        None
    } else {
        picks.get(index % picks.len())
    }
}

fn activities_for(picks: &[Pick], index: usize) -> Vec<Pick> {
    let Some(first) = rotate(picks, index) else {
        return vec![];
    };

    let mut day = vec![first.clone()];

    if let Some(second) = rotate(picks, index + 1).filter(|s| !s.is_same_as(first)) {
        day.push(second.clone());
    }

    day
}

#[cfg(test)]
mod test {
    use chrono::NaiveDate;

    use super::{synthesize, CategoryPreferences, Pick};
    use crate::{voting::TopPreference, Category, Group};

    fn group(days: u32) -> Group {
        let start = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();

        Group {
            id: 1,
            name: "Autumn".to_string(),
            origin: "Oslo, Norway".to_string(),
            destination: "Lisbon".to_string(),
            start_date: start,
            end_date: start + chrono::Days::new(days as u64 - 1),
            group_size: 4,
        }
    }

    fn top(id: i32, name: &str, likes: usize) -> TopPreference {
        TopPreference {
            suggestion_id: id,
            name: name.to_string(),
            likes,
        }
    }

    fn names(picks: &[Pick]) -> Vec<&str> {
        picks.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn four_day_rotation() {
        let preferences = CategoryPreferences::new()
            .with_ranked(Category::Activities, vec![top(1, "A", 3), top(2, "B", 1)])
            .with_ranked(Category::Dining, vec![top(3, "X", 2)])
            .with_ranked(Category::Accommodation, vec![top(4, "Stay", 4), top(5, "Other", 1)])
            .with_ranked(Category::Transportation, vec![top(6, "Train", 2)]);

        let days = synthesize(&group(4), &preferences);

        assert_eq!(days.len(), 4);

        let activities: Vec<_> = days.iter().map(|d| names(&d.activities)).collect();
        assert_eq!(
            activities,
            vec![
                vec!["A", "B"],
                vec!["B", "A"],
                vec!["A", "B"],
                vec!["B", "A"]
            ]
        );

        for day in &days {
            assert_eq!(day.dining.as_ref().unwrap().name, "X");
            assert_eq!(day.stay.as_ref().unwrap().name, "Stay");
        }

        assert_eq!(days[0].travel.as_ref().unwrap().name, "Train");
        assert!(days[1..].iter().all(|d| d.travel.is_none()));
        assert_eq!(days[3].date, NaiveDate::from_ymd_opt(2025, 9, 4).unwrap());
    }

    #[test]
    fn single_activity_is_not_duplicated() {
        let preferences =
            CategoryPreferences::new().with_ranked(Category::Activities, vec![top(1, "A", 1)]);

        let days = synthesize(&group(2), &preferences);

        assert!(days.iter().all(|d| names(&d.activities) == vec!["A"]));
    }

    #[test]
    fn falls_back_to_raw_selections() {
        let preferences = CategoryPreferences::new()
            .with_ranked(Category::Dining, vec![])
            .with_selections(
                Category::Dining,
                vec![
                    "Street food".to_string(),
                    "street food ".to_string(),
                    "Local".to_string(),
                ],
            );

        let days = synthesize(&group(3), &preferences);
        let dining: Vec<_> = days
            .iter()
            .map(|d| d.dining.as_ref().unwrap().name.as_str())
            .collect();

        assert_eq!(dining, vec!["Street food", "Local", "Street food"]);
        assert_eq!(days[0].dining.as_ref().unwrap().likes, 0);
    }

    #[test]
    fn empty_categories_are_omitted() {
        let days = synthesize(&group(2), &CategoryPreferences::new());

        assert_eq!(days.len(), 2);
        for day in days {
            assert!(day.travel.is_none());
            assert!(day.stay.is_none());
            assert!(day.activities.is_empty());
            assert!(day.dining.is_none());
        }
    }
}
