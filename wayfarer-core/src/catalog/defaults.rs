use crate::{Category, Question, QuestionKind, RoomId};

use super::schema_for;

/// Builds the catalog shown before the authoritative one has loaded.
///
/// Default questions carry negative ids so they never collide with stored ones.
/// Budget questions are expressed in `currency`.
pub fn default_catalog(room_id: RoomId, category: Category, currency: &str) -> Vec<Question> {
    let version = schema_for(category).version;

    let kinds = match category {
        Category::Accommodation => accommodation(currency),
        Category::Transportation => transportation(currency),
        Category::Activities => activities(currency),
        Category::Dining => dining(currency),
    };

    kinds
        .into_iter()
        .enumerate()
        .map(|(index, (text, kind))| Question {
            id: -(index as i32 + 1),
            room_id,
            schema_version: version,
            text: text.to_string(),
            order: index as i32,
            kind,
        })
        .collect()
}

fn budget(max: f64, step: f64, currency: &str) -> QuestionKind {
    QuestionKind::Range {
        min: 0.,
        max,
        step,
        currency: currency.to_string(),
    }
}

fn options(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

fn accommodation(currency: &str) -> Vec<(&'static str, QuestionKind)> {
    vec![
        (
            "What is your nightly budget per person?",
            budget(1000., 25., currency),
        ),
        (
            "What type of accommodation do you prefer?",
            QuestionKind::MultiSelect {
                options: options(&[
                    "Hotel",
                    "Hostel",
                    "Vacation rental",
                    "Boutique hotel",
                    "Camping",
                ]),
            },
        ),
        (
            "Which amenities are must-haves?",
            QuestionKind::MultiSelect {
                options: options(&[
                    "Wi-Fi",
                    "Kitchen",
                    "Pool",
                    "Parking",
                    "Gym",
                    "Breakfast included",
                ]),
            },
        ),
        (
            "How many people are you willing to share a room with?",
            QuestionKind::SingleSelect {
                options: options(&["0", "1", "2", "3+"]),
            },
        ),
        (
            "Which neighborhood vibe do you prefer?",
            QuestionKind::Dropdown {
                options: options(&[
                    "City center",
                    "Quiet residential",
                    "Near nature",
                    "Nightlife district",
                ]),
            },
        ),
        (
            "Anything else we should know about where you stay?",
            QuestionKind::FreeText {
                placeholder: Some("e.g. step-free access".to_string()),
            },
        ),
    ]
}

fn transportation(currency: &str) -> Vec<(&'static str, QuestionKind)> {
    vec![
        (
            "What is your transportation budget per person?",
            budget(2000., 50., currency),
        ),
        (
            "How would you like to get there?",
            QuestionKind::MultiSelect {
                options: options(&["Flight", "Train", "Bus", "Car rental", "Ferry"]),
            },
        ),
        ("What date would you like to depart?", QuestionKind::Date),
        ("What date would you like to return?", QuestionKind::Date),
        (
            "How would you like to get around at the destination?",
            QuestionKind::MultiSelect {
                options: options(&[
                    "Walking",
                    "Public transit",
                    "Rideshare",
                    "Rental car",
                    "Bike",
                ]),
            },
        ),
        (
            "Preferred departure time?",
            QuestionKind::SingleSelect {
                options: options(&["Morning", "Afternoon", "Evening", "Red-eye"]),
            },
        ),
    ]
}

fn activities(currency: &str) -> Vec<(&'static str, QuestionKind)> {
    vec![
        (
            "What is your daily activity budget per person?",
            budget(500., 10., currency),
        ),
        (
            "Which kinds of activities interest you?",
            QuestionKind::MultiSelect {
                options: options(&[
                    "Museums",
                    "Hiking",
                    "Beaches",
                    "Nightlife",
                    "Food tours",
                    "Shopping",
                    "Live music",
                ]),
            },
        ),
        (
            "How packed should each day be?",
            QuestionKind::SingleSelect {
                options: options(&["Relaxed", "Balanced", "Packed"]),
            },
        ),
        (
            "Any must-see places?",
            QuestionKind::FreeText {
                placeholder: Some("e.g. a landmark or a neighborhood".to_string()),
            },
        ),
    ]
}

fn dining(currency: &str) -> Vec<(&'static str, QuestionKind)> {
    vec![
        ("What is your budget per meal?", budget(300., 5., currency)),
        (
            "Which cuisines are you excited about?",
            QuestionKind::MultiSelect {
                options: options(&[
                    "Local",
                    "Italian",
                    "Japanese",
                    "Mexican",
                    "Indian",
                    "Street food",
                    "Vegetarian",
                ]),
            },
        ),
        (
            "Do you have any dietary needs?",
            QuestionKind::MultiSelect {
                options: options(&[
                    "None",
                    "Vegetarian",
                    "Vegan",
                    "Gluten-free",
                    "Halal",
                    "Kosher",
                    "Nut allergy",
                ]),
            },
        ),
        (
            "What dining atmosphere do you prefer?",
            QuestionKind::Dropdown {
                options: options(&["Casual", "Fine dining", "Cafe", "Food market"]),
            },
        ),
    ]
}
