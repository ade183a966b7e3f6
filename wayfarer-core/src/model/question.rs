use serde::{Deserialize, Serialize};

use crate::{QuestionId, RoomId};

/// A question members answer for a room
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub room_id: RoomId,
    /// The catalog schema this question was written for. 0 means unversioned.
    pub schema_version: u32,
    pub text: String,
    /// Explicit position within the catalog, ascending
    pub order: i32,
    pub kind: QuestionKind,
}

/// The input a question expects, along with its parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum QuestionKind {
    Range {
        min: f64,
        max: f64,
        step: f64,
        currency: String,
    },
    SingleSelect {
        options: Vec<String>,
    },
    MultiSelect {
        options: Vec<String>,
    },
    Dropdown {
        options: Vec<String>,
    },
    FreeText {
        placeholder: Option<String>,
    },
    Date,
}

impl Question {
    /// The text used to tell questions apart, regardless of casing and padding.
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }

    pub fn is_multi_select(&self) -> bool {
        matches!(self.kind, QuestionKind::MultiSelect { .. })
    }

    /// Returns true if members answer by picking from a list of options.
    pub fn offers_options(&self) -> bool {
        matches!(
            self.kind,
            QuestionKind::SingleSelect { .. }
                | QuestionKind::MultiSelect { .. }
                | QuestionKind::Dropdown { .. }
        )
    }
}

impl QuestionKind {
    pub fn name(&self) -> &'static str {
        match self {
            QuestionKind::Range { .. } => "range",
            QuestionKind::SingleSelect { .. } => "single-select",
            QuestionKind::MultiSelect { .. } => "multi-select",
            QuestionKind::Dropdown { .. } => "dropdown",
            QuestionKind::FreeText { .. } => "free-text",
            QuestionKind::Date => "date",
        }
    }
}

pub fn normalize_text(text: &str) -> String {
    text.trim().to_lowercase()
}
