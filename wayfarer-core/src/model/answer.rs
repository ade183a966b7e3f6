use serde::{Deserialize, Serialize};

use crate::{MemberId, QuestionId};

/// The value of an answer, shaped by the kind of question it answers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "kebab-case")]
pub enum AnswerValue {
    Scalar(String),
    MultiSelect(Vec<String>),
    Range { min: Option<f64>, max: Option<f64> },
}

/// A member's answer to a question
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    /// Records fetched from storage may lack an owner, in which case they count as unset.
    pub member_id: Option<MemberId>,
    pub value: AnswerValue,
}

impl AnswerValue {
    /// Returns true if the value carries nothing a member entered.
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Scalar(s) => s.trim().is_empty(),
            AnswerValue::MultiSelect(options) => options.is_empty(),
            AnswerValue::Range { min, max } => min.is_none() && max.is_none(),
        }
    }

    /// The options a member picked. A scalar counts as a single pick, so only ask
    /// this of answers to questions that offer options.
    pub fn selections(&self) -> &[String] {
        match self {
            AnswerValue::MultiSelect(options) => options,
            AnswerValue::Scalar(value) if !value.trim().is_empty() => std::slice::from_ref(value),
            _ => &[],
        }
    }
}

impl Answer {
    pub fn new(question_id: QuestionId, member_id: MemberId, value: AnswerValue) -> Self {
        Self {
            question_id,
            member_id: Some(member_id),
            value,
        }
    }

    /// Returns true if the answer belongs to the given member.
    pub fn is_owned_by(&self, member_id: MemberId) -> bool {
        self.member_id == Some(member_id)
    }
}

#[cfg(test)]
mod test {
    use super::AnswerValue;

    #[test]
    fn emptiness() {
        assert!(AnswerValue::Scalar("  ".to_string()).is_empty());
        assert!(AnswerValue::MultiSelect(vec![]).is_empty());
        assert!(AnswerValue::Range {
            min: None,
            max: None
        }
        .is_empty());

        assert!(!AnswerValue::Range {
            min: Some(100.),
            max: None
        }
        .is_empty());
        assert!(!AnswerValue::Scalar("Hotel".to_string()).is_empty());
    }

    #[test]
    fn scalars_are_single_selections() {
        let picked = AnswerValue::Scalar("Hotel".to_string());
        let multi = AnswerValue::MultiSelect(vec!["Pool".to_string(), "Gym".to_string()]);

        assert_eq!(picked.selections(), ["Hotel".to_string()]);
        assert_eq!(multi.selections().len(), 2);
        assert!(AnswerValue::Scalar(" ".to_string()).selections().is_empty());
        assert!(AnswerValue::Range {
            min: Some(1.),
            max: None
        }
        .selections()
        .is_empty());
    }

    #[test]
    fn serializes_with_explicit_tag() {
        let value = AnswerValue::Range {
            min: Some(100.),
            max: None,
        };
        let json = serde_json::to_value(&value).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "type": "range", "value": { "min": 100.0, "max": null } })
        );
    }
}
