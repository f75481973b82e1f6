//! Survey stage configuration — questions, answers, correctness checks.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{BaseStageConfig, RevealAudience};
use crate::types::generate_id;

/// A selectable option for a multiple choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleChoiceItem {
    pub id: String,
    /// Image reference, or empty if none.
    #[serde(default)]
    pub image_id: String,
    pub text: String,
}

impl MultipleChoiceItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: generate_id(),
            image_id: String::new(),
            text: text.into(),
        }
    }
}

/// A survey question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SurveyQuestion {
    Text {
        id: String,
        question_title: String,
    },
    Check {
        id: String,
        question_title: String,
    },
    #[serde(rename = "mc")]
    MultipleChoice {
        id: String,
        question_title: String,
        options: Vec<MultipleChoiceItem>,
        /// Id of the correct option, or None if there is no right answer.
        correct_answer_id: Option<String>,
    },
    Scale {
        id: String,
        question_title: String,
        lower_value: u32,
        lower_text: String,
        upper_value: u32,
        upper_text: String,
    },
}

impl SurveyQuestion {
    pub fn text(title: impl Into<String>) -> Self {
        SurveyQuestion::Text {
            id: generate_id(),
            question_title: title.into(),
        }
    }

    pub fn check(title: impl Into<String>) -> Self {
        SurveyQuestion::Check {
            id: generate_id(),
            question_title: title.into(),
        }
    }

    pub fn multiple_choice(
        title: impl Into<String>,
        options: Vec<MultipleChoiceItem>,
        correct_answer_id: Option<String>,
    ) -> Self {
        SurveyQuestion::MultipleChoice {
            id: generate_id(),
            question_title: title.into(),
            options,
            correct_answer_id,
        }
    }

    /// 1..=upper scale by default, e.g. "on a scale of 1 to 7".
    pub fn scale(
        title: impl Into<String>,
        lower_text: impl Into<String>,
        upper_text: impl Into<String>,
        upper_value: u32,
    ) -> Self {
        SurveyQuestion::Scale {
            id: generate_id(),
            question_title: title.into(),
            lower_value: 1,
            lower_text: lower_text.into(),
            upper_value,
            upper_text: upper_text.into(),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            SurveyQuestion::Text { id, .. }
            | SurveyQuestion::Check { id, .. }
            | SurveyQuestion::MultipleChoice { id, .. }
            | SurveyQuestion::Scale { id, .. } => id,
        }
    }
}

/// A participant's answer to one survey question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum SurveyAnswer {
    Text { id: String, answer: String },
    Check { id: String, is_checked: bool },
    #[serde(rename = "mc")]
    MultipleChoice { id: String, choice_id: String },
    Scale { id: String, value: u32 },
}

impl SurveyAnswer {
    pub fn question_id(&self) -> &str {
        match self {
            SurveyAnswer::Text { id, .. }
            | SurveyAnswer::Check { id, .. }
            | SurveyAnswer::MultipleChoice { id, .. }
            | SurveyAnswer::Scale { id, .. } => id,
        }
    }
}

/// Survey stage: an ordered list of questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyStageConfig {
    #[serde(flatten)]
    pub base: BaseStageConfig,
    pub questions: Vec<SurveyQuestion>,
    pub reveal_audience: RevealAudience,
    /// Only reveal questions with a correct answer.
    #[serde(default)]
    pub reveal_scorable_only: bool,
}

impl SurveyStageConfig {
    pub fn new(name: impl Into<String>, questions: Vec<SurveyQuestion>) -> Self {
        Self {
            base: BaseStageConfig::new(name),
            questions,
            reveal_audience: RevealAudience::CurrentParticipant,
            reveal_scorable_only: false,
        }
    }
}

/// Map of question id to a participant's answer.
pub type SurveyAnswerMap = HashMap<String, SurveyAnswer>;

/// Whether a multiple choice answer matches the question's correct option.
/// Questions without a correct option (or non-MC questions) never score.
pub fn is_correct_answer(question: &SurveyQuestion, answer: &SurveyAnswer) -> bool {
    match (question, answer) {
        (
            SurveyQuestion::MultipleChoice {
                correct_answer_id: Some(correct),
                ..
            },
            SurveyAnswer::MultipleChoice { choice_id, .. },
        ) => correct == choice_id,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_survey_stage_builder() {
        let stage = SurveyStageConfig::new(
            "Intake survey",
            vec![
                SurveyQuestion::text("How was your day?"),
                SurveyQuestion::scale("How confident are you?", "Not at all", "Very", 7),
            ],
        );
        assert_eq!(stage.questions.len(), 2);
        assert_eq!(stage.reveal_audience, RevealAudience::CurrentParticipant);
    }

    #[test]
    fn test_scale_defaults() {
        let question = SurveyQuestion::scale("Confidence?", "Low", "High", 7);
        match question {
            SurveyQuestion::Scale {
                lower_value,
                upper_value,
                ..
            } => {
                assert_eq!(lower_value, 1);
                assert_eq!(upper_value, 7);
            }
            _ => panic!("expected scale question"),
        }
    }

    #[test]
    fn test_correct_answer_check() {
        let options = vec![
            MultipleChoiceItem::new("compass"),
            MultipleChoiceItem::new("mirror"),
        ];
        let correct_id = options[1].id.clone();
        let question =
            SurveyQuestion::multiple_choice("Best signaling tool?", options, Some(correct_id.clone()));

        let right = SurveyAnswer::MultipleChoice {
            id: question.id().to_string(),
            choice_id: correct_id,
        };
        let wrong = SurveyAnswer::MultipleChoice {
            id: question.id().to_string(),
            choice_id: "other".into(),
        };

        assert!(is_correct_answer(&question, &right));
        assert!(!is_correct_answer(&question, &wrong));
    }

    #[test]
    fn test_unscorable_questions_never_score() {
        let question = SurveyQuestion::text("Thoughts?");
        let answer = SurveyAnswer::Text {
            id: question.id().to_string(),
            answer: "none".into(),
        };
        assert!(!is_correct_answer(&question, &answer));
    }

    #[test]
    fn test_mc_serialization_uses_short_kind() {
        let question = SurveyQuestion::multiple_choice("Pick one", vec![], None);
        let value = serde_json::to_value(&question).unwrap();
        assert_eq!(value["kind"], "mc");
    }
}
