//! Core data model types for proctor.
//!
//! Evaluations and questions are authored elsewhere and handed to the
//! engine through an [`EvaluationCatalog`](crate::traits::EvaluationCatalog).
//! Answers and attachment references are what takers send back.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EvaluationError;

/// Identifier of a session (one attempt by one taker).
pub type SessionId = Uuid;

/// Identifier of a question within an evaluation.
pub type QuestionId = String;

/// An authored quiz, exam, assignment, or project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Unique identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub kind: EvaluationKind,
    /// Questions in presentation order.
    pub questions: Vec<Question>,
    /// Ceiling of the aggregate score. Must equal the sum of question points.
    pub max_score: u32,
    /// Points required to pass.
    pub passing_score: u32,
    /// Time limit in minutes; `None` means untimed.
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub retake_policy: RetakePolicy,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub window: AvailabilityWindow,
}

impl Evaluation {
    /// Look up a question by id.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// The time limit as a duration, if the evaluation is timed.
    pub fn time_limit(&self) -> Option<chrono::Duration> {
        self.time_limit_minutes
            .map(|m| chrono::Duration::minutes(i64::from(m)))
    }

    /// Sum of per-question points.
    pub fn total_points(&self) -> u32 {
        self.questions.iter().map(|q| q.points).sum()
    }

    /// Enforce the authoring invariants.
    ///
    /// Per-question points are authoritative: they must sum to `max_score`.
    pub fn check(&self) -> Result<(), EvaluationError> {
        if self.passing_score > self.max_score {
            return Err(EvaluationError::PassingAboveMax {
                passing: self.passing_score,
                max: self.max_score,
            });
        }

        let mut seen = HashSet::new();
        for question in &self.questions {
            if !seen.insert(question.id.as_str()) {
                return Err(EvaluationError::DuplicateQuestion(question.id.clone()));
            }
            if question.points == 0 {
                return Err(EvaluationError::ZeroPoints(question.id.clone()));
            }
            if let QuestionKind::MultipleChoice { options, correct } = &question.kind {
                if options.is_empty() {
                    return Err(EvaluationError::NoOptions(question.id.clone()));
                }
                if *correct >= options.len() {
                    return Err(EvaluationError::CorrectOutOfRange {
                        question_id: question.id.clone(),
                        index: *correct,
                        len: options.len(),
                    });
                }
            }
        }

        let sum = self.total_points();
        if sum != self.max_score {
            return Err(EvaluationError::PointsMismatch {
                sum,
                max: self.max_score,
            });
        }

        if let (Some(opens), Some(closes)) = (self.window.opens_at, self.window.closes_at) {
            if closes <= opens {
                return Err(EvaluationError::EmptyWindow);
            }
        }

        Ok(())
    }
}

/// A single question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub prompt: String,
    pub kind: QuestionKind,
    /// Points awarded for a fully correct answer (at least 1).
    pub points: u32,
}

impl Question {
    /// Interpret a raw string as an answer to this question.
    ///
    /// Objective questions always take a selection, so option text is
    /// matched verbatim. Other questions take a file reference for a
    /// `file:` prefix and free text otherwise.
    pub fn answer_from_raw(&self, raw: &str) -> AnswerValue {
        if self.kind.is_objective() {
            return AnswerValue::Selected(raw.to_string());
        }
        match raw.strip_prefix("file:") {
            Some(reference) => AnswerValue::File(AttachmentRef::new(reference)),
            None => AnswerValue::Text(raw.to_string()),
        }
    }
}

/// Question type together with its answer key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Ordered options; `correct` indexes the right one.
    MultipleChoice { options: Vec<String>, correct: usize },
    TrueFalse { correct: bool },
    /// Reviewed manually; `reference` is a model answer for the reviewer.
    ShortAnswer {
        #[serde(default)]
        reference: Option<String>,
    },
    Essay,
}

impl QuestionKind {
    /// Whether answers can be graded without a human reviewer.
    pub fn is_objective(&self) -> bool {
        matches!(
            self,
            QuestionKind::MultipleChoice { .. } | QuestionKind::TrueFalse { .. }
        )
    }

    /// The correct answer as text, for objective kinds.
    pub fn correct_value(&self) -> Option<String> {
        match self {
            QuestionKind::MultipleChoice { options, correct } => options.get(*correct).cloned(),
            QuestionKind::TrueFalse { correct } => Some(correct.to_string()),
            QuestionKind::ShortAnswer { .. } | QuestionKind::Essay => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            QuestionKind::MultipleChoice { .. } => "multiple-choice",
            QuestionKind::TrueFalse { .. } => "true-false",
            QuestionKind::ShortAnswer { .. } => "short-answer",
            QuestionKind::Essay => "essay",
        }
    }
}

/// Evaluation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationKind {
    Quiz,
    Exam,
    Assignment,
    Project,
}

impl fmt::Display for EvaluationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvaluationKind::Quiz => write!(f, "quiz"),
            EvaluationKind::Exam => write!(f, "exam"),
            EvaluationKind::Assignment => write!(f, "assignment"),
            EvaluationKind::Project => write!(f, "project"),
        }
    }
}

impl FromStr for EvaluationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quiz" => Ok(EvaluationKind::Quiz),
            "exam" => Ok(EvaluationKind::Exam),
            "assignment" => Ok(EvaluationKind::Assignment),
            "project" => Ok(EvaluationKind::Project),
            other => Err(format!("unknown evaluation kind: {other}")),
        }
    }
}

/// Whether a taker may start another attempt after submitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetakePolicy {
    #[default]
    Allowed,
    Forbidden,
}

impl FromStr for RetakePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "allowed" | "allow" => Ok(RetakePolicy::Allowed),
            "forbidden" | "forbid" => Ok(RetakePolicy::Forbidden),
            other => Err(format!("unknown retake policy: {other}")),
        }
    }
}

/// Half-open `[opens_at, closes_at)` window; open ends are unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityWindow {
    #[serde(default)]
    pub opens_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub closes_at: Option<DateTime<Utc>>,
}

impl AvailabilityWindow {
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        self.opens_at.map_or(true, |opens| now >= opens)
            && self.closes_at.map_or(true, |closes| now < closes)
    }
}

/// Opaque reference to a stored attachment.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttachmentRef(pub String);

impl AttachmentRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AttachmentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A taker's answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// A chosen option (multiple-choice or true/false).
    Selected(String),
    /// Free text.
    Text(String),
    /// A file uploaded to attachment storage.
    File(AttachmentRef),
}

impl AnswerValue {
    /// Textual content, if any.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Selected(s) | AnswerValue::Text(s) => Some(s),
            AnswerValue::File(_) => None,
        }
    }

    pub fn attachment(&self) -> Option<&AttachmentRef> {
        match self {
            AnswerValue::File(r) => Some(r),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerValue::Selected(s) | AnswerValue::Text(s) => f.write_str(s),
            AnswerValue::File(r) => write!(f, "file:{r}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn mc(id: &str, points: u32) -> Question {
        Question {
            id: id.into(),
            prompt: format!("Question {id}"),
            kind: QuestionKind::MultipleChoice {
                options: vec!["A".into(), "B".into(), "C".into()],
                correct: 1,
            },
            points,
        }
    }

    fn evaluation(questions: Vec<Question>, max_score: u32, passing_score: u32) -> Evaluation {
        Evaluation {
            id: "eval-1".into(),
            title: "Eval".into(),
            description: String::new(),
            kind: EvaluationKind::Quiz,
            questions,
            max_score,
            passing_score,
            time_limit_minutes: Some(10),
            retake_policy: RetakePolicy::Allowed,
            published: true,
            window: AvailabilityWindow::default(),
        }
    }

    #[test]
    fn check_accepts_consistent_points() {
        let eval = evaluation(vec![mc("q1", 2), mc("q2", 3)], 5, 3);
        assert!(eval.check().is_ok());
        assert_eq!(eval.total_points(), 5);
        assert_eq!(eval.time_limit(), Some(chrono::Duration::minutes(10)));
    }

    #[test]
    fn check_rejects_points_mismatch() {
        let eval = evaluation(vec![mc("q1", 2), mc("q2", 3)], 6, 3);
        assert_eq!(
            eval.check(),
            Err(EvaluationError::PointsMismatch { sum: 5, max: 6 })
        );
    }

    #[test]
    fn check_rejects_passing_above_max() {
        let eval = evaluation(vec![mc("q1", 2)], 2, 3);
        assert!(matches!(
            eval.check(),
            Err(EvaluationError::PassingAboveMax { .. })
        ));
    }

    #[test]
    fn check_rejects_duplicates_and_bad_keys() {
        let eval = evaluation(vec![mc("q1", 1), mc("q1", 1)], 2, 1);
        assert_eq!(
            eval.check(),
            Err(EvaluationError::DuplicateQuestion("q1".into()))
        );

        let mut bad = mc("q1", 1);
        bad.kind = QuestionKind::MultipleChoice {
            options: vec!["A".into()],
            correct: 3,
        };
        let eval = evaluation(vec![bad], 1, 1);
        assert!(matches!(
            eval.check(),
            Err(EvaluationError::CorrectOutOfRange { index: 3, .. })
        ));

        let eval = evaluation(vec![mc("q1", 0)], 0, 0);
        assert_eq!(eval.check(), Err(EvaluationError::ZeroPoints("q1".into())));
    }

    #[test]
    fn window_is_half_open() {
        let opens = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let closes = Utc.with_ymd_and_hms(2025, 1, 1, 17, 0, 0).unwrap();
        let window = AvailabilityWindow {
            opens_at: Some(opens),
            closes_at: Some(closes),
        };
        assert!(!window.contains(opens - chrono::Duration::seconds(1)));
        assert!(window.contains(opens));
        assert!(!window.contains(closes));
        assert!(AvailabilityWindow::default().contains(closes));
    }

    #[test]
    fn answer_from_raw_follows_question_kind() {
        let q = mc("q1", 1);
        assert_eq!(q.answer_from_raw("B"), AnswerValue::Selected("B".into()));
        assert_eq!(
            q.answer_from_raw("file:abc"),
            AnswerValue::Selected("file:abc".into())
        );

        let essay = Question {
            id: "e".into(),
            prompt: "Discuss".into(),
            kind: QuestionKind::Essay,
            points: 5,
        };
        assert_eq!(
            essay.answer_from_raw("long text"),
            AnswerValue::Text("long text".into())
        );
        assert_eq!(
            essay.answer_from_raw("file:abc"),
            AnswerValue::File(AttachmentRef::new("abc"))
        );
    }

    #[test]
    fn option_text_with_file_prefix_grades_correct() {
        let q = Question {
            id: "q1".into(),
            prompt: "Which URI scheme reads local files?".into(),
            kind: QuestionKind::MultipleChoice {
                options: vec!["http:".into(), "file:".into()],
                correct: 1,
            },
            points: 1,
        };
        let answer = q.answer_from_raw("file:");
        assert_eq!(answer.as_text(), q.kind.correct_value().as_deref());
    }

    #[test]
    fn kind_display_and_parse() {
        assert_eq!(EvaluationKind::Exam.to_string(), "exam");
        assert_eq!("Quiz".parse::<EvaluationKind>().unwrap(), EvaluationKind::Quiz);
        assert!("survey".parse::<EvaluationKind>().is_err());
        assert_eq!(
            "forbid".parse::<RetakePolicy>().unwrap(),
            RetakePolicy::Forbidden
        );
    }

    #[test]
    fn answer_value_serde_shape() {
        let json = serde_json::to_string(&AnswerValue::Selected("B".into())).unwrap();
        assert_eq!(json, r#"{"type":"selected","value":"B"}"#);
        let file: AnswerValue =
            serde_json::from_str(r#"{"type":"file","value":"uploads/x.pdf"}"#).unwrap();
        assert_eq!(file.attachment().unwrap().as_str(), "uploads/x.pdf");
    }
}
