//! Grading engine.
//!
//! [`grade_objective`] is a pure function of the evaluation answer key and
//! the submission: the same inputs always yield an identical
//! [`GradeResult`]. Short-answer and essay questions start out pending and
//! are closed by [`record_manual_grade`].

use serde::{Deserialize, Serialize};

use crate::error::SessionError;
use crate::model::{AnswerValue, Evaluation, QuestionId, QuestionKind, SessionId};
use crate::session::Submission;

/// Outcome of a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Correct,
    Incorrect,
    /// Awaiting a human reviewer; no score yet.
    Pending,
    /// Scored by a human reviewer.
    Reviewed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResult {
    pub question_id: QuestionId,
    /// Question type label, e.g. "essay".
    pub kind: String,
    pub max_points: u32,
    /// `None` while pending.
    pub awarded: Option<u32>,
    pub verdict: Verdict,
    #[serde(default)]
    pub feedback: Option<String>,
}

/// Graded outcome of a submission.
///
/// Aggregates cover only graded questions. While any question is pending
/// the result is `provisional` and `passed` is a lower bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeResult {
    /// Results are identified by the session they grade.
    pub session_id: SessionId,
    pub evaluation_id: String,
    pub taker_id: String,
    pub questions: Vec<QuestionResult>,
    pub score: u32,
    pub max_score: u32,
    pub percentage: f64,
    pub passing_score: u32,
    pub passed: bool,
    pub provisional: bool,
    /// Bumped by the store on every write of the result.
    #[serde(default)]
    pub revision: u64,
}

impl GradeResult {
    pub fn question(&self, id: &str) -> Option<&QuestionResult> {
        self.questions.iter().find(|q| q.question_id == id)
    }

    /// Ids of questions still awaiting manual review.
    pub fn pending_questions(&self) -> Vec<&str> {
        self.questions
            .iter()
            .filter(|q| q.verdict == Verdict::Pending)
            .map(|q| q.question_id.as_str())
            .collect()
    }

    /// Recompute the aggregate from the per-question results.
    fn recompute(&mut self) {
        let (score, max_score) = self
            .questions
            .iter()
            .filter_map(|q| q.awarded.map(|awarded| (awarded, q.max_points)))
            .fold((0u32, 0u32), |(s, m), (awarded, max)| (s + awarded, m + max));

        self.score = score;
        self.max_score = max_score;
        self.percentage = percentage(score, max_score);
        self.passed = score >= self.passing_score;
        self.provisional = self.questions.iter().any(|q| q.awarded.is_none());
    }
}

/// Percentage in `[0, 100]`; zero when nothing is graded yet.
fn percentage(score: u32, max_score: u32) -> f64 {
    if max_score == 0 {
        return 0.0;
    }
    f64::from(score) * 100.0 / f64::from(max_score)
}

/// Case-fold and collapse whitespace so "  True " matches "true".
pub fn normalize(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn grade_question(
    kind: &QuestionKind,
    points: u32,
    answer: Option<&AnswerValue>,
) -> (Option<u32>, Verdict) {
    let Some(expected) = kind.correct_value() else {
        return (None, Verdict::Pending);
    };

    let matches = answer
        .and_then(AnswerValue::as_text)
        .is_some_and(|given| normalize(given) == normalize(&expected));

    if matches {
        (Some(points), Verdict::Correct)
    } else {
        (Some(0), Verdict::Incorrect)
    }
}

/// Grade every auto-gradable question; leave the rest pending.
///
/// Full points on an exact (normalized) match, zero otherwise. No partial
/// credit for objective questions.
pub fn grade_objective(evaluation: &Evaluation, submission: &Submission) -> GradeResult {
    let questions = evaluation
        .questions
        .iter()
        .map(|question| {
            let answer = submission.answers.get(&question.id);
            let (awarded, verdict) = grade_question(&question.kind, question.points, answer);
            QuestionResult {
                question_id: question.id.clone(),
                kind: question.kind.label().to_string(),
                max_points: question.points,
                awarded,
                verdict,
                feedback: None,
            }
        })
        .collect();

    let mut result = GradeResult {
        session_id: submission.session_id,
        evaluation_id: evaluation.id.clone(),
        taker_id: submission.taker_id.clone(),
        questions,
        score: 0,
        max_score: 0,
        percentage: 0.0,
        passing_score: evaluation.passing_score,
        passed: false,
        provisional: false,
        revision: 0,
    };
    result.recompute();
    result
}

/// Record a reviewer's score for a short-answer or essay question.
///
/// Re-recording overwrites the previous manual grade. Once every question
/// has a score the result stops being provisional.
pub fn record_manual_grade(
    result: &mut GradeResult,
    question_id: &str,
    score: i64,
    feedback: Option<String>,
) -> Result<(), SessionError> {
    let session_id = result.session_id;
    let evaluation_id = result.evaluation_id.clone();
    let question = result
        .questions
        .iter_mut()
        .find(|q| q.question_id == question_id)
        .ok_or_else(|| SessionError::UnknownQuestion {
            evaluation_id,
            question_id: question_id.to_string(),
        })?;

    if matches!(question.verdict, Verdict::Correct | Verdict::Incorrect) {
        return Err(SessionError::NotManuallyGradable(question_id.to_string()));
    }

    let awarded = u32::try_from(score)
        .ok()
        .filter(|s| *s <= question.max_points)
        .ok_or_else(|| SessionError::ScoreOutOfRange {
            question_id: question_id.to_string(),
            score,
            max_points: question.max_points,
        })?;

    question.awarded = Some(awarded);
    question.verdict = Verdict::Reviewed;
    question.feedback = feedback;
    result.recompute();

    tracing::info!(
        session = %session_id,
        question = question_id,
        awarded,
        provisional = result.provisional,
        "manual grade recorded"
    );
    Ok(())
}
