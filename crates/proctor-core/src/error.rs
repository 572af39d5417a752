//! Error types for the session engine and its collaborators.
//!
//! Defined in `proctor-core` so the service can classify storage and
//! attachment failures without string matching.

use thiserror::Error;

use crate::model::SessionId;

/// Errors surfaced by the session engine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The evaluation is unpublished or outside its availability window.
    #[error("evaluation '{evaluation_id}' is not available: {reason}")]
    NotAvailable {
        evaluation_id: String,
        reason: String,
    },

    /// Retakes are forbidden and the taker already submitted an attempt.
    #[error("taker '{taker_id}' already attempted evaluation '{evaluation_id}'")]
    AlreadyAttempted {
        evaluation_id: String,
        taker_id: String,
    },

    /// The session deadline (or idle timeout) has passed.
    #[error("session {0} has expired")]
    SessionExpired(SessionId),

    /// The session was already submitted with a different payload.
    #[error("session {0} was already submitted")]
    SessionAlreadySubmitted(SessionId),

    /// A manual grade outside `0..=max_points`.
    #[error("score {score} for question '{question_id}' is out of range 0..={max_points}")]
    ScoreOutOfRange {
        question_id: String,
        score: i64,
        max_points: u32,
    },

    /// Attachment storage could not confirm durability.
    #[error("attachment storage failure: {0}")]
    AttachmentStorageFailure(#[from] AttachmentError),

    #[error("session not found: {0}")]
    SessionNotFound(SessionId),

    #[error("evaluation not found: {0}")]
    EvaluationNotFound(String),

    #[error("question '{question_id}' is not part of evaluation '{evaluation_id}'")]
    UnknownQuestion {
        evaluation_id: String,
        question_id: String,
    },

    #[error("no result recorded for session {0}")]
    ResultNotFound(SessionId),

    /// Manual grades only apply to short-answer and essay questions.
    #[error("question '{0}' is graded automatically")]
    NotManuallyGradable(String),

    #[error("invalid evaluation: {0}")]
    InvalidEvaluation(#[from] EvaluationError),

    /// The evaluation catalogue failed to answer.
    #[error("catalogue error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl SessionError {
    /// Returns `true` for expected conditions that are shown to the taker
    /// as-is and must never be retried automatically.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            SessionError::NotAvailable { .. }
                | SessionError::AlreadyAttempted { .. }
                | SessionError::SessionExpired(_)
                | SessionError::SessionAlreadySubmitted(_)
        )
    }

    /// Returns `true` if the caller may safely retry the same request.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SessionError::Store(_) | SessionError::Catalog(_))
    }
}

/// Violations of the evaluation authoring invariants.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("passing score {passing} exceeds max score {max}")]
    PassingAboveMax { passing: u32, max: u32 },

    #[error("question points sum to {sum} but max score is {max}")]
    PointsMismatch { sum: u32, max: u32 },

    #[error("question '{0}' must be worth at least one point")]
    ZeroPoints(String),

    #[error("duplicate question id: {0}")]
    DuplicateQuestion(String),

    #[error("question '{0}' has no options")]
    NoOptions(String),

    #[error("question '{question_id}' marks option {index} correct but has {len} options")]
    CorrectOutOfRange {
        question_id: String,
        index: usize,
        len: usize,
    },

    #[error("availability window closes before it opens")]
    EmptyWindow,
}

/// Errors from session and draft storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("storage serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A stored record could not be interpreted.
    #[error("corrupt record {key}: {message}")]
    Corrupt { key: String, message: String },

    /// A conditional write kept losing to concurrent writers.
    #[error("record {key} is changing too quickly to update")]
    Contended { key: String },
}

/// Errors from the attachment storage collaborator.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("attachment not found: {0}")]
    Missing(String),

    #[error("attachment storage unavailable: {0}")]
    Unavailable(String),
}
