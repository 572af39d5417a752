//! Session, submission, and result storage.
//!
//! Every conditional write is checked against the stored status and the
//! stored `revision`, and bumps that revision when it lands. Backends must
//! make the check and the write atomic across every writer of the same
//! records, including other processes. That is what guarantees a single
//! SUBMITTED transition when submits race, and lets a submit detect draft
//! saves that landed after it read the drafts.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::grading::GradeResult;
use crate::model::SessionId;
use crate::session::{Session, SessionStatus, Submission};

/// Result of an attempted submission commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// The stored session changed since it was read; carries its current
    /// status. `Conflict(Active)` means it is worth re-reading and retrying.
    Conflict(SessionStatus),
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Insert `session` unless the same (evaluation, taker) pair already has
    /// an ACTIVE session, which is returned instead.
    async fn insert_unless_active(&self, session: Session) -> Result<Option<Session>, StoreError>;

    async fn get(&self, id: SessionId) -> Result<Option<Session>, StoreError>;

    /// Every session of a taker for an evaluation, oldest first.
    async fn attempts(&self, evaluation_id: &str, taker_id: &str)
        -> Result<Vec<Session>, StoreError>;

    /// Replace the stored session only if its status still equals
    /// `expected` and its revision still equals `session.revision`. The
    /// stored copy gets the next revision. Returns whether the swap happened.
    async fn compare_and_swap(
        &self,
        expected: SessionStatus,
        session: &Session,
    ) -> Result<bool, StoreError>;

    /// Atomically flip an ACTIVE session to `session` (SUBMITTED) and store
    /// its submission and result, provided the stored revision still equals
    /// `session.revision`. Nothing is written on conflict.
    async fn commit_submission(
        &self,
        session: &Session,
        submission: &Submission,
        result: &GradeResult,
    ) -> Result<CommitOutcome, StoreError>;

    async fn submission(&self, id: SessionId) -> Result<Option<Submission>, StoreError>;

    async fn result(&self, id: SessionId) -> Result<Option<GradeResult>, StoreError>;

    /// Replace a committed result if its stored revision still equals
    /// `result.revision` (manual grading). Returns whether it was replaced.
    async fn replace_result(&self, result: &GradeResult) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    sessions: HashMap<SessionId, Session>,
    submissions: HashMap<SessionId, Submission>,
    results: HashMap<SessionId, GradeResult>,
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    state: Mutex<MemoryState>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn insert_unless_active(&self, session: Session) -> Result<Option<Session>, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(active) = state.sessions.values().find(|s| {
            s.status == SessionStatus::Active
                && s.evaluation_id == session.evaluation_id
                && s.taker_id == session.taker_id
        }) {
            return Ok(Some(active.clone()));
        }
        state.sessions.insert(session.id, session);
        Ok(None)
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.sessions.get(&id).cloned())
    }

    async fn attempts(
        &self,
        evaluation_id: &str,
        taker_id: &str,
    ) -> Result<Vec<Session>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let mut sessions: Vec<Session> = state
            .sessions
            .values()
            .filter(|s| s.evaluation_id == evaluation_id && s.taker_id == taker_id)
            .cloned()
            .collect();
        sessions.sort_by_key(|s| (s.started_at, s.attempt));
        Ok(sessions)
    }

    async fn compare_and_swap(
        &self,
        expected: SessionStatus,
        session: &Session,
    ) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.sessions.get_mut(&session.id) {
            Some(stored) if stored.status == expected && stored.revision == session.revision => {
                *stored = next_revision(session);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn commit_submission(
        &self,
        session: &Session,
        submission: &Submission,
        result: &GradeResult,
    ) -> Result<CommitOutcome, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.sessions.get_mut(&session.id) {
            Some(stored)
                if stored.status == SessionStatus::Active && stored.revision == session.revision =>
            {
                *stored = next_revision(session);
            }
            Some(stored) => return Ok(CommitOutcome::Conflict(stored.status)),
            None => {
                return Err(StoreError::Corrupt {
                    key: session.id.to_string(),
                    message: "session vanished before commit".into(),
                })
            }
        }
        state.submissions.insert(session.id, submission.clone());
        state.results.insert(session.id, result.clone());
        Ok(CommitOutcome::Committed)
    }

    async fn submission(&self, id: SessionId) -> Result<Option<Submission>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.submissions.get(&id).cloned())
    }

    async fn result(&self, id: SessionId) -> Result<Option<GradeResult>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.results.get(&id).cloned())
    }

    async fn replace_result(&self, result: &GradeResult) -> Result<bool, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        match state.results.get_mut(&result.session_id) {
            Some(stored) if stored.revision == result.revision => {
                *stored = GradeResult {
                    revision: result.revision + 1,
                    ..result.clone()
                };
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

/// The copy a conditional write stores.
pub fn next_revision(session: &Session) -> Session {
    Session {
        revision: session.revision + 1,
        ..session.clone()
    }
}
