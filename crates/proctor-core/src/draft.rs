//! Draft answers saved while a session is in progress.
//!
//! Saves are upserts keyed by `(session, question)`. The store stamps every
//! write with a monotonically increasing revision in arrival order, so "last
//! write wins" is decided server-side and never by client timestamps.
//! Concurrent saves from several tabs of the same taker are therefore
//! resolved by arrival, which is the accepted behaviour.

use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StoreError;
use crate::model::{AnswerValue, QuestionId, SessionId};

/// The latest saved answer for one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftAnswer {
    pub question_id: QuestionId,
    pub answer: AnswerValue,
    pub saved_at: DateTime<Utc>,
    /// Arrival order assigned by the store.
    pub revision: u64,
}

/// Durable key-value store of in-progress answers.
#[async_trait]
pub trait DraftStore: Send + Sync {
    /// Upsert the answer for `(session_id, question_id)`.
    async fn save(
        &self,
        session_id: SessionId,
        question_id: &str,
        answer: AnswerValue,
        saved_at: DateTime<Utc>,
    ) -> Result<DraftAnswer, StoreError>;

    /// All current drafts of a session, keyed by question.
    async fn load(&self, session_id: SessionId)
        -> Result<BTreeMap<QuestionId, DraftAnswer>, StoreError>;

    /// Drop every draft of a session.
    async fn discard(&self, session_id: SessionId) -> Result<(), StoreError>;
}

/// Overlay explicit answers on saved drafts. Explicit answers always win.
pub fn merge_answers(
    drafts: BTreeMap<QuestionId, DraftAnswer>,
    explicit: BTreeMap<QuestionId, AnswerValue>,
) -> BTreeMap<QuestionId, AnswerValue> {
    let mut merged: BTreeMap<QuestionId, AnswerValue> = drafts
        .into_iter()
        .map(|(question_id, draft)| (question_id, draft.answer))
        .collect();
    merged.extend(explicit);
    merged
}

#[derive(Debug, Default)]
struct DraftState {
    next_revision: u64,
    sessions: HashMap<SessionId, BTreeMap<QuestionId, DraftAnswer>>,
}

/// Process-local draft store.
#[derive(Debug, Default)]
pub struct InMemoryDraftStore {
    state: Mutex<DraftState>,
}

impl InMemoryDraftStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DraftStore for InMemoryDraftStore {
    async fn save(
        &self,
        session_id: SessionId,
        question_id: &str,
        answer: AnswerValue,
        saved_at: DateTime<Utc>,
    ) -> Result<DraftAnswer, StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.next_revision += 1;
        let draft = DraftAnswer {
            question_id: question_id.to_string(),
            answer,
            saved_at,
            revision: state.next_revision,
        };
        state
            .sessions
            .entry(session_id)
            .or_default()
            .insert(question_id.to_string(), draft.clone());
        Ok(draft)
    }

    async fn load(
        &self,
        session_id: SessionId,
    ) -> Result<BTreeMap<QuestionId, DraftAnswer>, StoreError> {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        Ok(state.sessions.get(&session_id).cloned().unwrap_or_default())
    }

    async fn discard(&self, session_id: SessionId) -> Result<(), StoreError> {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        state.sessions.remove(&session_id);
        Ok(())
    }
}
