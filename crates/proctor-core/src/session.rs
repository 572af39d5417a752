//! Session lifecycle: start, lazy expiry, activity, drafts, submission.
//!
//! The [`SessionManager`] is the only component that changes a session's
//! status. Expiry is never scheduled; every operation re-checks the stored
//! start instant against the time limit (and the optional idle timeout)
//! before doing anything else, so the engine stays correct across restarts.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::{self, Clock, TimeRemaining};
use crate::draft::{merge_answers, DraftAnswer, DraftStore};
use crate::error::{SessionError, StoreError};
use crate::grading::{self, GradeResult};
use crate::model::{AnswerValue, AttachmentRef, Evaluation, QuestionId, RetakePolicy, SessionId};
use crate::store::{next_revision, CommitOutcome, SessionStore};

/// Namespace for submission fingerprints.
const FINGERPRINT_NAMESPACE: Uuid = Uuid::from_u128(0x6f1c_25d4_8a0e_4b7d_9c3e_51a2_f0d8_7b64);

/// Submit attempts before giving up on a session that keeps changing.
const MAX_SUBMIT_ATTEMPTS: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionStatus {
    Active,
    Expired,
    Submitted,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionStatus::Active => write!(f, "ACTIVE"),
            SessionStatus::Expired => write!(f, "EXPIRED"),
            SessionStatus::Submitted => write!(f, "SUBMITTED"),
        }
    }
}

/// One taker's attempt at an evaluation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub evaluation_id: String,
    pub taker_id: String,
    /// 1-based attempt number for this (evaluation, taker) pair.
    pub attempt: u32,
    pub status: SessionStatus,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
    /// Time limit copied from the evaluation when the session started.
    #[serde(default)]
    pub time_limit_minutes: Option<u32>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expired_at: Option<DateTime<Utc>>,
    /// Bumped by the store on every conditional write.
    #[serde(default)]
    pub revision: u64,
}

impl Session {
    pub fn time_limit(&self) -> Option<chrono::Duration> {
        self.time_limit_minutes
            .map(|m| chrono::Duration::minutes(i64::from(m)))
    }

    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        clock::deadline(self.started_at, self.time_limit())
    }
}

/// Immutable snapshot of the answers at submit time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Submission {
    pub session_id: SessionId,
    pub evaluation_id: String,
    pub taker_id: String,
    /// Drafts merged with the explicit answers of the submit call.
    pub answers: BTreeMap<QuestionId, AnswerValue>,
    /// Sorted, de-duplicated attachment references.
    pub attachments: Vec<AttachmentRef>,
    pub submitted_at: DateTime<Utc>,
    /// Identifies the submit payload so retries can be told from resubmits.
    pub fingerprint: Uuid,
}

/// Read view returned by `get_status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusView {
    pub session_id: SessionId,
    pub status: SessionStatus,
    pub time_remaining: TimeRemaining,
    pub deadline: Option<DateTime<Utc>>,
    pub started_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

/// Outcome of `start`. Re-entering an active attempt is not an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Started {
    New(Session),
    AlreadyActive(Session),
}

impl Started {
    pub fn session(&self) -> &Session {
        match self {
            Started::New(s) | Started::AlreadyActive(s) => s,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            Started::New(s) | Started::AlreadyActive(s) => s,
        }
    }

    pub fn is_resumed(&self) -> bool {
        matches!(self, Started::AlreadyActive(_))
    }
}

/// What a successful submit hands back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmitReceipt {
    pub submission: Submission,
    pub result: GradeResult,
    /// `true` when an identical earlier submit was replayed.
    pub replayed: bool,
}

/// Session policy knobs.
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    /// Expire sessions idle for longer than this many minutes.
    pub idle_timeout_minutes: Option<u32>,
}

impl SessionConfig {
    fn idle_timeout(&self) -> Option<chrono::Duration> {
        self.idle_timeout_minutes
            .map(|m| chrono::Duration::minutes(i64::from(m)))
    }
}

/// Fingerprint of a submit payload: a UUIDv5 of its canonical JSON.
pub fn fingerprint(
    answers: &BTreeMap<QuestionId, AnswerValue>,
    attachments: &[AttachmentRef],
) -> Result<Uuid, StoreError> {
    let mut sorted = attachments.to_vec();
    sorted.sort();
    sorted.dedup();
    let canonical = serde_json::to_vec(&(answers, &sorted))?;
    Ok(Uuid::new_v5(&FINGERPRINT_NAMESPACE, &canonical))
}

/// Owns the lifecycle of evaluation attempts.
pub struct SessionManager {
    sessions: Arc<dyn SessionStore>,
    drafts: Arc<dyn DraftStore>,
    clock: Arc<dyn Clock>,
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        drafts: Arc<dyn DraftStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        Self {
            sessions,
            drafts,
            clock,
            config,
        }
    }

    /// Load a session with lazy expiry applied.
    pub async fn session(&self, id: SessionId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .get(id)
            .await?
            .ok_or(SessionError::SessionNotFound(id))?;
        self.refresh(session).await
    }

    /// Load a session and require it to still be accepting answers.
    pub async fn ensure_active(&self, id: SessionId) -> Result<Session, SessionError> {
        require_active(self.session(id).await?)
    }

    fn has_lapsed(&self, session: &Session, now: DateTime<Utc>) -> bool {
        if clock::is_past_deadline(session.started_at, session.time_limit(), now) {
            return true;
        }
        self.config
            .idle_timeout()
            .is_some_and(|idle| now >= session.last_activity_at + idle)
    }

    /// Move a lapsed ACTIVE session to EXPIRED.
    async fn refresh(&self, session: Session) -> Result<Session, SessionError> {
        if session.status != SessionStatus::Active {
            return Ok(session);
        }
        let now = self.clock.now();
        if !self.has_lapsed(&session, now) {
            return Ok(session);
        }

        let mut expired = session.clone();
        expired.status = SessionStatus::Expired;
        expired.expired_at = Some(now);

        if self
            .sessions
            .compare_and_swap(SessionStatus::Active, &expired)
            .await?
        {
            tracing::info!(
                session = %expired.id,
                evaluation = %expired.evaluation_id,
                "session expired"
            );
            return Ok(next_revision(&expired));
        }

        // Someone else moved it first; report what they stored.
        self.sessions
            .get(session.id)
            .await?
            .ok_or(SessionError::SessionNotFound(session.id))
    }

    /// Start an attempt, or return the taker's attempt that is still active.
    pub async fn start_session(
        &self,
        evaluation: &Evaluation,
        taker_id: &str,
    ) -> Result<Started, SessionError> {
        let now = self.clock.now();
        if !evaluation.published {
            return Err(SessionError::NotAvailable {
                evaluation_id: evaluation.id.clone(),
                reason: "evaluation is not published".into(),
            });
        }
        if !evaluation.window.contains(now) {
            return Err(SessionError::NotAvailable {
                evaluation_id: evaluation.id.clone(),
                reason: "outside the availability window".into(),
            });
        }

        let mut attempts = Vec::new();
        for session in self.sessions.attempts(&evaluation.id, taker_id).await? {
            attempts.push(self.refresh(session).await?);
        }

        if let Some(active) = attempts
            .iter()
            .find(|s| s.status == SessionStatus::Active)
        {
            tracing::debug!(session = %active.id, taker = taker_id, "resuming active session");
            return Ok(Started::AlreadyActive(active.clone()));
        }

        if evaluation.retake_policy == RetakePolicy::Forbidden
            && attempts
                .iter()
                .any(|s| s.status == SessionStatus::Submitted)
        {
            return Err(SessionError::AlreadyAttempted {
                evaluation_id: evaluation.id.clone(),
                taker_id: taker_id.to_string(),
            });
        }

        let session = Session {
            id: Uuid::new_v4(),
            evaluation_id: evaluation.id.clone(),
            taker_id: taker_id.to_string(),
            attempt: attempts.len() as u32 + 1,
            status: SessionStatus::Active,
            started_at: now,
            last_activity_at: now,
            time_limit_minutes: evaluation.time_limit_minutes,
            submitted_at: None,
            expired_at: None,
            revision: 0,
        };

        match self.sessions.insert_unless_active(session.clone()).await? {
            Some(existing) => Ok(Started::AlreadyActive(existing)),
            None => {
                tracing::info!(
                    session = %session.id,
                    evaluation = %session.evaluation_id,
                    taker = taker_id,
                    attempt = session.attempt,
                    "session started"
                );
                Ok(Started::New(session))
            }
        }
    }

    /// Status and remaining time, expiring the session lazily if due.
    pub async fn get_status(&self, id: SessionId) -> Result<StatusView, SessionError> {
        let session = self.session(id).await?;
        let time_remaining = match session.status {
            SessionStatus::Active => {
                clock::time_remaining(session.started_at, session.time_limit(), self.clock.now())
            }
            SessionStatus::Expired => TimeRemaining::Limited(std::time::Duration::ZERO),
            SessionStatus::Submitted => clock::time_remaining(
                session.started_at,
                session.time_limit(),
                session.submitted_at.unwrap_or(session.last_activity_at),
            ),
        };

        Ok(StatusView {
            session_id: session.id,
            status: session.status,
            time_remaining,
            deadline: session.deadline(),
            started_at: session.started_at,
            last_activity_at: session.last_activity_at,
        })
    }

    /// Advance `last_activity_at` of an active session.
    pub async fn record_activity(&self, id: SessionId) -> Result<Session, SessionError> {
        let session = self.ensure_active(id).await?;
        let mut touched = session;
        touched.last_activity_at = touched.last_activity_at.max(self.clock.now());

        if self
            .sessions
            .compare_and_swap(SessionStatus::Active, &touched)
            .await?
        {
            tracing::debug!(session = %id, "activity recorded");
            return Ok(next_revision(&touched));
        }
        // Lost to a concurrent writer, which already moved the revision on.
        require_active(self.session(id).await?)
    }

    /// Upsert a draft answer. Counts as activity.
    ///
    /// The activity bump happens after the draft write: a submit that read
    /// the drafts before this save then fails its commit and re-reads them.
    /// A save is only acknowledged once the bump lands on an ACTIVE session.
    pub async fn save_draft(
        &self,
        id: SessionId,
        question_id: &str,
        answer: AnswerValue,
    ) -> Result<DraftAnswer, SessionError> {
        self.ensure_active(id).await?;
        let draft = self
            .drafts
            .save(id, question_id, answer, self.clock.now())
            .await?;
        self.record_activity(id).await?;
        tracing::debug!(
            session = %id,
            question = question_id,
            revision = draft.revision,
            "draft saved"
        );
        Ok(draft)
    }

    /// The answers a submit would use right now; the frozen answers once
    /// the session is submitted.
    pub async fn load_draft(
        &self,
        id: SessionId,
    ) -> Result<BTreeMap<QuestionId, AnswerValue>, SessionError> {
        let session = self.session(id).await?;
        if session.status == SessionStatus::Submitted {
            if let Some(submission) = self.sessions.submission(id).await? {
                return Ok(submission.answers);
            }
        }
        let drafts = self.drafts.load(id).await?;
        Ok(merge_answers(drafts, BTreeMap::new()))
    }

    /// Freeze the answers, grade objective questions, and mark the session
    /// SUBMITTED, all in one commit.
    ///
    /// `attachments` must already be confirmed durable by the caller.
    pub async fn submit(
        &self,
        evaluation: &Evaluation,
        id: SessionId,
        answers: BTreeMap<QuestionId, AnswerValue>,
        attachments: Vec<AttachmentRef>,
    ) -> Result<SubmitReceipt, SessionError> {
        let fingerprint = fingerprint(&answers, &attachments)?;
        let mut attachments = attachments;
        attachments.sort();
        attachments.dedup();

        for _ in 0..MAX_SUBMIT_ATTEMPTS {
            if let Some(receipt) = self
                .try_submit(evaluation, id, &answers, &attachments, fingerprint)
                .await?
            {
                return Ok(receipt);
            }
            tracing::debug!(session = %id, "session changed during submit, retrying");
        }
        Err(StoreError::Contended {
            key: id.to_string(),
        }
        .into())
    }

    /// One read-grade-commit round. `Ok(None)` when the session moved on
    /// between the read and the commit while staying ACTIVE.
    async fn try_submit(
        &self,
        evaluation: &Evaluation,
        id: SessionId,
        answers: &BTreeMap<QuestionId, AnswerValue>,
        attachments: &[AttachmentRef],
        fingerprint: Uuid,
    ) -> Result<Option<SubmitReceipt>, SessionError> {
        let session = self.session(id).await?;
        match session.status {
            SessionStatus::Submitted => return self.replay(id, fingerprint).await.map(Some),
            SessionStatus::Expired => return Err(SessionError::SessionExpired(id)),
            SessionStatus::Active => {}
        }

        let now = self.clock.now();
        if self.has_lapsed(&session, now) {
            self.refresh(session).await?;
            return Err(SessionError::SessionExpired(id));
        }

        // Read after the session so a later draft save shows up as a
        // revision change at commit time.
        let drafts = self.drafts.load(id).await?;
        let submission = Submission {
            session_id: id,
            evaluation_id: session.evaluation_id.clone(),
            taker_id: session.taker_id.clone(),
            answers: merge_answers(drafts, answers.clone()),
            attachments: attachments.to_vec(),
            submitted_at: now,
            fingerprint,
        };
        let result = grading::grade_objective(evaluation, &submission);

        let mut submitted = session;
        submitted.status = SessionStatus::Submitted;
        submitted.submitted_at = Some(now);
        submitted.last_activity_at = now;

        match self
            .sessions
            .commit_submission(&submitted, &submission, &result)
            .await?
        {
            CommitOutcome::Committed => {
                tracing::info!(
                    session = %id,
                    score = result.score,
                    max_score = result.max_score,
                    provisional = result.provisional,
                    "submission committed"
                );
                if let Err(e) = self.drafts.discard(id).await {
                    tracing::warn!("failed to discard drafts for session {id}: {e}");
                }
                Ok(Some(SubmitReceipt {
                    submission,
                    result,
                    replayed: false,
                }))
            }
            CommitOutcome::Conflict(SessionStatus::Active) => Ok(None),
            CommitOutcome::Conflict(SessionStatus::Submitted) => {
                self.replay(id, fingerprint).await.map(Some)
            }
            CommitOutcome::Conflict(SessionStatus::Expired) => {
                Err(SessionError::SessionExpired(id))
            }
        }
    }

    /// Treat a submit against a SUBMITTED session as a retry when the
    /// payload matches the stored fingerprint.
    async fn replay(&self, id: SessionId, fingerprint: Uuid) -> Result<SubmitReceipt, SessionError> {
        let submission = self
            .sessions
            .submission(id)
            .await?
            .ok_or(SessionError::SessionAlreadySubmitted(id))?;
        if submission.fingerprint != fingerprint {
            return Err(SessionError::SessionAlreadySubmitted(id));
        }
        let result = self
            .sessions
            .result(id)
            .await?
            .ok_or(SessionError::ResultNotFound(id))?;
        tracing::debug!(session = %id, "replaying identical submission");
        Ok(SubmitReceipt {
            submission,
            result,
            replayed: true,
        })
    }
}

fn require_active(session: Session) -> Result<Session, SessionError> {
    match session.status {
        SessionStatus::Active => Ok(session),
        SessionStatus::Expired => Err(SessionError::SessionExpired(session.id)),
        SessionStatus::Submitted => Err(SessionError::SessionAlreadySubmitted(session.id)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::draft::InMemoryDraftStore;
    use crate::model::{AvailabilityWindow, EvaluationKind, Question, QuestionKind};
    use crate::store::InMemorySessionStore;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn quiz(retake_policy: RetakePolicy) -> Evaluation {
        Evaluation {
            id: "quiz".into(),
            title: "Quiz".into(),
            description: String::new(),
            kind: EvaluationKind::Quiz,
            questions: vec![Question {
                id: "q1".into(),
                prompt: "2 + 2".into(),
                kind: QuestionKind::MultipleChoice {
                    options: vec!["3".into(), "4".into()],
                    correct: 1,
                },
                points: 1,
            }],
            max_score: 1,
            passing_score: 1,
            time_limit_minutes: Some(10),
            retake_policy,
            published: true,
            window: AvailabilityWindow::default(),
        }
    }

    fn manager(config: SessionConfig) -> (Arc<ManualClock>, SessionManager) {
        let clock = Arc::new(ManualClock::new(t0()));
        let manager = SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryDraftStore::new()),
            clock.clone(),
            config,
        );
        (clock, manager)
    }

    #[tokio::test]
    async fn start_is_idempotent_while_active() {
        let (_clock, manager) = manager(SessionConfig::default());
        let eval = quiz(RetakePolicy::Allowed);

        let first = manager.start_session(&eval, "alice").await.unwrap();
        assert!(!first.is_resumed());
        assert_eq!(first.session().attempt, 1);

        let again = manager.start_session(&eval, "alice").await.unwrap();
        assert!(again.is_resumed());
        assert_eq!(again.session().id, first.session().id);
    }

    #[tokio::test]
    async fn unpublished_or_closed_is_not_available() {
        let (_clock, manager) = manager(SessionConfig::default());
        let mut eval = quiz(RetakePolicy::Allowed);
        eval.published = false;
        assert!(matches!(
            manager.start_session(&eval, "alice").await,
            Err(SessionError::NotAvailable { .. })
        ));

        eval.published = true;
        eval.window.closes_at = Some(t0());
        assert!(matches!(
            manager.start_session(&eval, "alice").await,
            Err(SessionError::NotAvailable { .. })
        ));
    }

    #[tokio::test]
    async fn expired_attempt_allows_new_attempt_even_without_retakes() {
        let (clock, manager) = manager(SessionConfig::default());
        let eval = quiz(RetakePolicy::Forbidden);

        let first = manager.start_session(&eval, "alice").await.unwrap();
        clock.advance(chrono::Duration::minutes(15));

        let second = manager.start_session(&eval, "alice").await.unwrap();
        assert!(!second.is_resumed());
        assert_eq!(second.session().attempt, 2);

        let old = manager.session(first.session().id).await.unwrap();
        assert_eq!(old.status, SessionStatus::Expired);
    }

    #[tokio::test]
    async fn idle_timeout_expires_lazily() {
        let (clock, manager) = manager(SessionConfig {
            idle_timeout_minutes: Some(3),
        });
        let mut eval = quiz(RetakePolicy::Allowed);
        eval.time_limit_minutes = None;

        let id = manager.start_session(&eval, "bob").await.unwrap().into_session().id;
        clock.advance(chrono::Duration::minutes(2));
        manager
            .save_draft(id, "q1", AnswerValue::Selected("4".into()))
            .await
            .unwrap();

        clock.advance(chrono::Duration::minutes(2));
        assert_eq!(
            manager.get_status(id).await.unwrap().status,
            SessionStatus::Active
        );

        clock.advance(chrono::Duration::minutes(2));
        let status = manager.get_status(id).await.unwrap();
        assert_eq!(status.status, SessionStatus::Expired);
        assert!(status.time_remaining.is_exhausted());
    }

    #[tokio::test]
    async fn submit_discards_drafts_and_freezes_answers() {
        let (_clock, manager) = manager(SessionConfig::default());
        let eval = quiz(RetakePolicy::Allowed);
        let id = manager.start_session(&eval, "carol").await.unwrap().into_session().id;

        manager
            .save_draft(id, "q1", AnswerValue::Selected("4".into()))
            .await
            .unwrap();
        let receipt = manager
            .submit(&eval, id, BTreeMap::new(), vec![])
            .await
            .unwrap();
        assert_eq!(receipt.result.score, 1);
        assert!(!receipt.replayed);

        let frozen = manager.load_draft(id).await.unwrap();
        assert_eq!(frozen["q1"], AnswerValue::Selected("4".into()));
        assert!(matches!(
            manager.save_draft(id, "q1", AnswerValue::Selected("3".into())).await,
            Err(SessionError::SessionAlreadySubmitted(_))
        ));
    }

    /// Draft store that parks the first `load` after reading, until released.
    #[derive(Default)]
    struct GatedDrafts {
        inner: InMemoryDraftStore,
        armed: std::sync::atomic::AtomicBool,
        parked: tokio::sync::Notify,
        release: tokio::sync::Notify,
    }

    #[async_trait::async_trait]
    impl DraftStore for GatedDrafts {
        async fn save(
            &self,
            session_id: SessionId,
            question_id: &str,
            answer: AnswerValue,
            saved_at: DateTime<Utc>,
        ) -> Result<DraftAnswer, StoreError> {
            self.inner.save(session_id, question_id, answer, saved_at).await
        }

        async fn load(
            &self,
            session_id: SessionId,
        ) -> Result<BTreeMap<QuestionId, DraftAnswer>, StoreError> {
            let drafts = self.inner.load(session_id).await?;
            if self.armed.swap(false, std::sync::atomic::Ordering::SeqCst) {
                self.parked.notify_one();
                self.release.notified().await;
            }
            Ok(drafts)
        }

        async fn discard(&self, session_id: SessionId) -> Result<(), StoreError> {
            self.inner.discard(session_id).await
        }
    }

    #[tokio::test]
    async fn draft_saved_during_submit_is_not_lost() {
        let drafts = Arc::new(GatedDrafts::default());
        let manager = Arc::new(SessionManager::new(
            Arc::new(InMemorySessionStore::new()),
            drafts.clone(),
            Arc::new(ManualClock::new(t0())),
            SessionConfig::default(),
        ));
        let eval = quiz(RetakePolicy::Allowed);
        let id = manager.start_session(&eval, "dave").await.unwrap().into_session().id;

        drafts.armed.store(true, std::sync::atomic::Ordering::SeqCst);
        let submit = {
            let manager = Arc::clone(&manager);
            let eval = eval.clone();
            tokio::spawn(async move { manager.submit(&eval, id, BTreeMap::new(), vec![]).await })
        };

        // Submit has read the (empty) drafts and is about to commit.
        drafts.parked.notified().await;
        manager
            .save_draft(id, "q1", AnswerValue::Selected("4".into()))
            .await
            .unwrap();
        drafts.release.notify_one();

        let receipt = submit.await.unwrap().unwrap();
        assert_eq!(
            receipt.submission.answers.get("q1"),
            Some(&AnswerValue::Selected("4".into()))
        );
        assert_eq!(receipt.result.score, 1);
        assert_eq!(
            manager.load_draft(id).await.unwrap(),
            receipt.submission.answers
        );
    }

    #[test]
    fn fingerprint_ignores_attachment_order() {
        let mut answers = BTreeMap::new();
        answers.insert("q1".to_string(), AnswerValue::Text("x".into()));
        let a = AttachmentRef::new("a");
        let b = AttachmentRef::new("b");
        assert_eq!(
            fingerprint(&answers, &[a.clone(), b.clone()]).unwrap(),
            fingerprint(&answers, &[b, a.clone()]).unwrap()
        );
        assert_ne!(
            fingerprint(&answers, &[a.clone()]).unwrap(),
            fingerprint(&BTreeMap::new(), &[a]).unwrap()
        );
    }
}
