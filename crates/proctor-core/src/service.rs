//! Evaluation session façade.
//!
//! Composes the catalogue, the session manager, attachment storage and the
//! grading engine into the operation set consumed by callers. Business rules
//! live in the components; this layer only sequences them: re-check expiry
//! before any write, confirm attachments before freezing a submission.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use futures::future::try_join_all;

use crate::clock::Clock;
use crate::draft::{DraftAnswer, DraftStore};
use crate::error::{SessionError, StoreError};
use crate::grading::{self, GradeResult};
use crate::model::{AnswerValue, AttachmentRef, Evaluation, QuestionId, SessionId};
use crate::session::{
    Session, SessionConfig, SessionManager, SessionStatus, Started, StatusView, SubmitReceipt,
};
use crate::store::SessionStore;
use crate::traits::{AttachmentStore, EvaluationCatalog, NoopNotifier, SubmissionNotifier};

/// Manual-grade attempts before giving up on a result that keeps changing.
const MAX_GRADE_ATTEMPTS: usize = 8;

/// The operations exposed to the API/UI layer.
pub struct EvaluationSessionService {
    catalog: Arc<dyn EvaluationCatalog>,
    attachments: Arc<dyn AttachmentStore>,
    sessions: Arc<dyn SessionStore>,
    notifier: Arc<dyn SubmissionNotifier>,
    manager: SessionManager,
}

impl EvaluationSessionService {
    pub fn new(
        catalog: Arc<dyn EvaluationCatalog>,
        sessions: Arc<dyn SessionStore>,
        drafts: Arc<dyn DraftStore>,
        attachments: Arc<dyn AttachmentStore>,
        clock: Arc<dyn Clock>,
        config: SessionConfig,
    ) -> Self {
        let manager = SessionManager::new(Arc::clone(&sessions), drafts, clock, config);
        Self {
            catalog,
            attachments,
            sessions,
            notifier: Arc::new(NoopNotifier),
            manager,
        }
    }

    /// Replace the notification layer.
    pub fn with_notifier(mut self, notifier: Arc<dyn SubmissionNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Fetch an evaluation from the catalogue.
    pub async fn evaluation(&self, evaluation_id: &str) -> Result<Evaluation, SessionError> {
        self.catalog
            .evaluation(evaluation_id)
            .await
            .map_err(|e| SessionError::Catalog(format!("{e:#}")))?
            .ok_or_else(|| SessionError::EvaluationNotFound(evaluation_id.to_string()))
    }

    /// Start an attempt, or resume the taker's active one.
    pub async fn start(&self, evaluation_id: &str, taker_id: &str) -> Result<Started, SessionError> {
        let evaluation = self.evaluation(evaluation_id).await?;
        evaluation.check()?;
        self.manager.start_session(&evaluation, taker_id).await
    }

    /// The session record, with lazy expiry applied.
    pub async fn session(&self, session_id: SessionId) -> Result<Session, SessionError> {
        self.manager.session(session_id).await
    }

    pub async fn get_status(&self, session_id: SessionId) -> Result<StatusView, SessionError> {
        self.manager.get_status(session_id).await
    }

    pub async fn record_activity(&self, session_id: SessionId) -> Result<Session, SessionError> {
        self.manager.record_activity(session_id).await
    }

    /// Upsert a draft answer for a question of the session's evaluation.
    pub async fn save_draft(
        &self,
        session_id: SessionId,
        question_id: &str,
        answer: AnswerValue,
    ) -> Result<DraftAnswer, SessionError> {
        let session = self.manager.ensure_active(session_id).await?;
        let evaluation = self.evaluation(&session.evaluation_id).await?;
        if evaluation.question(question_id).is_none() {
            return Err(SessionError::UnknownQuestion {
                evaluation_id: evaluation.id,
                question_id: question_id.to_string(),
            });
        }
        self.manager.save_draft(session_id, question_id, answer).await
    }

    pub async fn load_draft(
        &self,
        session_id: SessionId,
    ) -> Result<BTreeMap<QuestionId, AnswerValue>, SessionError> {
        self.manager.load_draft(session_id).await
    }

    /// Hand a file to attachment storage.
    pub async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<AttachmentRef, SessionError> {
        let reference = self.attachments.upload(name, bytes).await?;
        tracing::debug!(attachment = %reference, "attachment uploaded");
        Ok(reference)
    }

    /// Submit the session and notify the notification layer of the outcome.
    pub async fn submit(
        &self,
        session_id: SessionId,
        answers: BTreeMap<QuestionId, AnswerValue>,
        attachments: Vec<AttachmentRef>,
    ) -> Result<SubmitReceipt, SessionError> {
        let outcome = self.submit_inner(session_id, answers, attachments).await;
        match &outcome {
            Ok(receipt) => self.notifier.on_submitted(receipt),
            Err(e) => self.notifier.on_submit_failed(session_id, e),
        }
        outcome
    }

    async fn submit_inner(
        &self,
        session_id: SessionId,
        answers: BTreeMap<QuestionId, AnswerValue>,
        attachments: Vec<AttachmentRef>,
    ) -> Result<SubmitReceipt, SessionError> {
        let session = self.manager.session(session_id).await?;
        let evaluation = self.evaluation(&session.evaluation_id).await?;
        // The catalogue may have been edited since the session started.
        evaluation.check()?;

        if let Some(unknown) = answers.keys().find(|q| evaluation.question(q).is_none()) {
            return Err(SessionError::UnknownQuestion {
                evaluation_id: evaluation.id.clone(),
                question_id: unknown.clone(),
            });
        }

        if session.status == SessionStatus::Active {
            let mut pending = self.manager.load_draft(session_id).await?;
            pending.extend(answers.clone());
            let mut references: BTreeSet<AttachmentRef> = attachments.iter().cloned().collect();
            references.extend(pending.values().filter_map(|a| a.attachment().cloned()));
            self.confirm_attachments(&references).await?;
        }

        self.manager
            .submit(&evaluation, session_id, answers, attachments)
            .await
    }

    async fn confirm_attachments(
        &self,
        references: &BTreeSet<AttachmentRef>,
    ) -> Result<(), SessionError> {
        try_join_all(references.iter().map(|r| self.attachments.confirm(r))).await?;
        Ok(())
    }

    /// The graded result of a submitted session.
    pub async fn get_result(&self, session_id: SessionId) -> Result<GradeResult, SessionError> {
        self.manager.session(session_id).await?;
        self.sessions
            .result(session_id)
            .await?
            .ok_or(SessionError::ResultNotFound(session_id))
    }

    /// Record a reviewer's score for a short-answer or essay question and
    /// persist the recomputed result.
    pub async fn record_manual_grade(
        &self,
        session_id: SessionId,
        question_id: &str,
        score: i64,
        feedback: Option<String>,
    ) -> Result<GradeResult, SessionError> {
        for _ in 0..MAX_GRADE_ATTEMPTS {
            let mut result = self
                .sessions
                .result(session_id)
                .await?
                .ok_or(SessionError::ResultNotFound(session_id))?;

            grading::record_manual_grade(&mut result, question_id, score, feedback.clone())?;
            if self.sessions.replace_result(&result).await? {
                result.revision += 1;
                return Ok(result);
            }
            tracing::debug!(session = %session_id, "result changed while grading, retrying");
        }
        Err(StoreError::Contended {
            key: session_id.to_string(),
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::draft::InMemoryDraftStore;
    use crate::error::{AttachmentError, EvaluationError};
    use crate::model::{
        AvailabilityWindow, EvaluationKind, Question, QuestionKind, RetakePolicy,
    };
    use crate::store::InMemorySessionStore;
    use crate::traits::{InMemoryAttachmentStore, InMemoryCatalog};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;

    fn project() -> Evaluation {
        Evaluation {
            id: "proj".into(),
            title: "Final project".into(),
            description: String::new(),
            kind: EvaluationKind::Project,
            questions: vec![Question {
                id: "report".into(),
                prompt: "Upload your report".into(),
                kind: QuestionKind::Essay,
                points: 10,
            }],
            max_score: 10,
            passing_score: 6,
            time_limit_minutes: None,
            retake_policy: RetakePolicy::Allowed,
            published: true,
            window: AvailabilityWindow::default(),
        }
    }

    fn service(attachments: Arc<InMemoryAttachmentStore>) -> EvaluationSessionService {
        EvaluationSessionService::new(
            Arc::new(InMemoryCatalog::new([project()])),
            Arc::new(InMemorySessionStore::new()),
            Arc::new(InMemoryDraftStore::new()),
            attachments,
            Arc::new(ManualClock::new(
                Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
            )),
            SessionConfig::default(),
        )
    }

    #[derive(Default)]
    struct RecordingNotifier {
        events: Mutex<Vec<String>>,
    }

    impl SubmissionNotifier for RecordingNotifier {
        fn on_submitted(&self, receipt: &SubmitReceipt) {
            self.events
                .lock()
                .unwrap()
                .push(format!("ok:{}", receipt.replayed));
        }

        fn on_submit_failed(&self, _session_id: SessionId, error: &SessionError) {
            self.events.lock().unwrap().push(format!("err:{error}"));
        }
    }

    #[tokio::test]
    async fn unknown_evaluation_and_question() {
        let svc = service(Arc::new(InMemoryAttachmentStore::new()));
        assert!(matches!(
            svc.start("missing", "alice").await,
            Err(SessionError::EvaluationNotFound(_))
        ));

        let id = svc.start("proj", "alice").await.unwrap().session().id;
        assert!(matches!(
            svc.save_draft(id, "nope", AnswerValue::Text("x".into())).await,
            Err(SessionError::UnknownQuestion { .. })
        ));
    }

    #[tokio::test]
    async fn file_answers_are_confirmed_before_commit() {
        let storage = Arc::new(InMemoryAttachmentStore::new());
        let svc = service(Arc::clone(&storage));
        let id = svc.start("proj", "alice").await.unwrap().session().id;

        let reference = svc.upload("report.pdf", b"%PDF".to_vec()).await.unwrap();
        svc.save_draft(id, "report", AnswerValue::File(reference.clone()))
            .await
            .unwrap();

        storage.set_unavailable(true);
        let err = svc.submit(id, BTreeMap::new(), vec![]).await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::AttachmentStorageFailure(AttachmentError::Unavailable(_))
        ));
        assert_eq!(svc.get_status(id).await.unwrap().status, SessionStatus::Active);
        assert!(matches!(
            svc.get_result(id).await,
            Err(SessionError::ResultNotFound(_))
        ));

        storage.set_unavailable(false);
        let receipt = svc.submit(id, BTreeMap::new(), vec![]).await.unwrap();
        assert_eq!(receipt.submission.answers["report"], AnswerValue::File(reference));
        assert!(receipt.result.provisional);
    }

    #[tokio::test]
    async fn unconfirmed_attachment_fails_submit() {
        let svc = service(Arc::new(InMemoryAttachmentStore::new()));
        let id = svc.start("proj", "alice").await.unwrap().session().id;
        let err = svc
            .submit(id, BTreeMap::new(), vec![AttachmentRef::new("ghost")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionError::AttachmentStorageFailure(AttachmentError::Missing(_))
        ));
    }

    #[tokio::test]
    async fn notifier_sees_every_outcome() {
        let notifier = Arc::new(RecordingNotifier::default());
        let svc = service(Arc::new(InMemoryAttachmentStore::new()))
            .with_notifier(notifier.clone());
        let id = svc.start("proj", "alice").await.unwrap().session().id;

        let mut answers = BTreeMap::new();
        answers.insert("report".to_string(), AnswerValue::Text("done".into()));
        svc.submit(id, answers.clone(), vec![]).await.unwrap();
        svc.submit(id, answers, vec![]).await.unwrap();
        svc.submit(id, BTreeMap::new(), vec![]).await.unwrap_err();

        let events = notifier.events.lock().unwrap().clone();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0], "ok:false");
        assert_eq!(events[1], "ok:true");
        assert!(events[2].starts_with("err:"));
    }

    #[tokio::test]
    async fn manual_grade_is_persisted() {
        let svc = service(Arc::new(InMemoryAttachmentStore::new()));
        let id = svc.start("proj", "alice").await.unwrap().session().id;
        svc.submit(id, BTreeMap::new(), vec![]).await.unwrap();

        let graded = svc
            .record_manual_grade(id, "report", 7, Some("solid".into()))
            .await
            .unwrap();
        assert!(!graded.provisional);
        assert!(graded.passed);
        assert_eq!(svc.get_result(id).await.unwrap(), graded);

        assert!(matches!(
            svc.record_manual_grade(id, "report", 11, None).await,
            Err(SessionError::ScoreOutOfRange { .. })
        ));
        assert_eq!(svc.get_result(id).await.unwrap().score, 7);
    }

    #[tokio::test]
    async fn submit_rechecks_an_edited_evaluation() {
        let sessions = Arc::new(InMemorySessionStore::new());
        let drafts = Arc::new(InMemoryDraftStore::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap(),
        ));
        let mut quiz = project();
        quiz.questions[0].kind = QuestionKind::MultipleChoice {
            options: vec!["a".into(), "b".into()],
            correct: 0,
        };

        let original = EvaluationSessionService::new(
            Arc::new(InMemoryCatalog::new([quiz.clone()])),
            sessions.clone(),
            drafts.clone(),
            Arc::new(InMemoryAttachmentStore::new()),
            clock.clone(),
            SessionConfig::default(),
        );
        let id = original.start("proj", "alice").await.unwrap().session().id;

        // The answer key now points past the options.
        quiz.questions[0].kind = QuestionKind::MultipleChoice {
            options: vec!["a".into(), "b".into()],
            correct: 5,
        };
        let edited = EvaluationSessionService::new(
            Arc::new(InMemoryCatalog::new([quiz])),
            sessions,
            drafts,
            Arc::new(InMemoryAttachmentStore::new()),
            clock,
            SessionConfig::default(),
        );

        let mut answers = BTreeMap::new();
        answers.insert("report".to_string(), AnswerValue::Selected("a".into()));
        assert!(matches!(
            edited.submit(id, answers, vec![]).await,
            Err(SessionError::InvalidEvaluation(
                EvaluationError::CorrectOutOfRange { .. }
            ))
        ));
        assert_eq!(
            edited.get_status(id).await.unwrap().status,
            SessionStatus::Active
        );
    }
}
