//! JSON-file session store.
//!
//! Layout under the data directory:
//!
//! ```text
//! sessions/<id>.json
//! submissions/<id>.json
//! results/<id>.json
//! ```
//!
//! A submission commit writes the submission and result first and the
//! SUBMITTED session record last. The session record is the commit marker:
//! submissions and results are only visible once it says SUBMITTED, so a
//! crash mid-commit leaves the session ACTIVE with nothing observable.
//!
//! Conditional writes hold `sessions.lock` in the data directory, so every
//! process sharing the directory sees them as atomic.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;

use proctor_core::error::StoreError;
use proctor_core::grading::GradeResult;
use proctor_core::model::SessionId;
use proctor_core::session::{Session, SessionStatus, Submission};
use proctor_core::store::{next_revision, CommitOutcome, SessionStore};

use crate::json::{read_opt, write_atomic};
use crate::lock::StoreLock;

pub struct FileSessionStore {
    sessions_dir: PathBuf,
    submissions_dir: PathBuf,
    results_dir: PathBuf,
    write_lock: StoreLock,
}

impl FileSessionStore {
    /// Open (creating if needed) the store under `data_dir`.
    pub fn open(data_dir: &Path) -> Result<Self> {
        let store = Self {
            sessions_dir: data_dir.join("sessions"),
            submissions_dir: data_dir.join("submissions"),
            results_dir: data_dir.join("results"),
            write_lock: StoreLock::new(data_dir.join("sessions.lock")),
        };
        for dir in [
            &store.sessions_dir,
            &store.submissions_dir,
            &store.results_dir,
        ] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create {}", dir.display()))?;
        }
        Ok(store)
    }

    fn session_path(&self, id: SessionId) -> PathBuf {
        self.sessions_dir.join(format!("{id}.json"))
    }

    fn submission_path(&self, id: SessionId) -> PathBuf {
        self.submissions_dir.join(format!("{id}.json"))
    }

    fn result_path(&self, id: SessionId) -> PathBuf {
        self.results_dir.join(format!("{id}.json"))
    }

    fn all_sessions(&self) -> Result<Vec<Session>, StoreError> {
        let mut sessions = Vec::new();
        for entry in std::fs::read_dir(&self.sessions_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(session) = read_opt::<Session>(&path)? {
                    sessions.push(session);
                }
            }
        }
        Ok(sessions)
    }

    fn is_committed(&self, id: SessionId) -> Result<bool, StoreError> {
        Ok(read_opt::<Session>(&self.session_path(id))?
            .is_some_and(|s| s.status == SessionStatus::Submitted))
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn insert_unless_active(&self, session: Session) -> Result<Option<Session>, StoreError> {
        let _guard = self.write_lock.acquire().await?;
        if let Some(active) = self.all_sessions()?.into_iter().find(|s| {
            s.status == SessionStatus::Active
                && s.evaluation_id == session.evaluation_id
                && s.taker_id == session.taker_id
        }) {
            return Ok(Some(active));
        }
        write_atomic(&self.session_path(session.id), &session)?;
        Ok(None)
    }

    async fn get(&self, id: SessionId) -> Result<Option<Session>, StoreError> {
        read_opt(&self.session_path(id))
    }

    async fn attempts(
        &self,
        evaluation_id: &str,
        taker_id: &str,
    ) -> Result<Vec<Session>, StoreError> {
        let mut sessions: Vec<Session> = self
            .all_sessions()?
            .into_iter()
            .filter(|s| s.evaluation_id == evaluation_id && s.taker_id == taker_id)
            .collect();
        sessions.sort_by_key(|s| (s.started_at, s.attempt));
        Ok(sessions)
    }

    async fn compare_and_swap(
        &self,
        expected: SessionStatus,
        session: &Session,
    ) -> Result<bool, StoreError> {
        let _guard = self.write_lock.acquire().await?;
        let path = self.session_path(session.id);
        match read_opt::<Session>(&path)? {
            Some(stored) if stored.status == expected && stored.revision == session.revision => {
                write_atomic(&path, &next_revision(session))?;
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
        let _guard = self.write_lock.acquire().await?;
        let path = self.session_path(session.id);
        let stored = read_opt::<Session>(&path)?.ok_or_else(|| StoreError::Corrupt {
            key: path.display().to_string(),
            message: "session vanished before commit".into(),
        })?;
        if stored.status != SessionStatus::Active || stored.revision != session.revision {
            return Ok(CommitOutcome::Conflict(stored.status));
        }

        write_atomic(&self.submission_path(session.id), submission)?;
        write_atomic(&self.result_path(session.id), result)?;
        write_atomic(&path, &next_revision(session))?;
        Ok(CommitOutcome::Committed)
    }

    async fn submission(&self, id: SessionId) -> Result<Option<Submission>, StoreError> {
        if !self.is_committed(id)? {
            return Ok(None);
        }
        read_opt(&self.submission_path(id))
    }

    async fn result(&self, id: SessionId) -> Result<Option<GradeResult>, StoreError> {
        if !self.is_committed(id)? {
            return Ok(None);
        }
        read_opt(&self.result_path(id))
    }

    async fn replace_result(&self, result: &GradeResult) -> Result<bool, StoreError> {
        let _guard = self.write_lock.acquire().await?;
        if !self.is_committed(result.session_id)? {
            return Ok(false);
        }
        let path = self.result_path(result.session_id);
        match read_opt::<GradeResult>(&path)? {
            Some(stored) if stored.revision == result.revision => {
                let next = GradeResult {
                    revision: result.revision + 1,
                    ..result.clone()
                };
                write_atomic(&path, &next)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::BTreeMap;
    use uuid::Uuid;

    fn session(evaluation: &str, taker: &str) -> Session {
        let now = Utc::now();
        Session {
            id: Uuid::new_v4(),
            evaluation_id: evaluation.into(),
            taker_id: taker.into(),
            attempt: 1,
            status: SessionStatus::Active,
            started_at: now,
            last_activity_at: now,
            time_limit_minutes: Some(30),
            submitted_at: None,
            expired_at: None,
            revision: 0,
        }
    }

    fn artifacts(session: &Session) -> (Submission, GradeResult) {
        let submission = Submission {
            session_id: session.id,
            evaluation_id: session.evaluation_id.clone(),
            taker_id: session.taker_id.clone(),
            answers: BTreeMap::new(),
            attachments: vec![],
            submitted_at: Utc::now(),
            fingerprint: Uuid::nil(),
        };
        let result = GradeResult {
            session_id: session.id,
            evaluation_id: session.evaluation_id.clone(),
            taker_id: session.taker_id.clone(),
            questions: vec![],
            score: 0,
            max_score: 0,
            percentage: 0.0,
            passing_score: 0,
            passed: true,
            provisional: false,
            revision: 0,
        };
        (submission, result)
    }

    #[tokio::test]
    async fn sessions_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let s = session("e1", "alice");
        {
            let store = FileSessionStore::open(dir.path()).unwrap();
            assert!(store.insert_unless_active(s.clone()).await.unwrap().is_none());
        }
        let store = FileSessionStore::open(dir.path()).unwrap();
        assert_eq!(store.get(s.id).await.unwrap(), Some(s.clone()));
        assert_eq!(
            store.insert_unless_active(session("e1", "alice")).await.unwrap(),
            Some(s)
        );
        assert_eq!(store.attempts("e1", "alice").await.unwrap().len(), 1);
        assert!(store.attempts("e1", "bob").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn commit_is_guarded_by_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let s = session("e1", "alice");
        store.insert_unless_active(s.clone()).await.unwrap();
        let (submission, result) = artifacts(&s);

        let mut submitted = s.clone();
        submitted.status = SessionStatus::Submitted;
        assert_eq!(
            store
                .commit_submission(&submitted, &submission, &result)
                .await
                .unwrap(),
            CommitOutcome::Committed
        );
        assert_eq!(
            store
                .commit_submission(&submitted, &submission, &result)
                .await
                .unwrap(),
            CommitOutcome::Conflict(SessionStatus::Submitted)
        );
        assert_eq!(store.submission(s.id).await.unwrap(), Some(submission));
        assert_eq!(store.result(s.id).await.unwrap(), Some(result));
    }

    #[tokio::test]
    async fn uncommitted_artifacts_are_invisible() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let s = session("e1", "alice");
        store.insert_unless_active(s.clone()).await.unwrap();

        // Simulate a crash after the submission was written but before the
        // session record flipped.
        let (submission, result) = artifacts(&s);
        write_atomic(&store.submission_path(s.id), &submission).unwrap();
        write_atomic(&store.result_path(s.id), &result).unwrap();

        assert!(store.submission(s.id).await.unwrap().is_none());
        assert!(store.result(s.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn compare_and_swap_rejects_stale_status() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::open(dir.path()).unwrap();
        let s = session("e1", "alice");
        store.insert_unless_active(s.clone()).await.unwrap();

        let mut expired = s.clone();
        expired.status = SessionStatus::Expired;
        assert!(store
            .compare_and_swap(SessionStatus::Active, &expired)
            .await
            .unwrap());
        assert!(!store
            .compare_and_swap(SessionStatus::Active, &s)
            .await
            .unwrap());
        assert!(!store
            .compare_and_swap(SessionStatus::Active, &session("e2", "bob"))
            .await
            .unwrap());
    }
}
