//! Collaborator traits for the evaluation catalogue, attachment storage,
//! and the notification layer.
//!
//! The session engine never reaches these through globals; they are handed
//! to [`EvaluationSessionService`](crate::service::EvaluationSessionService)
//! at construction time. In-memory implementations live here as well.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{AttachmentError, SessionError};
use crate::model::{AttachmentRef, Evaluation, SessionId};
use crate::session::SubmitReceipt;

// ---------------------------------------------------------------------------
// Evaluation catalogue
// ---------------------------------------------------------------------------

/// Read-only source of authored evaluations.
#[async_trait]
pub trait EvaluationCatalog: Send + Sync {
    /// Fetch an evaluation by id. `Ok(None)` if it does not exist.
    async fn evaluation(&self, id: &str) -> anyhow::Result<Option<Evaluation>>;
}

/// Catalogue backed by a fixed set of evaluations.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    evaluations: HashMap<String, Evaluation>,
}

impl InMemoryCatalog {
    pub fn new(evaluations: impl IntoIterator<Item = Evaluation>) -> Self {
        Self {
            evaluations: evaluations
                .into_iter()
                .map(|e| (e.id.clone(), e))
                .collect(),
        }
    }
}

#[async_trait]
impl EvaluationCatalog for InMemoryCatalog {
    async fn evaluation(&self, id: &str) -> anyhow::Result<Option<Evaluation>> {
        Ok(self.evaluations.get(id).cloned())
    }
}

// ---------------------------------------------------------------------------
// Attachment storage
// ---------------------------------------------------------------------------

/// External file storage for answer attachments.
#[async_trait]
pub trait AttachmentStore: Send + Sync {
    /// Store `bytes` and return a stable reference.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<AttachmentRef, AttachmentError>;

    /// Confirm that `reference` is durably stored.
    async fn confirm(&self, reference: &AttachmentRef) -> Result<(), AttachmentError>;
}

/// Process-local attachment storage. Can be switched to a failing mode.
#[derive(Debug, Default)]
pub struct InMemoryAttachmentStore {
    objects: Mutex<HashSet<AttachmentRef>>,
    next_id: AtomicU32,
    unavailable: AtomicBool,
}

impl InMemoryAttachmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), AttachmentError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AttachmentError::Unavailable("in-memory store offline".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl AttachmentStore for InMemoryAttachmentStore {
    async fn upload(&self, name: &str, _bytes: Vec<u8>) -> Result<AttachmentRef, AttachmentError> {
        self.check_available()?;
        let n = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let reference = AttachmentRef::new(format!("mem-{n}-{name}"));
        self.objects
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(reference.clone());
        Ok(reference)
    }

    async fn confirm(&self, reference: &AttachmentRef) -> Result<(), AttachmentError> {
        self.check_available()?;
        let objects = self.objects.lock().unwrap_or_else(|e| e.into_inner());
        if objects.contains(reference) {
            Ok(())
        } else {
            Err(AttachmentError::Missing(reference.to_string()))
        }
    }
}

// ---------------------------------------------------------------------------
// Notification layer
// ---------------------------------------------------------------------------

/// Side consumer informed of submission outcomes.
///
/// Implementations must not fail; core correctness never depends on them.
pub trait SubmissionNotifier: Send + Sync {
    fn on_submitted(&self, receipt: &SubmitReceipt);

    fn on_submit_failed(&self, session_id: SessionId, error: &SessionError);
}

/// A notifier that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNotifier;

impl SubmissionNotifier for NoopNotifier {
    fn on_submitted(&self, _receipt: &SubmitReceipt) {}

    fn on_submit_failed(&self, _session_id: SessionId, _error: &SessionError) {}
}
