pub mod draft;
pub mod init;
pub mod result;
pub mod session;
pub mod submit;
pub mod validate;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};

use proctor_core::clock::{Clock, ManualClock, SystemClock};
use proctor_core::error::SessionError;
use proctor_core::model::{AnswerValue, Evaluation, SessionId};
use proctor_core::service::EvaluationSessionService;
use proctor_core::session::SubmitReceipt;
use proctor_core::traits::SubmissionNotifier;
use proctor_store::config::load_config_from;
use proctor_store::open_service;

/// Console notifier for submission outcomes.
struct ConsoleNotifier;

impl SubmissionNotifier for ConsoleNotifier {
    fn on_submitted(&self, receipt: &SubmitReceipt) {
        let note = if receipt.replayed {
            " (already recorded)"
        } else {
            ""
        };
        eprintln!(
            "Submission received for session {}{note}",
            receipt.submission.session_id
        );
    }

    fn on_submit_failed(&self, session_id: SessionId, error: &SessionError) {
        eprintln!("Submission failed for session {session_id}: {error}");
    }
}

/// `PROCTOR_NOW` pins the clock; otherwise wall-clock time.
fn clock() -> Result<Arc<dyn Clock>> {
    match std::env::var("PROCTOR_NOW") {
        Ok(value) => {
            let now = DateTime::parse_from_rfc3339(&value)
                .with_context(|| format!("PROCTOR_NOW is not an RFC 3339 timestamp: {value}"))?
                .with_timezone(&Utc);
            Ok(Arc::new(ManualClock::new(now)))
        }
        Err(_) => Ok(Arc::new(SystemClock)),
    }
}

/// Build the service from configuration.
pub(crate) fn open(config: Option<PathBuf>) -> Result<EvaluationSessionService> {
    let config = load_config_from(config.as_deref())?;
    tracing::debug!(?config, "loaded configuration");
    let service = open_service(&config, clock()?)?;
    Ok(service.with_notifier(Arc::new(ConsoleNotifier)))
}

/// Interpret a raw CLI value as an answer to `question_id`.
///
/// Unknown questions fall back to free text and are rejected by the service.
pub(crate) fn parse_answer(evaluation: &Evaluation, question_id: &str, raw: &str) -> AnswerValue {
    match evaluation.question(question_id) {
        Some(question) => question.answer_from_raw(raw),
        None => AnswerValue::Text(raw.to_string()),
    }
}
