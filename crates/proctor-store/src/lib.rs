//! proctor-store — Durable storage and configuration for proctor.
//!
//! JSON-file implementations of the session and draft stores, a directory
//! of TOML evaluations as the catalogue, local attachment storage, and the
//! configuration that ties them together.

pub mod attachments;
pub mod catalog;
pub mod config;
pub mod drafts;
mod json;
mod lock;
pub mod sessions;

use std::sync::Arc;

use anyhow::{Context, Result};

use proctor_core::clock::Clock;
use proctor_core::service::EvaluationSessionService;

use crate::attachments::LocalAttachmentStore;
use crate::catalog::DirectoryCatalog;
use crate::config::ProctorConfig;
use crate::drafts::FileDraftStore;
use crate::sessions::FileSessionStore;

/// Build a service over the file-backed stores described by `config`.
pub fn open_service(
    config: &ProctorConfig,
    clock: Arc<dyn Clock>,
) -> Result<EvaluationSessionService> {
    let data_dir = &config.data_dir;
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create data directory: {}", data_dir.display()))?;

    let sessions = FileSessionStore::open(data_dir)?;
    let drafts = FileDraftStore::open(data_dir)?;
    let attachments = LocalAttachmentStore::open(&config.attachments_dir())?;
    let catalog = DirectoryCatalog::new(&config.evaluations_dir);

    tracing::debug!(
        data_dir = %data_dir.display(),
        evaluations = %config.evaluations_dir.display(),
        "opened file-backed stores"
    );

    Ok(EvaluationSessionService::new(
        Arc::new(catalog),
        Arc::new(sessions),
        Arc::new(drafts),
        Arc::new(attachments),
        clock,
        config.session_config(),
    ))
}
