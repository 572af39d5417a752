//! JSON-file draft store: one file per session under `drafts/`.
//!
//! Saves and discards hold `drafts.lock` in the data directory, so tabs
//! served by different processes never overwrite each other's answers.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use proctor_core::draft::{DraftAnswer, DraftStore};
use proctor_core::error::StoreError;
use proctor_core::model::{AnswerValue, QuestionId, SessionId};

use crate::json::{read_opt, remove_if_exists, write_atomic};
use crate::lock::StoreLock;

#[derive(Debug, Default, Serialize, Deserialize)]
struct DraftFile {
    /// Last revision handed out for this session.
    revision: u64,
    answers: BTreeMap<QuestionId, DraftAnswer>,
}

pub struct FileDraftStore {
    dir: PathBuf,
    write_lock: StoreLock,
}

impl FileDraftStore {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let dir = data_dir.join("drafts");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        Ok(Self {
            dir,
            write_lock: StoreLock::new(data_dir.join("drafts.lock")),
        })
    }

    fn path(&self, session_id: SessionId) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }
}

#[async_trait]
impl DraftStore for FileDraftStore {
    async fn save(
        &self,
        session_id: SessionId,
        question_id: &str,
        answer: AnswerValue,
        saved_at: DateTime<Utc>,
    ) -> Result<DraftAnswer, StoreError> {
        let _guard = self.write_lock.acquire().await?;
        let path = self.path(session_id);
        let mut file: DraftFile = read_opt(&path)?.unwrap_or_default();

        file.revision += 1;
        let draft = DraftAnswer {
            question_id: question_id.to_string(),
            answer,
            saved_at,
            revision: file.revision,
        };
        file.answers.insert(question_id.to_string(), draft.clone());
        write_atomic(&path, &file)?;
        Ok(draft)
    }

    async fn load(
        &self,
        session_id: SessionId,
    ) -> Result<BTreeMap<QuestionId, DraftAnswer>, StoreError> {
        Ok(read_opt::<DraftFile>(&self.path(session_id))?
            .map(|f| f.answers)
            .unwrap_or_default())
    }

    async fn discard(&self, session_id: SessionId) -> Result<(), StoreError> {
        let _guard = self.write_lock.acquire().await?;
        remove_if_exists(&self.path(session_id))
    }
}
