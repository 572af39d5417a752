//! Evaluation catalogue backed by a directory of TOML files.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use proctor_core::model::Evaluation;
use proctor_core::parser::load_evaluation_directory;
use proctor_core::traits::EvaluationCatalog;

/// Reads evaluations from `*.toml` files under a directory on every lookup,
/// so edits on disk are picked up without a restart.
pub struct DirectoryCatalog {
    dir: PathBuf,
}

impl DirectoryCatalog {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    /// Every evaluation that parses.
    pub fn list(&self) -> anyhow::Result<Vec<Evaluation>> {
        load_evaluation_directory(&self.dir)
    }
}

#[async_trait]
impl EvaluationCatalog for DirectoryCatalog {
    async fn evaluation(&self, id: &str) -> anyhow::Result<Option<Evaluation>> {
        Ok(self.list()?.into_iter().find(|e| e.id == id))
    }
}
