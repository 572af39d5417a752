//! The `proctor upload` and `proctor submit` commands.

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use uuid::Uuid;

use proctor_core::model::AttachmentRef;

pub async fn upload(config: Option<PathBuf>, file: PathBuf) -> Result<()> {
    let service = super::open(config)?;
    let bytes = std::fs::read(&file)
        .with_context(|| format!("failed to read {}", file.display()))?;
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());

    let reference = service.upload(&name, bytes).await?;
    println!("{reference}");
    Ok(())
}

pub async fn execute(
    config: Option<PathBuf>,
    session: Uuid,
    answers: Vec<String>,
    attachments: Vec<String>,
) -> Result<()> {
    let service = super::open(config)?;
    let evaluation_id = service.session(session).await?.evaluation_id;
    let evaluation = service.evaluation(&evaluation_id).await?;

    let mut parsed = BTreeMap::new();
    for raw in &answers {
        let (question, value) = raw
            .split_once('=')
            .with_context(|| format!("expected QUESTION=VALUE, got '{raw}'"))?;
        let question = question.trim();
        parsed.insert(
            question.to_string(),
            super::parse_answer(&evaluation, question, value),
        );
    }
    let attachments = attachments.into_iter().map(AttachmentRef::new).collect();

    let receipt = service.submit(session, parsed, attachments).await?;
    super::result::print_result(&receipt.result);
    Ok(())
}
