//! The `proctor save-draft` and `proctor load-draft` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

pub async fn save(
    config: Option<PathBuf>,
    session: Uuid,
    question: String,
    answer: String,
) -> Result<()> {
    let service = super::open(config)?;
    let evaluation_id = service.session(session).await?.evaluation_id;
    let evaluation = service.evaluation(&evaluation_id).await?;

    let value = super::parse_answer(&evaluation, &question, &answer);
    let draft = service.save_draft(session, &question, value).await?;
    println!(
        "Saved draft for {} (revision {})",
        draft.question_id, draft.revision
    );
    Ok(())
}

pub async fn load(config: Option<PathBuf>, session: Uuid, json: bool) -> Result<()> {
    let service = super::open(config)?;
    let answers = service.load_draft(session).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&answers)?);
        return Ok(());
    }

    if answers.is_empty() {
        println!("No answers saved.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Question", "Answer"]);
    for (question, answer) in &answers {
        table.add_row(vec![Cell::new(question), Cell::new(answer)]);
    }
    println!("{table}");
    Ok(())
}
