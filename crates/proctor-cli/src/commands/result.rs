//! The `proctor result` and `proctor grade` commands.

use std::path::PathBuf;

use anyhow::Result;
use comfy_table::{Cell, Table};
use uuid::Uuid;

use proctor_core::grading::{GradeResult, Verdict};

pub async fn show(
    config: Option<PathBuf>,
    session: Uuid,
    format: String,
    output: Option<PathBuf>,
) -> Result<()> {
    let service = super::open(config)?;
    let result = service.get_result(session).await?;

    if let Some(path) = &output {
        result.save_json(path)?;
        eprintln!("Result written to {}", path.display());
    }

    match format.as_str() {
        "text" => print_result(&result),
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        "markdown" | "md" => print!("{}", result.to_markdown()),
        other => anyhow::bail!("unknown format: {other}"),
    }
    Ok(())
}

pub async fn grade(
    config: Option<PathBuf>,
    session: Uuid,
    question: String,
    score: i64,
    feedback: Option<String>,
) -> Result<()> {
    let service = super::open(config)?;
    let result = service
        .record_manual_grade(session, &question, score, feedback)
        .await?;
    print_result(&result);
    Ok(())
}

pub(crate) fn print_result(result: &GradeResult) {
    let mut table = Table::new();
    table.set_header(vec!["Question", "Type", "Points", "Verdict", "Feedback"]);

    for q in &result.questions {
        let points = match q.awarded {
            Some(awarded) => format!("{awarded}/{}", q.max_points),
            None => format!("-/{}", q.max_points),
        };
        let verdict = match q.verdict {
            Verdict::Correct => "correct",
            Verdict::Incorrect => "incorrect",
            Verdict::Pending => "pending",
            Verdict::Reviewed => "reviewed",
        };
        table.add_row(vec![
            Cell::new(&q.question_id),
            Cell::new(&q.kind),
            Cell::new(points),
            Cell::new(verdict),
            Cell::new(q.feedback.as_deref().unwrap_or("")),
        ]);
    }

    println!("{table}");
    println!(
        "Score: {}/{} ({:.1}%) {}{}",
        result.score,
        result.max_score,
        result.percentage,
        if result.passed { "PASSED" } else { "NOT PASSED" },
        if result.provisional {
            " [provisional]"
        } else {
            ""
        }
    );
}
