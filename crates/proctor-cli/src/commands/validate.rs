//! The `proctor validate` command.

use std::path::PathBuf;

use anyhow::Result;

use proctor_core::parser;

pub fn execute(path: PathBuf) -> Result<()> {
    let evaluations = if path.is_dir() {
        parser::load_evaluation_directory(&path)?
    } else {
        vec![parser::parse_evaluation(&path)?]
    };

    let mut total_warnings = 0;
    let mut invalid = 0;

    for evaluation in &evaluations {
        println!(
            "Evaluation: {} [{}] ({} questions, {} points)",
            evaluation.title,
            evaluation.kind,
            evaluation.questions.len(),
            evaluation.max_score
        );

        if let Err(e) = evaluation.check() {
            println!("  ERROR: {e}");
            invalid += 1;
        }

        let warnings = parser::validate_evaluation(evaluation);
        for w in &warnings {
            let prefix = w
                .question_id
                .as_ref()
                .map(|id| format!("  [{id}]"))
                .unwrap_or_else(|| "  ".to_string());
            println!("{prefix} WARNING: {}", w.message);
        }
        total_warnings += warnings.len();
    }

    if invalid > 0 {
        anyhow::bail!("{invalid} invalid evaluation(s)");
    }

    if total_warnings == 0 {
        println!("All evaluations valid.");
    } else {
        println!("\n{total_warnings} warning(s) found.");
    }

    Ok(())
}
