//! The `proctor init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("proctor.toml").exists() {
        println!("proctor.toml already exists, skipping.");
    } else {
        std::fs::write("proctor.toml", SAMPLE_CONFIG)?;
        println!("Created proctor.toml");
    }

    std::fs::create_dir_all("evaluations")?;
    for (name, content) in [
        ("evaluations/example-quiz.toml", EXAMPLE_QUIZ),
        ("evaluations/example-essay.toml", EXAMPLE_ESSAY),
    ] {
        let path = std::path::Path::new(name);
        if path.exists() {
            println!("{name} already exists, skipping.");
        } else {
            std::fs::write(path, content)?;
            println!("Created {name}");
        }
    }

    println!("\nNext steps:");
    println!("  1. Run: proctor validate --evaluations evaluations");
    println!("  2. Run: proctor start --evaluation example-quiz --taker you");
    println!("  3. Run: proctor submit --session <id> --answer q1=let");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# proctor configuration

data_dir = "./proctor-data"
evaluations_dir = "./evaluations"
# attachments_dir = "${HOME}/proctor-attachments"
# idle_timeout_minutes = 30
"#;

const EXAMPLE_QUIZ: &str = r#"[evaluation]
id = "example-quiz"
title = "Example quiz"
description = "A short auto-graded quiz to get started"
kind = "quiz"
passing_score = 3
time_limit_minutes = 10

[[questions]]
id = "q1"
type = "multiple-choice"
prompt = "Which keyword declares a variable binding in Rust?"
points = 2
options = ["var", "let", "val"]
answer = "let"

[[questions]]
id = "q2"
type = "true-false"
prompt = "Rust checks borrows at compile time."
points = 3
answer = "true"
"#;

const EXAMPLE_ESSAY: &str = r#"[evaluation]
id = "example-essay"
title = "Example essay"
description = "One objective question and one essay for manual review"
kind = "assignment"
passing_score = 6
retake_policy = "forbidden"

[[questions]]
id = "q1"
type = "true-false"
prompt = "Ownership prevents data races."
points = 2
answer = "true"

[[questions]]
id = "q2"
type = "essay"
prompt = "Explain the difference between a move and a copy."
points = 8
"#;
