//! TOML evaluation parser.
//!
//! Loads evaluation definitions from TOML files and directories, and checks
//! them for authoring mistakes that are legal but probably unintended.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{
    AvailabilityWindow, Evaluation, EvaluationKind, Question, QuestionKind, RetakePolicy,
};

/// Intermediate TOML structure for evaluation files.
#[derive(Debug, Deserialize)]
struct TomlEvaluationFile {
    evaluation: TomlEvaluationHeader,
    #[serde(default)]
    questions: Vec<TomlQuestion>,
}

#[derive(Debug, Deserialize)]
struct TomlEvaluationHeader {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_kind")]
    kind: String,
    /// Defaults to the sum of question points.
    #[serde(default)]
    max_score: Option<u32>,
    passing_score: u32,
    #[serde(default)]
    time_limit_minutes: Option<u32>,
    #[serde(default = "default_retake_policy")]
    retake_policy: String,
    #[serde(default = "default_true")]
    published: bool,
    #[serde(default)]
    opens_at: Option<String>,
    #[serde(default)]
    closes_at: Option<String>,
}

fn default_kind() -> String {
    "quiz".to_string()
}

fn default_retake_policy() -> String {
    "allowed".to_string()
}

fn default_true() -> bool {
    true
}

fn default_points() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct TomlQuestion {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    prompt: String,
    #[serde(default = "default_points")]
    points: u32,
    #[serde(default)]
    options: Vec<String>,
    /// Correct option text, `true`/`false`, or a reference answer.
    #[serde(default)]
    answer: Option<String>,
}

/// Parse a single TOML file into an `Evaluation`.
pub fn parse_evaluation(path: &Path) -> Result<Evaluation> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read evaluation file: {}", path.display()))?;

    parse_evaluation_str(&content, path)
}

/// Parse a TOML string into an `Evaluation`.
pub fn parse_evaluation_str(content: &str, source_path: &Path) -> Result<Evaluation> {
    let parsed: TomlEvaluationFile = toml::from_str(content)
        .with_context(|| format!("failed to parse TOML: {}", source_path.display()))?;
    let header = parsed.evaluation;

    let kind: EvaluationKind = header
        .kind
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;
    let retake_policy: RetakePolicy = header
        .retake_policy
        .parse()
        .map_err(|e: String| anyhow::anyhow!("{}", e))?;

    let questions = parsed
        .questions
        .into_iter()
        .map(convert_question)
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("invalid question in {}", source_path.display()))?;

    let window = AvailabilityWindow {
        opens_at: header
            .opens_at
            .as_deref()
            .map(parse_instant)
            .transpose()
            .context("invalid opens_at")?,
        closes_at: header
            .closes_at
            .as_deref()
            .map(parse_instant)
            .transpose()
            .context("invalid closes_at")?,
    };

    let max_score = header
        .max_score
        .unwrap_or_else(|| questions.iter().map(|q| q.points).sum());

    Ok(Evaluation {
        id: header.id,
        title: header.title,
        description: header.description,
        kind,
        questions,
        max_score,
        passing_score: header.passing_score,
        time_limit_minutes: header.time_limit_minutes,
        retake_policy,
        published: header.published,
        window,
    })
}

fn parse_instant(value: &str) -> Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_rfc3339(value)
        .with_context(|| format!("not an RFC 3339 timestamp: {value}"))?;
    Ok(parsed.with_timezone(&Utc))
}

fn convert_question(q: TomlQuestion) -> Result<Question> {
    let kind = match q.kind.to_lowercase().replace('_', "-").as_str() {
        "multiple-choice" | "mc" => {
            let answer = q
                .answer
                .with_context(|| format!("question '{}' has no answer", q.id))?;
            let correct = q
                .options
                .iter()
                .position(|o| o == &answer)
                .with_context(|| {
                    format!("question '{}': answer '{answer}' is not one of the options", q.id)
                })?;
            QuestionKind::MultipleChoice {
                options: q.options,
                correct,
            }
        }
        "true-false" | "tf" => {
            let answer = q
                .answer
                .with_context(|| format!("question '{}' has no answer", q.id))?;
            let correct = answer
                .trim()
                .to_lowercase()
                .parse::<bool>()
                .with_context(|| format!("question '{}': answer must be true or false", q.id))?;
            QuestionKind::TrueFalse { correct }
        }
        "short-answer" => QuestionKind::ShortAnswer { reference: q.answer },
        "essay" => QuestionKind::Essay,
        other => anyhow::bail!("question '{}': unknown question type '{other}'", q.id),
    };

    Ok(Question {
        id: q.id,
        prompt: q.prompt,
        kind,
        points: q.points,
    })
}

/// Recursively load all `.toml` evaluation files from a directory.
pub fn load_evaluation_directory(dir: &Path) -> Result<Vec<Evaluation>> {
    let mut evaluations = Vec::new();

    if !dir.is_dir() {
        anyhow::bail!("not a directory: {}", dir.display());
    }

    for entry in std::fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        let path = entry.path();

        if path.is_dir() {
            evaluations.extend(load_evaluation_directory(&path)?);
        } else if path.extension().is_some_and(|ext| ext == "toml") {
            match parse_evaluation(&path) {
                Ok(evaluation) => evaluations.push(evaluation),
                Err(e) => {
                    tracing::warn!("skipping {}: {:#}", path.display(), e);
                }
            }
        }
    }

    Ok(evaluations)
}

/// A warning from evaluation validation.
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    /// The question ID (if applicable).
    pub question_id: Option<String>,
    /// Warning message.
    pub message: String,
}

/// Check an evaluation for suspicious but legal authoring choices.
///
/// Hard invariants are enforced separately by [`Evaluation::check`].
pub fn validate_evaluation(evaluation: &Evaluation) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();

    if evaluation.questions.is_empty() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "evaluation has no questions".into(),
        });
    }

    if evaluation.kind == EvaluationKind::Exam && evaluation.time_limit_minutes.is_none() {
        warnings.push(ValidationWarning {
            question_id: None,
            message: "exam has no time limit".into(),
        });
    }

    for question in &evaluation.questions {
        let QuestionKind::MultipleChoice { options, .. } = &question.kind else {
            continue;
        };

        if options.len() < 2 {
            warnings.push(ValidationWarning {
                question_id: Some(question.id.clone()),
                message: format!("only {} option(s)", options.len()),
            });
        }

        let mut seen = HashSet::new();
        for option in options {
            if !seen.insert(option.trim().to_lowercase()) {
                warnings.push(ValidationWarning {
                    question_id: Some(question.id.clone()),
                    message: format!("duplicate option: {option}"),
                });
            }
        }
    }

    warnings
}
