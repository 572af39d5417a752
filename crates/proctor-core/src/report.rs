//! Result reports: JSON persistence and markdown rendering.

use std::path::Path;

use anyhow::{Context, Result};

use crate::grading::{GradeResult, Verdict};

impl GradeResult {
    /// Save the result as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize result")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write result to {}", path.display()))?;
        Ok(())
    }

    /// Load a result from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read result from {}", path.display()))?;
        let result: GradeResult =
            serde_json::from_str(&content).context("failed to parse result JSON")?;
        Ok(result)
    }

    /// Format the result as markdown.
    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!(
            "## Result for {} ({})\n\n",
            self.evaluation_id, self.taker_id
        ));
        md.push_str(&format!(
            "**Score:** {}/{} ({:.1}%), {}{}\n\n",
            self.score,
            self.max_score,
            self.percentage,
            if self.passed { "passed" } else { "not passed" },
            if self.provisional { " (provisional)" } else { "" }
        ));

        md.push_str("| Question | Type | Points | Verdict | Feedback |\n");
        md.push_str("|----------|------|--------|---------|----------|\n");
        for q in &self.questions {
            let points = match q.awarded {
                Some(awarded) => format!("{awarded}/{}", q.max_points),
                None => format!("-/{}", q.max_points),
            };
            let verdict = match q.verdict {
                Verdict::Correct => "correct",
                Verdict::Incorrect => "incorrect",
                Verdict::Pending => "pending review",
                Verdict::Reviewed => "reviewed",
            };
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} |\n",
                q.question_id,
                q.kind,
                points,
                verdict,
                q.feedback.as_deref().unwrap_or("")
            ));
        }

        let pending = self.pending_questions();
        if !pending.is_empty() {
            md.push_str(&format!("\nAwaiting review: {}\n", pending.join(", ")));
        }

        md
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::QuestionResult;
    use uuid::Uuid;

    fn make_result() -> GradeResult {
        GradeResult {
            session_id: Uuid::nil(),
            evaluation_id: "rust-basics".into(),
            taker_id: "alice".into(),
            questions: vec![
                QuestionResult {
                    question_id: "q1".into(),
                    kind: "multiple-choice".into(),
                    max_points: 2,
                    awarded: Some(2),
                    verdict: Verdict::Correct,
                    feedback: None,
                },
                QuestionResult {
                    question_id: "q3".into(),
                    kind: "essay".into(),
                    max_points: 5,
                    awarded: None,
                    verdict: Verdict::Pending,
                    feedback: None,
                },
            ],
            score: 2,
            max_score: 2,
            percentage: 100.0,
            passing_score: 3,
            passed: false,
            provisional: true,
            revision: 0,
        }
    }

    #[test]
    fn json_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("result.json");
        let result = make_result();
        result.save_json(&path).unwrap();
        assert_eq!(GradeResult::load_json(&path).unwrap(), result);
    }

    #[test]
    fn load_missing_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let err = GradeResult::load_json(&dir.path().join("none.json")).unwrap_err();
        assert!(err.to_string().contains("failed to read result"));
    }

    #[test]
    fn markdown_output() {
        let md = make_result().to_markdown();
        assert!(md.contains("**Score:** 2/2 (100.0%)"));
        assert!(md.contains("(provisional)"));
        assert!(md.contains("| q3 | essay | -/5 | pending review |  |"));
        assert!(md.contains("Awaiting review: q3"));
    }
}
