use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use console::style;
use serde::{Deserialize, Serialize};

/// One evaluation question with its ground truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundTruthSample {
    pub question: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_tool: Option<String>,
}

pub fn load_samples(path: &Path) -> Result<Vec<GroundTruthSample>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading ground truth from {}", path.display()))?;
    serde_json::from_str(&raw).context("ground truth file is not a JSON array of samples")
}

/// Stage an evaluation dataset: truncate the ground truth to the first
/// `limit` samples, echo the first one, and write the staged file.
pub fn stage(input: &Path, output: &Path, limit: usize) -> Result<()> {
    let samples = load_samples(input)?;
    let total = samples.len();
    let staged: Vec<GroundTruthSample> = samples.into_iter().take(limit).collect();

    println!(
        "Loaded ground truth data: {} samples, staging {}",
        total,
        staged.len()
    );

    if let Some(first) = staged.first() {
        println!("\n{}", style("Sample data (first item):").bold());
        println!("{}", serde_json::to_string_pretty(first)?);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    fs::write(output, serde_json::to_string_pretty(&staged)?)
        .with_context(|| format!("writing staged dataset to {}", output.display()))?;

    println!("\nDataset saved to {}", output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(question: &str) -> GroundTruthSample {
        GroundTruthSample {
            question: question.to_string(),
            answer: Some("an answer".to_string()),
            expected_tool: Some("rag".to_string()),
        }
    }

    #[test]
    fn test_stage_truncates_and_round_trips() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("ground_truth.json");
        let output = dir.path().join("staged/test_dataset.json");

        let samples: Vec<GroundTruthSample> =
            (0..5).map(|i| sample(&format!("question {}", i))).collect();
        fs::write(&input, serde_json::to_string(&samples)?)?;

        stage(&input, &output, 3)?;

        let staged = load_samples(&output)?;
        assert_eq!(staged.len(), 3);
        assert_eq!(staged[0].question, "question 0");
        assert_eq!(staged[2].question, "question 2");
        Ok(())
    }

    #[test]
    fn test_load_samples_tolerates_missing_optionals() -> Result<()> {
        let dir = tempdir()?;
        let input = dir.path().join("minimal.json");
        fs::write(&input, r#"[{"question": "only a question"}]"#)?;

        let samples = load_samples(&input)?;
        assert_eq!(samples[0].question, "only a question");
        assert!(samples[0].answer.is_none());
        assert!(samples[0].expected_tool.is_none());
        Ok(())
    }
}
