//! Dataset loading for knowledge-base ingestion

use std::path::Path;

use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::Result;
use crate::models::ProblemRecord;
use crate::models::RecordStep;

/// Raw dataset entry as it appears in the JSON file. Missing fields get
/// sensible defaults so partially-annotated datasets still load.
#[derive(Debug, Deserialize)]
struct DatasetEntry {
    #[serde(default)]
    id: Option<String>,
    question: String,
    #[serde(default = "default_topic")]
    topic: String,
    #[serde(default = "default_difficulty")]
    difficulty: String,
    #[serde(default)]
    solution_steps: Vec<String>,
    #[serde(default)]
    full_solution: String,
    #[serde(default)]
    final_answer: String,
    #[serde(default)]
    keywords: Vec<String>,
}

fn default_topic() -> String {
    "mathematics".to_string()
}

fn default_difficulty() -> String {
    "unknown".to_string()
}

/// Load problem records from a JSON dataset file (an array of entries).
pub fn load_problems<P: AsRef<Path>>(path: P, limit: usize) -> Result<Vec<ProblemRecord>> {
    let content = std::fs::read_to_string(&path)?;
    let entries: Vec<DatasetEntry> = serde_json::from_str(&content)?;

    let records: Vec<ProblemRecord> = entries
        .into_iter()
        .take(limit)
        .map(|entry| {
            let steps = entry
                .solution_steps
                .into_iter()
                .enumerate()
                .map(|(index, text)| RecordStep {
                    index: index + 1,
                    text,
                })
                .collect();

            ProblemRecord {
                id: entry.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
                question: entry.question,
                topic: entry.topic.to_lowercase(),
                difficulty: entry.difficulty,
                steps,
                full_solution: entry.full_solution,
                final_answer: entry.final_answer,
                keywords: entry.keywords,
            }
        })
        .collect();

    info!(
        "Loaded {} problems from {}",
        records.len(),
        path.as_ref().display()
    );
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_problems_applies_defaults_and_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"question": "What is 2 + 2?", "final_answer": "4"}},
                {{"question": "Expand (x+1)(x+2)", "topic": "Algebra",
                  "solution_steps": ["Multiply terms", "Combine like terms"],
                  "final_answer": "x^2 + 3x + 2"}},
                {{"question": "dropped by limit"}}
            ]"#
        )
        .unwrap();

        let records = load_problems(file.path(), 2).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].topic, "mathematics");
        assert_eq!(records[1].topic, "algebra");
        assert_eq!(records[1].steps.len(), 2);
        assert_eq!(records[1].steps[0].index, 1);
        assert!(!records[0].id.is_empty());
    }
}
