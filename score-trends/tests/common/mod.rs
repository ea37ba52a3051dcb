#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]
use std::io::Write;

use clap::Parser;
use score_trends::{Args, run_report};
use serde_json::{Value, json};
use tempfile::NamedTempFile;

/// Two complete runs of the same test set plus one run that is still loading.
///
/// | test | issue | tags          | r1 (granite)        | r2 (llama) |
/// |------|-------|---------------|---------------------|------------|
/// | t1   | i1    | math          | 1.0                 | 1.0        |
/// | t2   | i1    | math          | 0.0                 | 1.0        |
/// | t3   | i1    | math          | 0.5                 | 0.0        |
/// | t4   | i2    | math, dates   | 0.0, human 1.0      | 0.0        |
/// | t5   | i3    | (none)        | 1.0                 | 0.0        |
/// | t6   | -     | -             | 0.0                 | -          |
pub fn snapshot_json() -> Value {
    json!({
        "issues": [
            {"_id": "i1", "title": "Arithmetic", "tags": ["math"], "test_ids": ["t1", "t2", "t3"]},
            {"_id": "i2", "title": "Date math", "tags": ["math", "dates"], "test_ids": ["t4"]},
            {"_id": "i3", "title": "Formatting", "tags": [], "test_ids": ["t5"]}
        ],
        "reports": [
            {
                "report": {
                    "_id": "65f0c1",
                    "run_id": "r1",
                    "model_id": "granite",
                    "judge_model_ids": ["judge-a"],
                    "created_at": "2025-03-01T10:00:00Z",
                    "status": "done"
                },
                "results": [
                    scored("t1", 1.0),
                    scored("t2", 0.0),
                    scored("t3", 0.5),
                    {
                        "test_id": "t4",
                        "judge_results": [
                            judge(0.0),
                            {
                                "model_id": "qa@example.com",
                                "test_score": 1.0,
                                "test_justification": "acceptable",
                                "type": "human"
                            }
                        ]
                    },
                    scored("t5", 1.0),
                    scored("t6", 0.0)
                ]
            },
            {
                "report": {
                    "run_id": "r2",
                    "model_id": "llama",
                    "judge_model_id": "judge-a",
                    "status": "done"
                },
                "results": [
                    scored("t1", 1.0),
                    scored("t2", 1.0),
                    scored("t3", 0.0),
                    scored("t4", 0.0),
                    scored("t5", 0.0)
                ]
            },
            {
                "report": {"run_id": "r3", "model_id": "granite", "status": "pending"},
                "results": null
            }
        ]
    })
}

fn judge(score: f64) -> Value {
    json!({"model_id": "judge-a", "test_score": score, "test_justification": "graded"})
}

fn scored(test_id: &str, score: f64) -> Value {
    json!({"test_id": test_id, "judge_results": [judge(score)]})
}

pub fn write_temp_file(contents: &str, suffix: &str) -> NamedTempFile {
    let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

pub fn write_snapshot() -> NamedTempFile {
    write_temp_file(&snapshot_json().to_string(), ".json")
}

/// Runs the report against `snapshot` with extra command line flags and returns stdout.
pub fn run_with(snapshot: &NamedTempFile, flags: &[&str]) -> anyhow::Result<String> {
    let snapshot_path = snapshot.path().to_str().unwrap();
    let argv = ["score-trends", "--snapshot", snapshot_path]
        .into_iter()
        .chain(flags.iter().copied());
    let args = Args::parse_from(argv);
    let mut output = Vec::new();
    run_report(args, &mut output)?;
    Ok(String::from_utf8(output).unwrap())
}

pub fn jsonl_rows(output: &str) -> Vec<Value> {
    output
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
