mod case;
mod runner;
mod source;

pub use case::{CaseStep, ScenarioCase, TestCase, DEFAULT_CASE_MAX_FRAMES, TESTCASE_SCHEMA_V1};
pub use runner::{assert_case, run_case, RunReport};
pub use source::{read_cases_from_dir, read_test_case};

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum UtToolError {
    #[error("Failed to read file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse testcase {path}: {source}")]
    ParseCase {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Invalid testcase schema version \"{found}\", expected \"{expected}\".")]
    InvalidSchemaVersion { expected: String, found: String },
    #[error("No .json testcases under {path}.")]
    CasesEmpty { path: PathBuf },
    #[error("Engine error: {0}")]
    Engine(#[from] ut_core::UiTestError),
    #[error("Scenario {scenario} step {step_index}: unknown key \"{key}\".")]
    UnknownKey {
        scenario: String,
        step_index: usize,
        key: String,
    },
    #[error("No verdict recorded for expected scenario {id}.")]
    MissingVerdict { id: String },
    #[error("Verdict mismatch for {id}. expected={expected} actual={actual}")]
    VerdictMismatch {
        id: String,
        expected: String,
        actual: String,
    },
    #[error("Scenario {id} finished with {actual} but has no expectation.")]
    UnexpectedVerdict { id: String, actual: String },
}
