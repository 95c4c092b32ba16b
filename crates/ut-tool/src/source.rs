use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::{TestCase, UtToolError, TESTCASE_SCHEMA_V1};

pub fn read_test_case(case_path: &Path) -> Result<TestCase, UtToolError> {
    let raw = fs::read_to_string(case_path).map_err(|source| UtToolError::ReadFile {
        path: case_path.to_path_buf(),
        source,
    })?;
    let parsed: TestCase = serde_json::from_str(&raw).map_err(|source| UtToolError::ParseCase {
        path: case_path.to_path_buf(),
        source,
    })?;

    if parsed.schema_version != TESTCASE_SCHEMA_V1 {
        return Err(UtToolError::InvalidSchemaVersion {
            expected: TESTCASE_SCHEMA_V1.to_string(),
            found: parsed.schema_version,
        });
    }

    Ok(parsed)
}

/// Every `*.json` testcase under `dir`, sorted by path.
pub fn read_cases_from_dir(dir: &Path) -> Result<Vec<(PathBuf, TestCase)>, UtToolError> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .follow_links(false)
        .into_iter()
        .filter_map(Result::ok)
    {
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.path().extension().is_some_and(|ext| ext == "json") {
            paths.push(entry.into_path());
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(UtToolError::CasesEmpty {
            path: dir.to_path_buf(),
        });
    }

    paths
        .into_iter()
        .map(|path| {
            let case = read_test_case(&path)?;
            Ok((path, case))
        })
        .collect()
}
