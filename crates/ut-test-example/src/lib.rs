use std::path::PathBuf;

use walkdir::WalkDir;

pub fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

pub fn fixtures_root() -> PathBuf {
    workspace_root().join("fixtures")
}

/// A directory the demo host can list, e.g. `demo`.
pub fn fixture_dir(name: &str) -> PathBuf {
    fixtures_root().join(name)
}

pub fn cases_root() -> PathBuf {
    fixtures_root().join("cases")
}

pub fn case_path(name: &str) -> PathBuf {
    cases_root().join(format!("{}.json", name))
}

/// Every `*.json` case under `fixtures/cases`, sorted.
pub fn case_paths() -> Vec<PathBuf> {
    let mut paths = WalkDir::new(cases_root())
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .collect::<Vec<_>>();
    paths.sort();
    paths
}
