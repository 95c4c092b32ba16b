use std::fmt::Display;

use thiserror::Error;
use ut_core::UiTestError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}: {message}")]
pub(crate) struct CliError {
    pub(crate) code: String,
    pub(crate) message: String,
}

impl CliError {
    pub(crate) fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<UiTestError> for CliError {
    fn from(error: UiTestError) -> Self {
        Self::new(error.code(), error.to_string())
    }
}

fn map_error(code: &'static str, error: impl Display) -> CliError {
    CliError::new(code, error.to_string())
}

pub(crate) fn emit_error(error: CliError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!(
        "ERROR_MSG_JSON:{}",
        serde_json::to_string(&error.message).unwrap_or_else(|_| "\"Unknown error\"".to_string())
    );
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> CliError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> CliError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: walkdir::Error) -> CliError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_report_write(error: std::io::Error) -> CliError {
    map_error("CLI_REPORT_WRITE", error)
}

pub(crate) fn map_cli_report_encode(error: serde_json::Error) -> CliError {
    map_error("CLI_REPORT_ENCODE", error)
}

pub(crate) fn map_cli_log_open(error: std::io::Error) -> CliError {
    map_error("CLI_LOG_OPEN", error)
}

#[cfg(test)]
mod error_map_tests {
    use super::*;

    #[test]
    fn emit_error_returns_non_zero_exit_code() {
        let code = emit_error(CliError::new("ERR", "failed"));
        assert_eq!(code, 1);
    }

    #[test]
    fn engine_errors_keep_their_codes() {
        let error = CliError::from(UiTestError::invalid_config("run_speed", "nope"));
        assert_eq!(error.code, "INVALID_CONFIG");
        assert!(error.message.contains("run_speed"));
    }

    #[test]
    fn mapping_helpers_keep_error_codes() {
        assert_eq!(map_tui_io(std::io::Error::other("io")).code, "TUI_IO");
        assert_eq!(
            map_cli_source_path(std::io::Error::other("path")).code,
            "CLI_SOURCE_PATH"
        );
        assert_eq!(
            map_cli_report_write(std::io::Error::other("write")).code,
            "CLI_REPORT_WRITE"
        );
        assert_eq!(
            map_cli_log_open(std::io::Error::other("open")).code,
            "CLI_LOG_OPEN"
        );

        let invalid = serde_json::from_str::<serde_json::Value>("{").expect_err("invalid json");
        assert_eq!(map_cli_report_encode(invalid).code, "CLI_REPORT_ENCODE");

        let missing = std::env::temp_dir().join("ut-cli-definitely-missing-dir");
        let scan_error = walkdir::WalkDir::new(&missing)
            .into_iter()
            .find_map(Result::err)
            .expect("walking a missing dir should fail");
        assert_eq!(map_cli_source_scan(scan_error).code, "CLI_SOURCE_SCAN");
    }
}
