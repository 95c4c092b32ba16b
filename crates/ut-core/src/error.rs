use thiserror::Error;

use crate::types::ScenarioId;

/// Errors surfaced to the host. Failures that happen inside a running
/// scenario are recorded as a [`crate::Verdict`] instead and never reach
/// the host through this type.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum UiTestError {
    #[error("Scenario \"{id}\" is already registered.")]
    DuplicateScenario { id: ScenarioId },
    #[error("Invalid scenario id \"{id}\": {message}")]
    InvalidScenarioId { id: String, message: String },
    #[error("Invalid config value for {field}: {message}")]
    InvalidConfig { field: String, message: String },
    #[error("Invalid element path \"{path}\": {message}")]
    InvalidPath { path: String, message: String },
    #[error(
        "Element ref resolved at frame {resolved_frame} cannot be used at frame {current_frame}."
    )]
    StaleElementRef {
        resolved_frame: u64,
        current_frame: u64,
    },
    #[error("Engine has not been started.")]
    EngineNotStarted,
    #[error("Engine is already started; configuration is frozen.")]
    EngineAlreadyStarted,
    #[error("Engine has been shut down.")]
    EngineShutDown,
}

impl UiTestError {
    pub fn invalid_config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::DuplicateScenario { .. } => "DUPLICATE_SCENARIO",
            Self::InvalidScenarioId { .. } => "INVALID_SCENARIO_ID",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::InvalidPath { .. } => "INVALID_PATH",
            Self::StaleElementRef { .. } => "STALE_ELEMENT_REF",
            Self::EngineNotStarted => "ENGINE_NOT_STARTED",
            Self::EngineAlreadyStarted => "ENGINE_ALREADY_STARTED",
            Self::EngineShutDown => "ENGINE_SHUT_DOWN",
        }
    }
}
