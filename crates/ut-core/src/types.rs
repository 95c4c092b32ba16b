use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::UiTestError;

pub const GROUP_FILTER_ALL: &str = "all";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScenarioId {
    pub group: String,
    pub name: String,
}

impl ScenarioId {
    pub fn new(group: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            name: name.into(),
        }
    }

    /// Checks the id is usable as a registry key: non-empty parts and a
    /// group free of `/` so the `group/name` form stays unambiguous.
    pub fn validate(&self) -> Result<(), UiTestError> {
        let reason = if self.group.trim().is_empty() {
            Some("group must not be empty")
        } else if self.group.contains('/') {
            Some("group must not contain '/'")
        } else if self.name.trim().is_empty() {
            Some("name must not be empty")
        } else {
            None
        };
        match reason {
            Some(message) => Err(UiTestError::InvalidScenarioId {
                id: self.to_string(),
                message: message.to_string(),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group, self.name)
    }
}

impl FromStr for ScenarioId {
    type Err = UiTestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let Some((group, name)) = raw.split_once('/') else {
            return Err(UiTestError::InvalidScenarioId {
                id: raw.to_string(),
                message: "expected \"group/name\"".to_string(),
            });
        };
        let id = ScenarioId::new(group, name);
        id.validate()?;
        Ok(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FailureReason {
    ElementNotFound { path: String },
    NotInteractive { path: String },
    InvalidPath { path: String, message: String },
    Assertion { message: String },
    Timeout { frames: u64 },
    Crashed { message: String },
}

impl FailureReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::ElementNotFound { .. } => "ELEMENT_NOT_FOUND",
            Self::NotInteractive { .. } => "NOT_INTERACTIVE",
            Self::InvalidPath { .. } => "INVALID_PATH",
            Self::Assertion { .. } => "ASSERTION",
            Self::Timeout { .. } => "TIMEOUT",
            Self::Crashed { .. } => "CRASHED",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ElementNotFound { path } => write!(f, "no element matches \"{}\"", path),
            Self::NotInteractive { path } => {
                write!(f, "element \"{}\" is not interactive", path)
            }
            Self::InvalidPath { path, message } => {
                write!(f, "invalid element path \"{}\": {}", path, message)
            }
            Self::Assertion { message } => write!(f, "assertion failed: {}", message),
            Self::Timeout { frames } => write!(f, "timed out after {} frames", frames),
            Self::Crashed { message } => write!(f, "step function crashed: {}", message),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SkipReason {
    Cancelled,
    StoppedOnError,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cancelled => "CANCELLED",
            Self::StoppedOnError => "STOPPED_ON_ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "camelCase")]
pub enum Verdict {
    Passed,
    Failed(FailureReason),
    Skipped(SkipReason),
}

impl Verdict {
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// `PASSED`, `FAILED:<reason code>` or `SKIPPED:<reason code>`.
    pub fn code(&self) -> String {
        match self {
            Self::Passed => "PASSED".to_string(),
            Self::Failed(reason) => format!("FAILED:{}", reason.code()),
            Self::Skipped(reason) => format!("SKIPPED:{}", reason.code()),
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => f.write_str("passed"),
            Self::Failed(reason) => write!(f, "failed ({})", reason),
            Self::Skipped(SkipReason::Cancelled) => f.write_str("skipped (cancelled)"),
            Self::Skipped(SkipReason::StoppedOnError) => {
                f.write_str("skipped (stopped after an earlier failure)")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioStatus {
    Queued,
    Running,
    Finished(Verdict),
}

impl ScenarioStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Finished(_))
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "camelCase")]
pub enum Verbosity {
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl Verbosity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
            Self::Debug => "debug",
        }
    }
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Verbosity {
    type Err = UiTestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warning" | "warn" => Ok(Self::Warning),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            _ => Err(UiTestError::invalid_config(
                "verbosity",
                format!("unknown verbosity \"{}\"", raw),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum RunSpeed {
    #[default]
    Fast,
    Cinematic,
}

impl RunSpeed {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Fast => "fast",
            Self::Cinematic => "cinematic",
        }
    }
}

impl fmt::Display for RunSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RunSpeed {
    type Err = UiTestError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "fast" => Ok(Self::Fast),
            "cinematic" => Ok(Self::Cinematic),
            _ => Err(UiTestError::invalid_config(
                "run_speed",
                format!("unknown run speed \"{}\"", raw),
            )),
        }
    }
}
