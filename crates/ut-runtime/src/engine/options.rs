use serde::{Deserialize, Serialize};
use ut_core::{RunSpeed, UiTestError, Verbosity};

pub const DEFAULT_ELEMENT_RETRY_FRAMES: u32 = 60;
pub const DEFAULT_SCENARIO_TIMEOUT_FRAMES: u64 = 600;
pub const DEFAULT_CINEMATIC_EVENT_DELAY_FRAMES: u64 = 6;
pub const DEFAULT_CINEMATIC_MOUSE_STEPS: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineOptions {
    pub verbosity: Verbosity,
    pub verbosity_on_error: Verbosity,
    pub run_speed: RunSpeed,
    pub crash_handler_installed: bool,
    pub element_retry_frames: u32,
    pub scenario_timeout_frames: u64,
    pub max_concurrent_scenarios: usize,
    pub stop_on_error: bool,
    pub cinematic_event_delay_frames: u64,
    pub cinematic_mouse_steps: u32,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            verbosity: Verbosity::Info,
            verbosity_on_error: Verbosity::Debug,
            run_speed: RunSpeed::Fast,
            crash_handler_installed: true,
            element_retry_frames: DEFAULT_ELEMENT_RETRY_FRAMES,
            scenario_timeout_frames: DEFAULT_SCENARIO_TIMEOUT_FRAMES,
            max_concurrent_scenarios: 1,
            stop_on_error: false,
            cinematic_event_delay_frames: DEFAULT_CINEMATIC_EVENT_DELAY_FRAMES,
            cinematic_mouse_steps: DEFAULT_CINEMATIC_MOUSE_STEPS,
        }
    }
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), UiTestError> {
        if self.verbosity_on_error < self.verbosity {
            return Err(UiTestError::invalid_config(
                "verbosity_on_error",
                format!(
                    "on-error verbosity \"{}\" is quieter than normal verbosity \"{}\"",
                    self.verbosity_on_error, self.verbosity
                ),
            ));
        }
        if self.element_retry_frames == 0 {
            return Err(UiTestError::invalid_config(
                "element_retry_frames",
                "must be at least 1",
            ));
        }
        if self.scenario_timeout_frames == 0 {
            return Err(UiTestError::invalid_config(
                "scenario_timeout_frames",
                "must be at least 1",
            ));
        }
        if self.max_concurrent_scenarios == 0 {
            return Err(UiTestError::invalid_config(
                "max_concurrent_scenarios",
                "must be at least 1",
            ));
        }
        if self.cinematic_event_delay_frames == 0 {
            return Err(UiTestError::invalid_config(
                "cinematic_event_delay_frames",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    pub fn from_raw(raw: &RawEngineOptions) -> Result<Self, UiTestError> {
        let defaults = Self::default();
        let options = Self {
            verbosity: parse_or(raw.verbosity.as_deref(), defaults.verbosity)?,
            verbosity_on_error: parse_or(
                raw.verbosity_on_error.as_deref(),
                defaults.verbosity_on_error,
            )
            .map_err(|_| rename_field(raw.verbosity_on_error.as_deref(), "verbosity_on_error"))?,
            run_speed: parse_or(raw.run_speed.as_deref(), defaults.run_speed)?,
            crash_handler_installed: raw
                .crash_handler_installed
                .unwrap_or(defaults.crash_handler_installed),
            element_retry_frames: raw
                .element_retry_frames
                .unwrap_or(defaults.element_retry_frames),
            scenario_timeout_frames: raw
                .scenario_timeout_frames
                .unwrap_or(defaults.scenario_timeout_frames),
            max_concurrent_scenarios: raw
                .max_concurrent_scenarios
                .unwrap_or(defaults.max_concurrent_scenarios),
            stop_on_error: raw.stop_on_error.unwrap_or(defaults.stop_on_error),
            cinematic_event_delay_frames: raw
                .cinematic_event_delay_frames
                .unwrap_or(defaults.cinematic_event_delay_frames),
            cinematic_mouse_steps: raw
                .cinematic_mouse_steps
                .unwrap_or(defaults.cinematic_mouse_steps),
        };
        options.validate()?;
        Ok(options)
    }
}

fn parse_or<T>(raw: Option<&str>, default: T) -> Result<T, UiTestError>
where
    T: std::str::FromStr<Err = UiTestError>,
{
    raw.map_or(Ok(default), |value| value.parse())
}

fn rename_field(raw: Option<&str>, field: &str) -> UiTestError {
    UiTestError::invalid_config(
        field,
        format!("unknown verbosity \"{}\"", raw.unwrap_or_default()),
    )
}

/// Engine options as they appear in config files: enums are plain strings
/// and every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RawEngineOptions {
    pub verbosity: Option<String>,
    pub verbosity_on_error: Option<String>,
    pub run_speed: Option<String>,
    pub crash_handler_installed: Option<bool>,
    pub element_retry_frames: Option<u32>,
    pub scenario_timeout_frames: Option<u64>,
    pub max_concurrent_scenarios: Option<usize>,
    pub stop_on_error: Option<bool>,
    pub cinematic_event_delay_frames: Option<u64>,
    pub cinematic_mouse_steps: Option<u32>,
}
