use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use ut_core::{InputEvent, InputQueue, Rect, UiTestError, UiTree, Verdict, GROUP_FILTER_ALL};
use ut_runtime::{
    Engine, EngineOptions, HostFrame, HostInfo, RawEngineOptions, RenderContext, RunSummary,
};

pub const RESULTS_REPORT_SCHEMA: &str = "ut-results.v1";

#[derive(Debug, Clone)]
pub struct SetupTestEngineOptions {
    pub host: HostInfo,
    pub render: RenderContext,
    pub options: EngineOptions,
}

impl SetupTestEngineOptions {
    pub fn new(host_name: &str, viewport: Rect, options: EngineOptions) -> Self {
        Self {
            host: HostInfo::new(host_name),
            render: RenderContext { frame: 0, viewport },
            options,
        }
    }
}

pub fn parse_raw_options(source: &str) -> Result<RawEngineOptions, UiTestError> {
    toml::from_str(source)
        .map_err(|error| UiTestError::invalid_config("config", error.message().to_string()))
}

pub fn load_options_from_toml(source: &str) -> Result<EngineOptions, UiTestError> {
    EngineOptions::from_raw(&parse_raw_options(source)?)
}

pub fn load_options_from_file(path: &Path) -> Result<EngineOptions, UiTestError> {
    let source = fs::read_to_string(path).map_err(|error| {
        UiTestError::invalid_config(
            "config",
            format!("Failed to read \"{}\": {}", path.display(), error),
        )
    })?;
    load_options_from_toml(&source)
}

/// Creates, configures and starts an engine. Scenarios can be registered on
/// the returned engine before the first tick.
pub fn setup_test_engine(options: SetupTestEngineOptions) -> Result<Engine, UiTestError> {
    let mut engine = Engine::create(options.host);
    engine.configure(options.options)?;
    engine.start(options.render)?;
    Ok(engine)
}

pub fn queue_all_tests(engine: &mut Engine) -> Result<usize, UiTestError> {
    engine.enqueue(GROUP_FILTER_ALL)
}

pub trait HeadlessHost {
    fn frame_tree(&mut self, frame: u64) -> UiTree;
    fn handle_input(&mut self, frame: u64, events: Vec<InputEvent>);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveOutcome {
    pub frames: u64,
    pub last_frame: u64,
    pub exhausted: bool,
}

/// Ticks `engine` against `host` from `first_frame` until nothing is queued
/// or running. When `max_frames` pass first, the engine is shut down so
/// every scenario still ends with a verdict.
pub fn run_until_idle(
    engine: &mut Engine,
    host: &mut dyn HeadlessHost,
    first_frame: u64,
    max_frames: u64,
) -> Result<DriveOutcome, UiTestError> {
    let mut input = InputQueue::new();
    let mut frames = 0u64;
    let mut frame = first_frame;
    while !engine.is_idle() {
        if frames >= max_frames {
            let cancelled = engine.shutdown();
            tracing::warn!(frames, cancelled, "frame budget exhausted");
            return Ok(DriveOutcome {
                frames,
                last_frame: frame.saturating_sub(1),
                exhausted: true,
            });
        }
        let tree = host.frame_tree(frame);
        engine.tick(&mut HostFrame::new(frame, &tree, &mut input))?;
        host.handle_input(frame, input.drain());
        frames += 1;
        frame += 1;
    }
    Ok(DriveOutcome {
        frames,
        last_frame: frame.saturating_sub(1),
        exhausted: false,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub id: String,
    pub group: String,
    pub name: String,
    pub code: String,
    pub verdict: Verdict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsReport {
    pub schema_version: String,
    pub host: String,
    pub summary: RunSummary,
    pub scenarios: Vec<ScenarioReport>,
}

impl ResultsReport {
    pub fn from_engine(engine: &Engine) -> Self {
        let results = engine.results();
        let scenarios = engine
            .scheduler()
            .finish_order()
            .iter()
            .filter_map(|id| {
                results.get(id).map(|verdict| ScenarioReport {
                    id: id.to_string(),
                    group: id.group.clone(),
                    name: id.name.clone(),
                    code: verdict.code(),
                    verdict: verdict.clone(),
                })
            })
            .collect();
        Self {
            schema_version: RESULTS_REPORT_SCHEMA.to_string(),
            host: engine.host().name.clone(),
            summary: engine.summary(),
            scenarios,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn all_passed(&self) -> bool {
        self.summary.all_passed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};
    use ut_core::{FailureReason, NodeKind, RunSpeed, UiNode, Verbosity};
    use ut_runtime::{ExecutionContext, StepResult};

    struct ButtonHost {
        appear_at: u64,
        clicks: usize,
    }

    impl HeadlessHost for ButtonHost {
        fn frame_tree(&mut self, frame: u64) -> UiTree {
            if frame < self.appear_at {
                return UiTree::empty(frame);
            }
            UiTree::new(
                frame,
                vec![UiNode::new(1, "Main", NodeKind::Window).with_children(vec![
                    UiNode::new(2, "test.txt", NodeKind::Selectable)
                        .with_rect(Rect::new(0.0, 0.0, 10.0, 10.0)),
                ])],
            )
        }

        fn handle_input(&mut self, _frame: u64, events: Vec<InputEvent>) {
            self.clicks += events
                .iter()
                .filter(|event| matches!(event, InputEvent::MouseUp { .. }))
                .count();
        }
    }

    fn click_test_file(ctx: &mut ExecutionContext<'_>) -> StepResult {
        ctx.item_click("**/test.txt")
    }

    fn engine_with_demo(options: EngineOptions) -> Engine {
        let mut engine = setup_test_engine(SetupTestEngineOptions::new(
            "api-test",
            Rect::new(0.0, 0.0, 100.0, 100.0),
            options,
        ))
        .expect("setup should pass");
        engine
            .register_scenario("demo_test", "test1", click_test_file)
            .expect("register should pass");
        engine
    }

    fn temp_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("ut-api-{}-{}", nanos, name))
    }

    #[test]
    fn load_options_from_toml_reads_partial_tables() {
        let options = load_options_from_toml(
            r#"
verbosity = "info"
verbosity_on_error = "debug"
run_speed = "cinematic"
element_retry_frames = 12
"#,
        )
        .expect("options should load");
        assert_eq!(options.verbosity, Verbosity::Info);
        assert_eq!(options.verbosity_on_error, Verbosity::Debug);
        assert_eq!(options.run_speed, RunSpeed::Cinematic);
        assert_eq!(options.element_retry_frames, 12);
        assert!(options.crash_handler_installed);
    }

    #[test]
    fn load_options_rejects_unknown_keys_and_values() {
        let error = load_options_from_toml("speed = \"fast\"").expect_err("unknown key");
        assert_eq!(error.code(), "INVALID_CONFIG");
        let error = load_options_from_toml("run_speed = \"warp\"").expect_err("unknown speed");
        assert_eq!(error.code(), "INVALID_CONFIG");
        let error = load_options_from_toml("element_retry_frames = \"x\"").expect_err("bad type");
        assert_eq!(error.code(), "INVALID_CONFIG");
    }

    #[test]
    fn load_options_from_file_reads_and_reports_missing_files() {
        let path = temp_path("engine.toml");
        fs::write(&path, "stop_on_error = true\n").expect("write should pass");
        let options = load_options_from_file(&path).expect("options should load");
        assert!(options.stop_on_error);
        fs::remove_file(&path).expect("cleanup should pass");

        let error = load_options_from_file(&path).expect_err("missing file should fail");
        assert_eq!(error.code(), "INVALID_CONFIG");
    }

    #[test]
    fn run_until_idle_passes_when_element_appears() {
        let mut engine = engine_with_demo(EngineOptions::default());
        assert_eq!(queue_all_tests(&mut engine).expect("queue should pass"), 1);

        let mut host = ButtonHost {
            appear_at: 3,
            clicks: 0,
        };
        let outcome = run_until_idle(&mut engine, &mut host, 1, 100).expect("run should pass");

        assert!(!outcome.exhausted);
        assert_eq!(host.clicks, 1);
        let report = ResultsReport::from_engine(&engine);
        assert!(report.all_passed());
        assert_eq!(report.scenarios.len(), 1);
        assert_eq!(report.scenarios[0].id, "demo_test/test1");
        assert_eq!(report.scenarios[0].code, "PASSED");
    }

    #[test]
    fn run_until_idle_reports_missing_element() {
        let mut engine = engine_with_demo(EngineOptions {
            element_retry_frames: 3,
            ..EngineOptions::default()
        });
        queue_all_tests(&mut engine).expect("queue should pass");

        let mut host = ButtonHost {
            appear_at: u64::MAX,
            clicks: 0,
        };
        let outcome = run_until_idle(&mut engine, &mut host, 1, 100).expect("run should pass");

        assert_eq!(outcome.frames, 3);
        assert_eq!(
            engine.verdict("demo_test/test1"),
            Some(&Verdict::Failed(FailureReason::ElementNotFound {
                path: "**/test.txt".to_string()
            }))
        );
        let json = ResultsReport::from_engine(&engine)
            .to_json()
            .expect("report should serialize");
        let parsed: ResultsReport = serde_json::from_str(&json).expect("report should parse");
        assert_eq!(parsed.summary.failed, 1);
        assert_eq!(parsed.scenarios[0].code, "FAILED:ELEMENT_NOT_FOUND");
        assert_eq!(parsed.schema_version, RESULTS_REPORT_SCHEMA);
    }

    #[test]
    fn run_until_idle_shuts_down_when_budget_runs_out() {
        let mut engine = engine_with_demo(EngineOptions::default());
        queue_all_tests(&mut engine).expect("queue should pass");

        let mut host = ButtonHost {
            appear_at: u64::MAX,
            clicks: 0,
        };
        let outcome = run_until_idle(&mut engine, &mut host, 1, 4).expect("run should pass");

        assert!(outcome.exhausted);
        assert_eq!(outcome.frames, 4);
        assert!(engine.is_shut_down());
        assert_eq!(
            engine.verdict("demo_test/test1").map(Verdict::code),
            Some("SKIPPED:CANCELLED".to_string())
        );
    }
}
