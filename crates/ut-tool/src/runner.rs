use std::collections::BTreeMap;
use std::path::Path;

use ut_api::{run_until_idle, setup_test_engine, HeadlessHost, SetupTestEngineOptions};
use ut_core::{InputEvent, Key, Rect, UiTree};
use ut_runtime::{EngineOptions, ExecutionContext, StepResult};

use crate::source::read_test_case;
use crate::{CaseStep, TestCase, UtToolError};

const HOST_NAME: &str = "ut-tool";
const VIEWPORT: Rect = Rect {
    x: 0.0,
    y: 0.0,
    width: 1_000.0,
    height: 1_000.0,
};

#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// `group/name` -> verdict code.
    pub verdicts: BTreeMap<String, String>,
    pub frames: u64,
    pub exhausted: bool,
    /// Every synthetic event the engine handed to the host, in order.
    pub events: Vec<InputEvent>,
}

struct ScriptedHost<'a> {
    case: &'a TestCase,
    events: Vec<InputEvent>,
}

impl HeadlessHost for ScriptedHost<'_> {
    fn frame_tree(&mut self, frame: u64) -> UiTree {
        self.case.tree_for_frame(frame)
    }

    fn handle_input(&mut self, _frame: u64, events: Vec<InputEvent>) {
        self.events.extend(events);
    }
}

pub fn run_case(case: &TestCase) -> Result<RunReport, UtToolError> {
    validate_steps(case)?;
    let options = EngineOptions::from_raw(&case.options)?;
    let mut engine = setup_test_engine(SetupTestEngineOptions::new(HOST_NAME, VIEWPORT, options))?;

    for scenario in &case.scenarios {
        let steps = scenario.steps.clone();
        engine.register_scenario(
            &scenario.group,
            &scenario.name,
            move |ctx: &mut ExecutionContext<'_>| -> StepResult { run_steps(ctx, &steps) },
        )?;
    }
    engine.enqueue(&case.group_filter)?;

    let mut host = ScriptedHost {
        case,
        events: Vec::new(),
    };
    let outcome = run_until_idle(&mut engine, &mut host, 1, case.max_frames)?;

    let verdicts = engine
        .results()
        .iter()
        .map(|(id, verdict)| (id.to_string(), verdict.code()))
        .collect();
    Ok(RunReport {
        verdicts,
        frames: outcome.frames,
        exhausted: outcome.exhausted,
        events: host.events,
    })
}

pub fn assert_case(case_path: &Path) -> Result<(), UtToolError> {
    let case = read_test_case(case_path)?;
    let report = run_case(&case)?;

    for (id, expected) in &case.expected {
        let actual = report
            .verdicts
            .get(id)
            .ok_or_else(|| UtToolError::MissingVerdict { id: id.clone() })?;
        if actual != expected {
            return Err(UtToolError::VerdictMismatch {
                id: id.clone(),
                expected: expected.clone(),
                actual: actual.clone(),
            });
        }
    }

    if let Some((id, actual)) = report
        .verdicts
        .iter()
        .find(|(id, _)| !case.expected.contains_key(*id))
    {
        return Err(UtToolError::UnexpectedVerdict {
            id: id.clone(),
            actual: actual.clone(),
        });
    }

    Ok(())
}

fn validate_steps(case: &TestCase) -> Result<(), UtToolError> {
    for scenario in &case.scenarios {
        for (step_index, step) in scenario.steps.iter().enumerate() {
            if let CaseStep::Key { key } = step {
                if Key::from_name(key).is_none() {
                    return Err(UtToolError::UnknownKey {
                        scenario: scenario.id(),
                        step_index,
                        key: key.clone(),
                    });
                }
            }
        }
    }
    Ok(())
}

fn run_steps(ctx: &mut ExecutionContext<'_>, steps: &[CaseStep]) -> StepResult {
    for step in steps {
        match step {
            CaseStep::Click { path } => ctx.item_click(path)?,
            CaseStep::DoubleClick { path } => ctx.item_double_click(path)?,
            CaseStep::Hover { path } => ctx.item_hover(path)?,
            CaseStep::Input { path, text } => ctx.item_input(path, text)?,
            CaseStep::Navigate { path } => ctx.item_navigate(path)?,
            CaseStep::Key { key } => match Key::from_name(key) {
                Some(key) => ctx.key_press(key)?,
                None => ctx.fail(&format!("unknown key \"{}\"", key))?,
            },
            CaseStep::Exists { path, expect } => {
                let found = ctx.item_exists(path)?;
                let message = if *expect {
                    format!("\"{}\" exists", path)
                } else {
                    format!("\"{}\" does not exist", path)
                };
                ctx.check(found == *expect, &message)?;
            }
            CaseStep::Wait { path } => ctx.wait_for(path)?,
            CaseStep::Yield { frames } => ctx.yield_frames(*frames)?,
            CaseStep::SetRef { path } => ctx.set_ref(path)?,
            CaseStep::Fail { message } => ctx.fail(message)?,
            CaseStep::Panic { message } => panic!("{}", message),
        }
    }
    Ok(())
}

#[cfg(test)]
mod runner_tests {
    use super::*;

    use ut_core::{MouseButton, NodeKind, UiNode};
    use ut_runtime::RawEngineOptions;

    use crate::{ScenarioCase, TESTCASE_SCHEMA_V1};

    fn list_tree() -> UiTree {
        UiTree::new(
            0,
            vec![UiNode::new(1, "Files", NodeKind::Window)
                .with_rect(Rect::new(0.0, 0.0, 200.0, 200.0))
                .with_children(vec![
                    UiNode::new(2, "test.txt", NodeKind::Selectable)
                        .with_rect(Rect::new(0.0, 0.0, 200.0, 20.0)),
                    UiNode::new(3, "Name", NodeKind::TextInput)
                        .with_rect(Rect::new(0.0, 40.0, 200.0, 20.0)),
                    UiNode::new(4, "Caption", NodeKind::Text),
                ])],
        )
    }

    fn case_with(steps: Vec<CaseStep>, frames: Vec<UiTree>) -> TestCase {
        TestCase {
            schema_version: TESTCASE_SCHEMA_V1.to_string(),
            options: RawEngineOptions {
                element_retry_frames: Some(3),
                ..RawEngineOptions::default()
            },
            frames,
            max_frames: 100,
            group_filter: "all".to_string(),
            scenarios: vec![ScenarioCase {
                group: "case".to_string(),
                name: "one".to_string(),
                steps,
            }],
            expected: BTreeMap::new(),
        }
    }

    #[test]
    fn run_case_clicks_and_records_events() {
        let case = case_with(
            vec![CaseStep::Click {
                path: "**/test.txt".to_string(),
            }],
            vec![list_tree()],
        );
        let report = run_case(&case).expect("run should pass");

        assert_eq!(report.verdicts["case/one"], "PASSED");
        assert!(!report.exhausted);
        assert_eq!(
            report.events,
            vec![
                InputEvent::MouseMove { x: 100.0, y: 10.0 },
                InputEvent::MouseDown {
                    button: MouseButton::Left
                },
                InputEvent::MouseUp {
                    button: MouseButton::Left
                },
            ]
        );
    }

    #[test]
    fn run_case_reports_failures_by_code() {
        let cases = [
            (
                CaseStep::Click {
                    path: "**/missing".to_string(),
                },
                "FAILED:ELEMENT_NOT_FOUND",
            ),
            (
                CaseStep::Click {
                    path: "**/Caption".to_string(),
                },
                "FAILED:NOT_INTERACTIVE",
            ),
            (
                CaseStep::Exists {
                    path: "**/test.txt".to_string(),
                    expect: false,
                },
                "FAILED:ASSERTION",
            ),
            (
                CaseStep::Panic {
                    message: "boom".to_string(),
                },
                "FAILED:CRASHED",
            ),
        ];
        for (step, expected) in cases {
            let case = case_with(vec![step.clone()], vec![list_tree()]);
            let report = run_case(&case).expect("run should pass");
            assert_eq!(report.verdicts["case/one"], expected, "step {:?}", step);
        }
    }

    #[test]
    fn run_case_types_into_inputs_relative_to_a_ref() {
        let case = case_with(
            vec![
                CaseStep::SetRef {
                    path: "Files".to_string(),
                },
                CaseStep::Input {
                    path: "Name[textInput]".to_string(),
                    text: "ok".to_string(),
                },
                CaseStep::Key {
                    key: "enter".to_string(),
                },
            ],
            vec![list_tree()],
        );
        let report = run_case(&case).expect("run should pass");
        assert_eq!(report.verdicts["case/one"], "PASSED");
        assert!(report.events.contains(&InputEvent::Char { ch: 'o' }));
        assert!(report.events.contains(&InputEvent::KeyDown { key: Key::Enter }));
    }

    #[test]
    fn run_case_rejects_unknown_keys_before_running() {
        let case = case_with(
            vec![CaseStep::Key {
                key: "hyper".to_string(),
            }],
            vec![list_tree()],
        );
        let error = run_case(&case).expect_err("unknown key should fail");
        assert!(matches!(error, UtToolError::UnknownKey { step_index: 0, .. }));
    }

    #[test]
    fn run_case_marks_unfinished_scenarios_cancelled_when_frames_run_out() {
        let mut case = case_with(
            vec![CaseStep::Yield { frames: 50 }],
            vec![list_tree()],
        );
        case.max_frames = 5;
        let report = run_case(&case).expect("run should pass");
        assert!(report.exhausted);
        assert_eq!(report.verdicts["case/one"], "SKIPPED:CANCELLED");
    }

    #[test]
    fn run_case_rejects_invalid_options() {
        let mut case = case_with(Vec::new(), vec![list_tree()]);
        case.options.run_speed = Some("warp".to_string());
        let error = run_case(&case).expect_err("bad options should fail");
        assert!(matches!(error, UtToolError::Engine(_)));
    }
}
