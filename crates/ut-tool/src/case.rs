use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ut_core::UiTree;
use ut_runtime::RawEngineOptions;

pub const TESTCASE_SCHEMA_V1: &str = "ut-tool-case.v1";
pub const DEFAULT_CASE_MAX_FRAMES: u64 = 1_000;

/// A scripted host: the tree it shows on each frame, the scenarios run
/// against it, and the verdict code each scenario must end with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub schema_version: String,
    #[serde(default)]
    pub options: RawEngineOptions,
    /// Tree for frame 1, 2, ...; the last one repeats.
    #[serde(default)]
    pub frames: Vec<UiTree>,
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,
    #[serde(default = "default_group_filter")]
    pub group_filter: String,
    #[serde(default)]
    pub scenarios: Vec<ScenarioCase>,
    /// `group/name` -> `PASSED`, `FAILED:<CODE>` or `SKIPPED:<CODE>`.
    #[serde(default)]
    pub expected: BTreeMap<String, String>,
}

fn default_max_frames() -> u64 {
    DEFAULT_CASE_MAX_FRAMES
}

fn default_group_filter() -> String {
    ut_core::GROUP_FILTER_ALL.to_string()
}

impl TestCase {
    pub fn tree_for_frame(&self, frame: u64) -> UiTree {
        let index = usize::try_from(frame.saturating_sub(1)).unwrap_or(usize::MAX);
        let mut tree = match self.frames.get(index).or_else(|| self.frames.last()) {
            Some(tree) => tree.clone(),
            None => UiTree::empty(frame),
        };
        tree.frame = frame;
        tree
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioCase {
    pub group: String,
    pub name: String,
    #[serde(default)]
    pub steps: Vec<CaseStep>,
}

impl ScenarioCase {
    pub fn id(&self) -> String {
        format!("{}/{}", self.group, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CaseStep {
    Click {
        path: String,
    },
    DoubleClick {
        path: String,
    },
    Hover {
        path: String,
    },
    Input {
        path: String,
        text: String,
    },
    Navigate {
        path: String,
    },
    Key {
        key: String,
    },
    Exists {
        path: String,
        #[serde(default = "default_true")]
        expect: bool,
    },
    Wait {
        path: String,
    },
    Yield {
        frames: u64,
    },
    SetRef {
        path: String,
    },
    Fail {
        message: String,
    },
    /// Panics inside the step; exercises the crash guard.
    Panic {
        message: String,
    },
}

fn default_true() -> bool {
    true
}

impl CaseStep {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Click { .. } => "click",
            Self::DoubleClick { .. } => "doubleClick",
            Self::Hover { .. } => "hover",
            Self::Input { .. } => "input",
            Self::Navigate { .. } => "navigate",
            Self::Key { .. } => "key",
            Self::Exists { .. } => "exists",
            Self::Wait { .. } => "wait",
            Self::Yield { .. } => "yield",
            Self::SetRef { .. } => "setRef",
            Self::Fail { .. } => "fail",
            Self::Panic { .. } => "panic",
        }
    }
}

#[cfg(test)]
mod case_tests {
    use super::*;
    use ut_core::{NodeKind, UiNode};

    #[test]
    fn testcase_deserialize_applies_defaults() {
        let parsed: TestCase = serde_json::from_str(
            r#"{
  "schemaVersion": "ut-tool-case.v1"
}"#,
        )
        .expect("testcase should deserialize");

        assert_eq!(parsed.schema_version, TESTCASE_SCHEMA_V1);
        assert_eq!(parsed.max_frames, DEFAULT_CASE_MAX_FRAMES);
        assert_eq!(parsed.group_filter, "all");
        assert_eq!(parsed.options, RawEngineOptions::default());
        assert!(parsed.frames.is_empty());
        assert!(parsed.scenarios.is_empty());
        assert!(parsed.expected.is_empty());
    }

    #[test]
    fn case_steps_deserialize_by_kind() {
        let parsed: Vec<CaseStep> = serde_json::from_str(
            r#"[
  {"kind":"click","path":"**/test.txt"},
  {"kind":"doubleClick","path":"a"},
  {"kind":"input","path":"Name[textInput]","text":"hi"},
  {"kind":"key","key":"enter"},
  {"kind":"exists","path":"b"},
  {"kind":"exists","path":"c","expect":false},
  {"kind":"yield","frames":2},
  {"kind":"setRef","path":"Files"}
]"#,
        )
        .expect("steps should deserialize");

        let kinds = parsed.iter().map(CaseStep::kind_name).collect::<Vec<_>>();
        assert_eq!(
            kinds,
            vec!["click", "doubleClick", "input", "key", "exists", "exists", "yield", "setRef"]
        );
        assert_eq!(
            parsed[4],
            CaseStep::Exists {
                path: "b".to_string(),
                expect: true
            }
        );
    }

    #[test]
    fn tree_for_frame_repeats_the_last_tree() {
        let mut case: TestCase =
            serde_json::from_str(r#"{"schemaVersion":"ut-tool-case.v1"}"#).expect("case");
        assert!(case.tree_for_frame(3).is_empty());
        assert_eq!(case.tree_for_frame(3).frame, 3);

        case.frames = vec![
            UiTree::empty(0),
            UiTree::new(0, vec![UiNode::new(1, "Main", NodeKind::Window)]),
        ];
        assert!(case.tree_for_frame(1).is_empty());
        let late = case.tree_for_frame(9);
        assert_eq!(late.frame, 9);
        assert_eq!(late.roots.len(), 1);
    }
}
