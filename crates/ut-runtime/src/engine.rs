mod context;
mod crash;
mod driver;
mod lifecycle;
mod locator;
mod options;
mod registry;
mod scenario_log;
mod scheduler;

pub use context::{ExecutionContext, Interrupt, ScenarioStep, StepResult};
pub use crash::{install_default_crash_handler, is_crash_handler_installed};
pub use driver::{InteractionDriver, Ticket};
pub use lifecycle::{Engine, HostFrame, HostInfo, RenderContext, RunSummary};
pub use locator::{resolve, ElementRef, Resolution, SearchState};
pub use options::{EngineOptions, RawEngineOptions};
pub use registry::{ScenarioDefinition, ScenarioHandle, ScenarioRegistry};
pub use scenario_log::{LogEntry, ScenarioLog};
pub use scheduler::{Scheduler, TickSummary};

#[cfg(test)]
pub(crate) mod runtime_test_support {
    use ut_core::{NodeKind, Rect, UiNode, UiTree};

    pub(crate) fn file_list_tree(frame: u64, files: &[&str]) -> UiTree {
        let rows = files
            .iter()
            .enumerate()
            .map(|(index, name)| {
                UiNode::new(100 + index as u64, *name, NodeKind::Selectable).with_rect(Rect::new(
                    0.0,
                    20.0 + index as f32 * 10.0,
                    200.0,
                    10.0,
                ))
            })
            .collect();
        UiTree::new(
            frame,
            vec![UiNode::new(1, "Files", NodeKind::Window)
                .with_rect(Rect::new(0.0, 0.0, 200.0, 200.0))
                .with_children(vec![
                    UiNode::new(2, "", NodeKind::Container)
                        .with_rect(Rect::new(0.0, 20.0, 200.0, 160.0))
                        .with_children(rows),
                    UiNode::new(3, "Open", NodeKind::Button)
                        .with_rect(Rect::new(0.0, 180.0, 60.0, 20.0)),
                ])],
        )
    }
}
