use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ut_core::{InputSink, Rect, ScenarioId, ScenarioStatus, UiTestError, UiTree, Verdict};

use super::context::ScenarioStep;
use super::crash::install_default_crash_handler;
use super::driver::InteractionDriver;
use super::options::{EngineOptions, RawEngineOptions};
use super::registry::{ScenarioHandle, ScenarioRegistry};
use super::scheduler::{Scheduler, TickSummary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostInfo {
    pub name: String,
}

impl HostInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderContext {
    pub frame: u64,
    pub viewport: Rect,
}

pub struct HostFrame<'a> {
    pub frame: u64,
    pub tree: &'a UiTree,
    pub input: &'a mut dyn InputSink,
}

impl<'a> HostFrame<'a> {
    pub fn new(frame: u64, tree: &'a UiTree, input: &'a mut dyn InputSink) -> Self {
        Self { frame, tree, input }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub tested: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.pending == 0 && self.failed == 0 && self.skipped == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Created,
    Started,
    ShutDown,
}

pub struct Engine {
    host: HostInfo,
    options: EngineOptions,
    state: EngineState,
    registry: ScenarioRegistry,
    scheduler: Scheduler,
    driver: InteractionDriver,
    last_frame: u64,
}

impl Engine {
    pub fn create(host: HostInfo) -> Self {
        let options = EngineOptions::default();
        Self {
            host,
            driver: InteractionDriver::new(&options),
            options,
            state: EngineState::Created,
            registry: ScenarioRegistry::new(),
            scheduler: Scheduler::new(),
            last_frame: 0,
        }
    }

    pub fn host(&self) -> &HostInfo {
        &self.host
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn configure(&mut self, options: EngineOptions) -> Result<(), UiTestError> {
        match self.state {
            EngineState::Created => {}
            EngineState::Started => return Err(UiTestError::EngineAlreadyStarted),
            EngineState::ShutDown => return Err(UiTestError::EngineShutDown),
        }
        options.validate()?;
        self.driver = InteractionDriver::new(&options);
        self.options = options;
        Ok(())
    }

    pub fn configure_raw(&mut self, raw: &RawEngineOptions) -> Result<(), UiTestError> {
        self.configure(EngineOptions::from_raw(raw)?)
    }

    pub fn start(&mut self, render: RenderContext) -> Result<(), UiTestError> {
        match self.state {
            EngineState::Created => {}
            EngineState::Started => return Err(UiTestError::EngineAlreadyStarted),
            EngineState::ShutDown => return Err(UiTestError::EngineShutDown),
        }
        if self.options.crash_handler_installed {
            install_default_crash_handler();
        }
        let (x, y) = render.viewport.center();
        self.driver.set_mouse_position(x, y);
        self.driver.begin_frame(render.frame);
        self.last_frame = render.frame;
        self.state = EngineState::Started;
        tracing::info!(
            host = %self.host.name,
            speed = %self.options.run_speed,
            verbosity = %self.options.verbosity,
            "test engine started"
        );
        Ok(())
    }

    pub fn is_started(&self) -> bool {
        self.state == EngineState::Started
    }

    pub fn is_shut_down(&self) -> bool {
        self.state == EngineState::ShutDown
    }

    pub fn register_scenario(
        &mut self,
        group: &str,
        name: &str,
        step: impl ScenarioStep + 'static,
    ) -> Result<ScenarioHandle, UiTestError> {
        self.ensure_not_shut_down()?;
        self.registry.register(group, name, step)
    }

    pub fn registry(&self) -> &ScenarioRegistry {
        &self.registry
    }

    pub fn enqueue(&mut self, filter: &str) -> Result<usize, UiTestError> {
        self.ensure_not_shut_down()?;
        let selected = self.registry.select(filter);
        if selected.is_empty() {
            tracing::warn!(filter, "no registered scenario matches");
        }
        let added = self.scheduler.enqueue(selected);
        tracing::debug!(filter, added, "queued scenarios");
        Ok(added)
    }

    pub fn tick(&mut self, host: &mut HostFrame<'_>) -> Result<TickSummary, UiTestError> {
        match self.state {
            EngineState::Created => return Err(UiTestError::EngineNotStarted),
            EngineState::ShutDown => return Err(UiTestError::EngineShutDown),
            EngineState::Started => {}
        }
        self.last_frame = host.frame;
        self.driver.begin_frame(host.frame);
        let mut summary = self.scheduler.step(
            &self.registry,
            &mut self.driver,
            host.tree,
            &self.options,
            host.frame,
        );
        summary.events_delivered = self.driver.flush(host.frame, &mut *host.input);
        Ok(summary)
    }

    pub fn shutdown(&mut self) -> usize {
        if self.state == EngineState::ShutDown {
            return 0;
        }
        let cancelled = self
            .scheduler
            .cancel_all(&mut self.driver, &self.options, self.last_frame);
        let dropped = self.driver.cancel_pending();
        self.state = EngineState::ShutDown;
        tracing::info!(cancelled, dropped_events = dropped, "test engine shut down");
        cancelled
    }

    pub fn results(&self) -> &BTreeMap<ScenarioId, Verdict> {
        self.scheduler.results()
    }

    pub fn verdict(&self, id: &str) -> Option<&Verdict> {
        let id: ScenarioId = id.parse().ok()?;
        self.scheduler.results().get(&id)
    }

    pub fn status(&self, id: &ScenarioId) -> Option<&ScenarioStatus> {
        self.scheduler.status(id)
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn summary(&self) -> RunSummary {
        let mut summary = RunSummary {
            pending: self.scheduler.queued_len() + self.scheduler.running_len(),
            ..RunSummary::default()
        };
        for verdict in self.scheduler.results().values() {
            summary.tested += 1;
            match verdict {
                Verdict::Passed => summary.passed += 1,
                Verdict::Failed(_) => summary.failed += 1,
                Verdict::Skipped(_) => summary.skipped += 1,
            }
        }
        summary
    }

    pub fn is_idle(&self) -> bool {
        self.scheduler.is_idle() && self.driver.is_idle()
    }

    pub fn clear_results(&mut self) {
        self.scheduler.clear_results();
    }

    fn ensure_not_shut_down(&self) -> Result<(), UiTestError> {
        if self.state == EngineState::ShutDown {
            return Err(UiTestError::EngineShutDown);
        }
        Ok(())
    }
}
