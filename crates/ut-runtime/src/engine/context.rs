use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use ut_core::{FailureReason, Key, ScenarioId, UiTree, Verbosity};
use ut_path::ElementPath;

use super::driver::{InteractionDriver, Ticket};
use super::locator::{resolve, ElementRef, SearchState};
use super::options::EngineOptions;
use super::scenario_log::ScenarioLog;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interrupt {
    Yield,
    Fail(FailureReason),
}

impl From<FailureReason> for Interrupt {
    fn from(reason: FailureReason) -> Self {
        Self::Fail(reason)
    }
}

pub type StepResult = Result<(), Interrupt>;

/// Body of a scenario.
///
/// The step is called once per tick and always runs from the top. Actions
/// finished on earlier ticks are recognised by their call order and return
/// `Ok(())` immediately, so a step must issue the same action sequence on
/// every call. Anything that must survive between ticks belongs in the
/// context variables.
pub trait ScenarioStep {
    fn step(&self, ctx: &mut ExecutionContext<'_>) -> StepResult;
}

impl<F> ScenarioStep for F
where
    F: Fn(&mut ExecutionContext<'_>) -> StepResult,
{
    fn step(&self, ctx: &mut ExecutionContext<'_>) -> StepResult {
        self(ctx)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum PendingAction {
    Searching(SearchState),
    Waiting { ticket: Ticket },
    Sleeping { until_frame: u64 },
}

pub(crate) struct RunState {
    pub(crate) id: ScenarioId,
    pub(crate) step: Arc<dyn ScenarioStep>,
    pub(crate) started_frame: u64,
    pub(crate) steps: u64,
    pub(crate) completed_actions: usize,
    pub(crate) pending: Option<PendingAction>,
    pub(crate) logged: usize,
    pub(crate) vars: BTreeMap<String, Value>,
    pub(crate) log: ScenarioLog,
}

impl RunState {
    pub(crate) fn new(id: ScenarioId, step: Arc<dyn ScenarioStep>, started_frame: u64) -> Self {
        Self {
            id,
            step,
            started_frame,
            steps: 0,
            completed_actions: 0,
            pending: None,
            logged: 0,
            vars: BTreeMap::new(),
            log: ScenarioLog::new(),
        }
    }
}

pub struct ExecutionContext<'a> {
    run: &'a mut RunState,
    driver: &'a mut InteractionDriver,
    tree: &'a UiTree,
    options: &'a EngineOptions,
    frame: u64,
    base: Option<ElementPath>,
    action_cursor: usize,
    log_cursor: usize,
}

impl<'a> ExecutionContext<'a> {
    pub(crate) fn new(
        run: &'a mut RunState,
        driver: &'a mut InteractionDriver,
        tree: &'a UiTree,
        options: &'a EngineOptions,
        frame: u64,
    ) -> Self {
        Self {
            run,
            driver,
            tree,
            options,
            frame,
            base: None,
            action_cursor: 0,
            log_cursor: 0,
        }
    }

    pub fn id(&self) -> &ScenarioId {
        &self.run.id
    }

    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn elapsed_frames(&self) -> u64 {
        self.frame.saturating_sub(self.run.started_frame)
    }

    pub fn tree(&self) -> &UiTree {
        self.tree
    }

    pub fn set_ref(&mut self, base: &str) -> StepResult {
        self.base = Some(self.parse_path(base)?);
        Ok(())
    }

    pub fn clear_ref(&mut self) {
        self.base = None;
    }

    pub fn set_var(&mut self, name: &str, value: impl Into<Value>) {
        self.run.vars.insert(name.to_string(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.run.vars.get(name)
    }

    pub fn log(&mut self, level: Verbosity, message: impl Into<String>) {
        let index = self.log_cursor;
        self.log_cursor += 1;
        if index < self.run.logged {
            return;
        }
        self.run.logged = index + 1;
        self.record(level, message);
    }

    pub fn log_info(&mut self, message: impl Into<String>) {
        self.log(Verbosity::Info, message);
    }

    pub fn log_debug(&mut self, message: impl Into<String>) {
        self.log(Verbosity::Debug, message);
    }

    pub fn log_warning(&mut self, message: impl Into<String>) {
        self.log(Verbosity::Warning, message);
    }

    pub fn check(&mut self, condition: bool, message: &str) -> StepResult {
        if condition {
            return Ok(());
        }
        self.record(Verbosity::Error, format!("check failed: {}", message));
        Err(Interrupt::Fail(FailureReason::Assertion {
            message: message.to_string(),
        }))
    }

    pub fn fail(&mut self, message: &str) -> StepResult {
        self.check(false, message)
    }

    pub fn locate(&mut self, path: &str) -> Result<Option<ElementRef>, Interrupt> {
        let path = self.parse_path(path)?;
        let resolution = resolve(&path, self.tree, self.frame);
        if resolution.is_ambiguous() {
            self.record(
                Verbosity::Debug,
                format!(
                    "\"{}\" matched {} elements; using the first",
                    path, resolution.match_count
                ),
            );
        }
        Ok(resolution.element)
    }

    pub fn item_exists(&mut self, path: &str) -> Result<bool, Interrupt> {
        Ok(self.locate(path)?.is_some())
    }

    pub fn item_click(&mut self, path: &str) -> StepResult {
        self.element_action(path, "click", |driver, element| driver.click(element))
    }

    pub fn item_double_click(&mut self, path: &str) -> StepResult {
        self.element_action(path, "double-click", |driver, element| {
            driver.double_click(element)
        })
    }

    pub fn item_hover(&mut self, path: &str) -> StepResult {
        self.element_action(path, "hover", |driver, element| driver.hover(element))
    }

    pub fn item_input(&mut self, path: &str, text: &str) -> StepResult {
        self.element_action(path, "type into", |driver, element| {
            driver.type_text(element, text)
        })
    }

    pub fn item_navigate(&mut self, path: &str) -> StepResult {
        self.element_action(path, "navigate to", |driver, element| {
            driver.navigate(element)
        })
    }

    pub fn wait_for(&mut self, path: &str) -> StepResult {
        let index = self.next_action();
        if index < self.run.completed_actions {
            return Ok(());
        }
        let path = self.parse_path(path)?;
        match self.search(&path)? {
            Some(_) => {
                self.complete_action();
                Ok(())
            }
            None => Err(Interrupt::Yield),
        }
    }

    pub fn key_press(&mut self, key: Key) -> StepResult {
        let index = self.next_action();
        if index < self.run.completed_actions {
            return Ok(());
        }
        if let Some(PendingAction::Waiting { ticket }) = self.run.pending {
            return self.await_ticket(ticket);
        }
        let ticket = self.driver.key_press(key);
        self.record(Verbosity::Debug, format!("press {}", key.name()));
        self.run.pending = Some(PendingAction::Waiting { ticket });
        Err(Interrupt::Yield)
    }

    pub fn yield_frames(&mut self, frames: u64) -> StepResult {
        let index = self.next_action();
        if index < self.run.completed_actions {
            return Ok(());
        }
        let until_frame = match self.run.pending {
            Some(PendingAction::Sleeping { until_frame }) => until_frame,
            _ => self.frame + frames,
        };
        if self.frame >= until_frame {
            self.complete_action();
            return Ok(());
        }
        self.run.pending = Some(PendingAction::Sleeping { until_frame });
        Err(Interrupt::Yield)
    }

    fn element_action<F>(&mut self, raw: &str, verb: &str, issue: F) -> StepResult
    where
        F: FnOnce(&mut InteractionDriver, &ElementRef) -> Result<Ticket, ut_core::UiTestError>,
    {
        let index = self.next_action();
        if index < self.run.completed_actions {
            return Ok(());
        }
        if let Some(PendingAction::Waiting { ticket }) = self.run.pending {
            return self.await_ticket(ticket);
        }

        let path = self.parse_path(raw)?;
        let Some(element) = self.search(&path)? else {
            return Err(Interrupt::Yield);
        };
        if !element.interactive {
            self.record(
                Verbosity::Error,
                format!("cannot {} \"{}\": element is not interactive", verb, path),
            );
            return Err(Interrupt::Fail(FailureReason::NotInteractive {
                path: path.to_string(),
            }));
        }

        let ticket = issue(self.driver, &element).map_err(|error| {
            Interrupt::Fail(FailureReason::Assertion {
                message: error.to_string(),
            })
        })?;
        self.record(
            Verbosity::Debug,
            format!("{} \"{}\" ({} {})", verb, path, element.kind.name(), element.id),
        );
        self.run.pending = Some(PendingAction::Waiting { ticket });
        Err(Interrupt::Yield)
    }

    fn search(&mut self, path: &ElementPath) -> Result<Option<ElementRef>, Interrupt> {
        let state = match self.run.pending.take() {
            Some(PendingAction::Searching(state)) => state,
            _ => SearchState::new(self.options.element_retry_frames),
        };

        let resolution = resolve(path, self.tree, self.frame);
        if resolution.is_ambiguous() {
            self.record(
                Verbosity::Debug,
                format!(
                    "\"{}\" matched {} elements; using the first",
                    path, resolution.match_count
                ),
            );
        }

        match state.observe(resolution) {
            SearchState::Found(element) => Ok(Some(element)),
            SearchState::NotFound => {
                self.record(
                    Verbosity::Error,
                    format!(
                        "no element matches \"{}\" after {} frames",
                        path, self.options.element_retry_frames
                    ),
                );
                Err(Interrupt::Fail(FailureReason::ElementNotFound {
                    path: path.to_string(),
                }))
            }
            SearchState::Searching { attempts_left } => {
                self.record(
                    Verbosity::Debug,
                    format!("waiting for \"{}\" ({} attempts left)", path, attempts_left),
                );
                self.run.pending = Some(PendingAction::Searching(SearchState::Searching {
                    attempts_left,
                }));
                Ok(None)
            }
        }
    }

    fn await_ticket(&mut self, ticket: Ticket) -> StepResult {
        if self.driver.is_complete(ticket) {
            self.complete_action();
            return Ok(());
        }
        Err(Interrupt::Yield)
    }

    fn next_action(&mut self) -> usize {
        let index = self.action_cursor;
        self.action_cursor += 1;
        index
    }

    fn complete_action(&mut self) {
        self.run.completed_actions += 1;
        self.run.pending = None;
    }

    fn parse_path(&mut self, raw: &str) -> Result<ElementPath, Interrupt> {
        let parsed = ElementPath::parse(raw).map_err(|error| {
            Interrupt::Fail(FailureReason::InvalidPath {
                path: raw.to_string(),
                message: error.to_string(),
            })
        })?;
        Ok(match &self.base {
            Some(base) => base.join(&parsed),
            None => parsed,
        })
    }

    fn record(&mut self, level: Verbosity, message: impl Into<String>) {
        let frame = self.frame;
        let verbosity = self.options.verbosity;
        let RunState { id, log, .. } = &mut *self.run;
        log.push(id, frame, level, message, verbosity);
    }
}
