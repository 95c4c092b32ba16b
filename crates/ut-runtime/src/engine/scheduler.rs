use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use ut_core::{ScenarioId, ScenarioStatus, SkipReason, UiTree, Verbosity, Verdict};

use super::context::{ExecutionContext, Interrupt, RunState};
use super::crash::run_guarded;
use super::driver::InteractionDriver;
use super::options::EngineOptions;
use super::registry::ScenarioRegistry;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub frame: u64,
    pub started: Vec<ScenarioId>,
    pub stepped: usize,
    pub finished: Vec<(ScenarioId, Verdict)>,
    pub events_delivered: usize,
}

#[derive(Default)]
pub struct Scheduler {
    queue: VecDeque<ScenarioId>,
    running: Vec<RunState>,
    statuses: BTreeMap<ScenarioId, ScenarioStatus>,
    results: BTreeMap<ScenarioId, Verdict>,
    finish_order: Vec<ScenarioId>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, ids: impl IntoIterator<Item = ScenarioId>) -> usize {
        let mut added = 0usize;
        for id in ids {
            if self.statuses.contains_key(&id) {
                continue;
            }
            self.statuses.insert(id.clone(), ScenarioStatus::Queued);
            self.queue.push_back(id);
            added += 1;
        }
        added
    }

    pub fn status(&self, id: &ScenarioId) -> Option<&ScenarioStatus> {
        self.statuses.get(id)
    }

    pub fn results(&self) -> &BTreeMap<ScenarioId, Verdict> {
        &self.results
    }

    pub fn finish_order(&self) -> &[ScenarioId] {
        &self.finish_order
    }

    pub fn queued_len(&self) -> usize {
        self.queue.len()
    }

    pub fn running_len(&self) -> usize {
        self.running.len()
    }

    pub fn running_ids(&self) -> Vec<ScenarioId> {
        self.running.iter().map(|run| run.id.clone()).collect()
    }

    pub fn is_idle(&self) -> bool {
        self.queue.is_empty() && self.running.is_empty()
    }

    pub fn clear_results(&mut self) {
        self.statuses.retain(|_, status| !status.is_terminal());
        self.results.clear();
        self.finish_order.clear();
    }

    pub(crate) fn step(
        &mut self,
        registry: &ScenarioRegistry,
        driver: &mut InteractionDriver,
        tree: &UiTree,
        options: &EngineOptions,
        frame: u64,
    ) -> TickSummary {
        let mut summary = TickSummary {
            frame,
            ..TickSummary::default()
        };
        self.fill_slots(registry, options, frame, &mut summary);

        let mut index = 0usize;
        let mut failed = false;
        while index < self.running.len() {
            let run = &mut self.running[index];
            run.steps += 1;
            let step = Arc::clone(&run.step);
            driver.set_owner(Some(run.id.clone()));
            let outcome = {
                let mut ctx = ExecutionContext::new(run, driver, tree, options, frame);
                run_guarded(options.crash_handler_installed, || step.step(&mut ctx))
            };
            summary.stepped += 1;

            let verdict = match outcome {
                Ok(()) => Some(Verdict::Passed),
                Err(Interrupt::Fail(reason)) => Some(Verdict::Failed(reason)),
                Err(Interrupt::Yield) if run.steps >= options.scenario_timeout_frames => {
                    Some(Verdict::Failed(ut_core::FailureReason::Timeout {
                        frames: run.steps,
                    }))
                }
                Err(Interrupt::Yield) => None,
            };

            match verdict {
                Some(verdict) => {
                    failed |= verdict.is_failed();
                    let run = self.running.remove(index);
                    self.finish(run, verdict, driver, options, frame, &mut summary);
                }
                None => index += 1,
            }
        }
        driver.set_owner(None);

        if failed && options.stop_on_error {
            self.stop_queued(frame, &mut summary);
        }
        summary
    }

    pub(crate) fn cancel_all(
        &mut self,
        driver: &mut InteractionDriver,
        options: &EngineOptions,
        frame: u64,
    ) -> usize {
        let mut summary = TickSummary::default();
        let running = std::mem::take(&mut self.running);
        for run in running {
            self.finish(
                run,
                Verdict::Skipped(SkipReason::Cancelled),
                driver,
                options,
                frame,
                &mut summary,
            );
        }
        while let Some(id) = self.queue.pop_front() {
            tracing::debug!(scenario = %id, frame, "cancelled before start");
            self.record(id, Verdict::Skipped(SkipReason::Cancelled), &mut summary);
        }
        summary.finished.len()
    }

    fn fill_slots(
        &mut self,
        registry: &ScenarioRegistry,
        options: &EngineOptions,
        frame: u64,
        summary: &mut TickSummary,
    ) {
        while self.running.len() < options.max_concurrent_scenarios {
            let Some(id) = self.queue.pop_front() else {
                break;
            };
            let Some(definition) = registry.lookup(&id) else {
                tracing::warn!(scenario = %id, "queued scenario is not registered; dropping");
                self.statuses.remove(&id);
                continue;
            };
            let mut run = RunState::new(id.clone(), definition.step(), frame);
            run.log.push(&id, frame, Verbosity::Info, "started", options.verbosity);
            self.statuses.insert(id.clone(), ScenarioStatus::Running);
            self.running.push(run);
            summary.started.push(id);
        }
    }

    fn stop_queued(&mut self, frame: u64, summary: &mut TickSummary) {
        while let Some(id) = self.queue.pop_front() {
            tracing::warn!(scenario = %id, frame, "skipped after an earlier failure");
            self.record(id, Verdict::Skipped(SkipReason::StoppedOnError), summary);
        }
    }

    fn finish(
        &mut self,
        mut run: RunState,
        verdict: Verdict,
        driver: &mut InteractionDriver,
        options: &EngineOptions,
        frame: u64,
        summary: &mut TickSummary,
    ) {
        let level = match &verdict {
            Verdict::Passed => Verbosity::Info,
            Verdict::Failed(_) => Verbosity::Error,
            Verdict::Skipped(_) => Verbosity::Warning,
        };
        run.log.push(
            &run.id,
            frame,
            level,
            format!("{} after {} steps", verdict, run.steps),
            options.verbosity,
        );
        if verdict != Verdict::Passed {
            let dropped = driver.cancel_for(&run.id);
            if dropped > 0 {
                run.log.push(
                    &run.id,
                    frame,
                    Verbosity::Debug,
                    format!("dropped {} undelivered input events", dropped),
                    options.verbosity,
                );
            }
        }
        if verdict.is_failed() {
            run.log.flush_on_error(&run.id, options.verbosity_on_error);
        }
        self.record(run.id, verdict, summary);
    }

    fn record(&mut self, id: ScenarioId, verdict: Verdict, summary: &mut TickSummary) {
        if self.results.contains_key(&id) {
            return;
        }
        self.statuses
            .insert(id.clone(), ScenarioStatus::Finished(verdict.clone()));
        self.results.insert(id.clone(), verdict.clone());
        self.finish_order.push(id.clone());
        summary.finished.push((id, verdict));
    }
}
