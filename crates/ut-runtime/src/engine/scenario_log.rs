use ut_core::{ScenarioId, Verbosity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    pub frame: u64,
    pub level: Verbosity,
    pub message: String,
    emitted: bool,
}

impl LogEntry {
    pub fn was_emitted(&self) -> bool {
        self.emitted
    }
}

/// Per-run log buffer. Entries within the normal verbosity are emitted as
/// they arrive; the rest are held back and only flushed if the run fails.
#[derive(Debug, Clone, Default)]
pub struct ScenarioLog {
    entries: Vec<LogEntry>,
}

impl ScenarioLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn push(
        &mut self,
        id: &ScenarioId,
        frame: u64,
        level: Verbosity,
        message: impl Into<String>,
        verbosity: Verbosity,
    ) {
        let message = message.into();
        let emitted = level <= verbosity;
        if emitted {
            emit(id, frame, level, &message);
        }
        self.entries.push(LogEntry {
            frame,
            level,
            message,
            emitted,
        });
    }

    pub fn flush_on_error(&mut self, id: &ScenarioId, verbosity_on_error: Verbosity) -> usize {
        let mut flushed = 0usize;
        for entry in self
            .entries
            .iter_mut()
            .filter(|entry| !entry.emitted && entry.level <= verbosity_on_error)
        {
            emit(id, entry.frame, entry.level, &entry.message);
            entry.emitted = true;
            flushed += 1;
        }
        flushed
    }
}

pub(crate) fn emit(id: &ScenarioId, frame: u64, level: Verbosity, message: &str) {
    match level {
        Verbosity::Error => tracing::error!(scenario = %id, frame, "{}", message),
        Verbosity::Warning => tracing::warn!(scenario = %id, frame, "{}", message),
        Verbosity::Info => tracing::info!(scenario = %id, frame, "{}", message),
        Verbosity::Debug => tracing::debug!(scenario = %id, frame, "{}", message),
    }
}

#[cfg(test)]
mod scenario_log_tests {
    use super::*;

    #[test]
    fn entries_above_verbosity_are_held_back_until_failure() {
        let id = ScenarioId::new("demo_test", "test1");
        let mut log = ScenarioLog::new();
        log.push(&id, 1, Verbosity::Info, "started", Verbosity::Info);
        log.push(&id, 2, Verbosity::Debug, "searching", Verbosity::Info);
        log.push(&id, 3, Verbosity::Debug, "still searching", Verbosity::Info);

        assert!(log.entries()[0].was_emitted());
        assert!(!log.entries()[1].was_emitted());

        assert_eq!(log.flush_on_error(&id, Verbosity::Debug), 2);
        assert!(log.entries().iter().all(LogEntry::was_emitted));
        assert_eq!(log.flush_on_error(&id, Verbosity::Debug), 0);
    }

    #[test]
    fn flush_respects_on_error_level() {
        let id = ScenarioId::new("g", "n");
        let mut log = ScenarioLog::new();
        log.push(&id, 1, Verbosity::Debug, "detail", Verbosity::Warning);
        log.push(&id, 1, Verbosity::Info, "note", Verbosity::Warning);
        assert_eq!(log.flush_on_error(&id, Verbosity::Info), 1);
        assert_eq!(log.entries()[0].message, "detail");
        assert!(!log.entries()[0].was_emitted());
    }
}
