use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};

use ut_core::FailureReason;

use super::context::{Interrupt, StepResult};

static CRASH_HANDLER_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Reports panics through `tracing`, then hands them on to the hook that was
/// installed before. Installing more than once is a no-op.
pub fn install_default_crash_handler() {
    if CRASH_HANDLER_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map(|location| format!("{}:{}", location.file(), location.line()))
            .unwrap_or_else(|| "unknown".to_string());
        tracing::error!(%location, "panic: {}", panic_message(info.payload()));
        previous(info);
    }));
}

pub fn is_crash_handler_installed() -> bool {
    CRASH_HANDLER_INSTALLED.load(Ordering::SeqCst)
}

pub(crate) fn run_guarded<F>(catch: bool, step: F) -> StepResult
where
    F: FnOnce() -> StepResult,
{
    if !catch {
        return step();
    }
    match panic::catch_unwind(AssertUnwindSafe(step)) {
        Ok(result) => result,
        Err(payload) => Err(Interrupt::Fail(FailureReason::Crashed {
            message: panic_message(payload.as_ref()),
        })),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "non-string panic payload".to_string()
}

#[cfg(test)]
mod crash_tests {
    use super::*;

    #[test]
    fn run_guarded_converts_panics_into_crashed_failures() {
        install_default_crash_handler();
        assert!(is_crash_handler_installed());

        let result = run_guarded(true, || panic!("boom {}", 7));
        assert_eq!(
            result,
            Err(Interrupt::Fail(FailureReason::Crashed {
                message: "boom 7".to_string()
            }))
        );

        let result = run_guarded(true, || std::panic::panic_any(42u8));
        assert!(matches!(
            result,
            Err(Interrupt::Fail(FailureReason::Crashed { ref message }))
                if message == "non-string panic payload"
        ));
    }

    #[test]
    fn run_guarded_passes_results_through() {
        assert_eq!(run_guarded(true, || Ok(())), Ok(()));
        assert_eq!(run_guarded(false, || Err(Interrupt::Yield)), Err(Interrupt::Yield));
    }
}
