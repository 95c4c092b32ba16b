use std::panic;
use std::sync::atomic::{AtomicUsize, Ordering};

use ut_runtime::{install_default_crash_handler, is_crash_handler_installed};

static EARLIER_HOOK_CALLS: AtomicUsize = AtomicUsize::new(0);

#[test]
fn crash_handler_keeps_the_earlier_panic_hook() {
    panic::set_hook(Box::new(|_| {
        EARLIER_HOOK_CALLS.fetch_add(1, Ordering::SeqCst);
    }));
    install_default_crash_handler();
    install_default_crash_handler();
    assert!(is_crash_handler_installed());

    let outcome = panic::catch_unwind(|| panic!("step blew up"));
    assert!(outcome.is_err());
    assert_eq!(EARLIER_HOOK_CALLS.load(Ordering::SeqCst), 1);

    let _ = panic::take_hook();
}
