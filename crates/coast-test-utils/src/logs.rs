//! Per-thread capture of `log` records.
//!
//! Installs a process-wide logger on first use. Records are buffered on the
//! thread that emitted them, so parallel tests only see their own output.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

/// One captured log record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Captured {
    pub level: Level,
    pub target: String,
    pub message: String,
}

thread_local! {
    static RECORDS: RefCell<Option<Vec<Captured>>> = const { RefCell::new(None) };
}

struct ThreadLogger;

impl Log for ThreadLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        RECORDS.with(|records| {
            if let Some(records) = records.borrow_mut().as_mut() {
                records.push(Captured {
                    level: record.level(),
                    target: record.target().to_owned(),
                    message: record.args().to_string(),
                });
            }
        });
    }

    fn flush(&self) {}
}

static LOGGER: ThreadLogger = ThreadLogger;
static INSTALL: Once = Once::new();

/// Run `f` and return what it logged on this thread.
///
/// Panics if another logger was installed first, since nothing would be
/// captured.
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, Vec<Captured>) {
    INSTALL.call_once(|| {
        log::set_logger(&LOGGER).expect("another logger is already installed");
        log::set_max_level(LevelFilter::Trace);
    });
    RECORDS.with(|records| *records.borrow_mut() = Some(Vec::new()));
    let result = f();
    let captured = RECORDS.with(|records| records.borrow_mut().take().unwrap_or_default());
    (result, captured)
}
