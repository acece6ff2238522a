//! Module-level capture toggles.
//!
//! Python overrides switch gates through `_coast.disableWrite()` and
//! friends rather than a handle argument. A toggle made while an override
//! call is in progress is buffered and handed to that call's
//! [`Toggles`](coast_core::Toggles) when the call returns, so it lands on
//! whichever gates the dispatch was bound to (the live gates, or the
//! self-test's isolated ones). A toggle made outside any call goes straight
//! to the module gates.

use std::cell::RefCell;

use coast_core::{Capture, CaptureGates, Toggles};
use pyo3::prelude::*;

/// Whether toggles reach the `coast-ffi` host gates.
pub(crate) const EMBEDDED: bool = cfg!(feature = "embedded");

#[cfg(not(feature = "embedded"))]
static STANDALONE: coast_core::StandaloneGates = coast_core::StandaloneGates::new();

/// Gates toggled outside an override call.
#[cfg(not(feature = "embedded"))]
pub(crate) fn module_gates() -> &'static dyn CaptureGates {
    &STANDALONE
}

/// Gates toggled outside an override call.
#[cfg(feature = "embedded")]
pub(crate) fn module_gates() -> &'static dyn CaptureGates {
    coast_ffi::host_gates()
}

thread_local! {
    static PENDING: RefCell<Option<Vec<(Capture, bool)>>> = const { RefCell::new(None) };
}

fn request(capture: Capture, enabled: bool) {
    let buffered = PENDING.with(|pending| match pending.borrow_mut().as_mut() {
        Some(requests) => {
            requests.push((capture, enabled));
            true
        }
        None => false,
    });
    if !buffered {
        module_gates().set_capture(capture, enabled);
    }
}

/// Run `f`, collecting the toggle requests it makes instead of applying
/// them. Nested calls get their own buffer.
pub(crate) fn collect_requests<R>(f: impl FnOnce() -> R) -> (R, Vec<(Capture, bool)>) {
    let outer = PENDING.with(|pending| pending.borrow_mut().replace(Vec::new()));
    let result = f();
    let requests = PENDING.with(|pending| std::mem::replace(&mut *pending.borrow_mut(), outer));
    (result, requests.unwrap_or_default())
}

/// Run `f` and apply the toggles it requested to `toggles`, in order.
pub(crate) fn forward_requests<R>(toggles: &Toggles<'_>, f: impl FnOnce() -> R) -> R {
    let (result, requests) = collect_requests(f);
    for (capture, enabled) in requests {
        toggles.set(capture, enabled);
    }
    result
}

/// Python name and snake_case alias of each toggle function.
pub(crate) const ALIASES: [(&str, &str); 7] = [
    ("disableWrite", "disable_write"),
    ("enableWrite", "enable_write"),
    ("disableInteraction", "disable_interaction"),
    ("enableInteraction", "enable_interaction"),
    ("disableTrack", "disable_track"),
    ("enableTrack", "enable_track"),
    ("disableAll", "disable_all"),
];

/// Stop delivering `write` calls.
#[pyfunction]
#[pyo3(name = "disableWrite")]
pub(crate) fn disable_write() {
    request(Capture::Write, false);
}

/// Resume delivering `write` calls.
#[pyfunction]
#[pyo3(name = "enableWrite")]
pub(crate) fn enable_write() {
    request(Capture::Write, true);
}

/// Stop delivering `interaction` calls.
#[pyfunction]
#[pyo3(name = "disableInteraction")]
pub(crate) fn disable_interaction() {
    request(Capture::Interaction, false);
}

/// Resume delivering `interaction` calls.
#[pyfunction]
#[pyo3(name = "enableInteraction")]
pub(crate) fn enable_interaction() {
    request(Capture::Interaction, true);
}

/// Stop delivering `track` calls.
#[pyfunction]
#[pyo3(name = "disableTrack")]
pub(crate) fn disable_track() {
    request(Capture::Track, false);
}

/// Resume delivering `track` calls.
#[pyfunction]
#[pyo3(name = "enableTrack")]
pub(crate) fn enable_track() {
    request(Capture::Track, true);
}

/// Stop delivering `write`, `interaction` and `track` calls.
#[pyfunction]
#[pyo3(name = "disableAll")]
pub(crate) fn disable_all() {
    for capture in Capture::ALL {
        request(capture, false);
    }
}
