//! COAST user-library hooks for CORSIKA, backed by a Rust override.
//!
//! Linking this library into CORSIKA provides the `inida_`, `wrida_`,
//! `interaction_`, `track_` and `cloda_` symbols COAST expects. Each hook
//! checks the matching capture gate and forwards to the active override
//! through a [`coast_core::Mediator`]. C code installs its own override with
//! [`coast_override_register`] and switches gates with the `coast_enable_*`
//! and `coast_disable_*` functions.
//!
//! This is the only crate in the workspace allowed to contain `unsafe` code.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![deny(unsafe_code)]

use std::any::Any;
use std::cell::RefCell;
use std::ffi::c_char;

thread_local! {
    pub(crate) static LAST_PANIC: RefCell<String> = const { RefCell::new(String::new()) };
    pub(crate) static LAST_ERROR: RefCell<String> = const { RefCell::new(String::new()) };
}

/// Run an FFI body, converting a panic into `CoastStatus::Panicked`.
macro_rules! ffi_guard {
    ($body:block) => {
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| $body)) {
            Ok(status) => status,
            Err(payload) => {
                $crate::record_panic(payload.as_ref());
                $crate::status::CoastStatus::Panicked as i32
            }
        }
    };
}

pub mod callback;
pub mod host;
pub mod status;
pub mod types;

pub use callback::{
    coast_override_register, CoastOverrideDef, CoastToggles, LifecycleFn, InteractionFn,
    TrackFn, WriteFn,
};
pub use host::{
    cloda_, coast_disable_all, coast_disable_interaction, coast_disable_track,
    coast_disable_write, coast_enable_interaction, coast_enable_track, coast_enable_write,
    coast_is_capturing, coast_reset, host_gates, inida_, install_override, interaction_,
    tabularizedatmosphere_, track_, with_mediator, wrida_,
};
pub use status::CoastStatus;
pub use types::{CoastCapture, CoastInteraction, CoastParticle};

pub(crate) fn record_panic(payload: &(dyn Any + Send)) {
    let msg = if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_owned()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    };
    log::error!("panic caught at FFI boundary: {msg}");
    LAST_PANIC.with(|cell| *cell.borrow_mut() = msg);
}

pub(crate) fn record_error(msg: String) {
    log::error!("{msg}");
    LAST_ERROR.with(|cell| *cell.borrow_mut() = msg);
}

/// Copy `msg` into a caller buffer as a NUL-terminated string.
///
/// Returns the full message length in bytes (excluding the NUL). A null
/// `buf` only queries the length; a short buffer gets a truncated copy.
#[allow(unsafe_code)]
fn copy_message(msg: &str, buf: *mut c_char, len: usize) -> i32 {
    let bytes = msg.as_bytes();
    if !buf.is_null() && len > 0 {
        let n = bytes.len().min(len - 1);
        // SAFETY: caller guarantees buf points to at least `len` writable bytes.
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), buf as *mut u8, n);
            *buf.add(n) = 0;
        }
    }
    bytes.len().min(i32::MAX as usize) as i32
}

/// Message of the last panic caught on this thread.
///
/// Returns the message length; see [`coast_last_error_message`] for the
/// buffer protocol.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_last_panic_message(buf: *mut c_char, len: usize) -> i32 {
    LAST_PANIC.with(|cell| copy_message(&cell.borrow(), buf, len))
}

/// Message of the last failed hook on this thread.
///
/// COAST hooks return nothing, so a failing override is reported here and
/// in the log. Pass a null `buf` to query the length, then a buffer of at
/// least `length + 1` bytes to receive the NUL-terminated text.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_last_error_message(buf: *mut c_char, len: usize) -> i32 {
    LAST_ERROR.with(|cell| copy_message(&cell.borrow(), buf, len))
}
