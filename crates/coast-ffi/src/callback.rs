//! C callback override: bridges `CoastOverrideDef` to the Rust `Override` trait.
//!
//! C code fills a [`CoastOverrideDef`] with one function pointer per
//! operation and passes it to [`coast_override_register`], which wraps it
//! in a `CallbackOverride` and installs it in the process-wide host.

use std::ffi::c_void;

use coast_core::{
    check_operations, Interaction, Override, OverrideError, Particle, RegisterError, Toggles,
};

use crate::host;
use crate::status::CoastStatus;
use crate::types::{CoastCapture, CoastInteraction, CoastParticle};

/// C-side toggle handle passed to every override callback.
///
/// Toggle requests made through `set_fn` reach the same gates the host
/// reads, and take effect for the next callback.
#[repr(C)]
pub struct CoastToggles {
    /// Opaque pointer to internal state (do not dereference in C).
    pub opaque: *const c_void,
    /// Switch a gate: `(opaque, capture, enabled) -> status`.
    ///
    /// `capture` is a [`CoastCapture`] discriminant; `enabled` is 0 or 1.
    pub set_fn: unsafe extern "C" fn(*const c_void, i32, u8) -> i32,
}

/// `init_fn` / `close_fn`: `(user_data, toggles) -> status`.
pub type LifecycleFn = unsafe extern "C" fn(*mut c_void, *const CoastToggles) -> i32;
/// `write_fn`: `(user_data, toggles, subblock, subblock_len) -> status`.
pub type WriteFn = unsafe extern "C" fn(*mut c_void, *const CoastToggles, *const u8, usize) -> i32;
/// `interaction_fn`: `(user_data, toggles, info) -> status`.
pub type InteractionFn =
    unsafe extern "C" fn(*mut c_void, *const CoastToggles, *const CoastInteraction) -> i32;
/// `track_fn`: `(user_data, toggles, pre, post) -> status`.
pub type TrackFn = unsafe extern "C" fn(
    *mut c_void,
    *const CoastToggles,
    *const CoastParticle,
    *const CoastParticle,
) -> i32;

/// C-side override definition with function pointers.
///
/// Every callback must be non-null. A callback returning nonzero is an
/// override error. `user_data` is passed back verbatim and must stay valid
/// until the override is replaced or the host closes.
#[repr(C)]
pub struct CoastOverrideDef {
    /// Called from `inida_`.
    pub init_fn: Option<LifecycleFn>,
    /// Called from `cloda_`.
    pub close_fn: Option<LifecycleFn>,
    /// Called from `wrida_` with one subblock.
    pub write_fn: Option<WriteFn>,
    /// Called from `interaction_`.
    pub interaction_fn: Option<InteractionFn>,
    /// Called from `track_`.
    pub track_fn: Option<TrackFn>,
    /// User data pointer passed to every callback.
    pub user_data: *mut c_void,
}

/// Rust-side wrapper that implements `Override` by delegating to C callbacks.
pub(crate) struct CallbackOverride {
    init_fn: LifecycleFn,
    close_fn: LifecycleFn,
    write_fn: WriteFn,
    interaction_fn: InteractionFn,
    track_fn: TrackFn,
    user_data: *mut c_void,
}

// SAFETY: COAST drives all hooks from the simulation thread and the host
// mutex serialises dispatch. C callers must ensure user_data is usable from
// the thread that calls the hooks.
#[allow(unsafe_code)]
unsafe impl Send for CallbackOverride {}

impl CallbackOverride {
    /// Build from a definition, or name the missing callbacks.
    pub(crate) fn from_def(def: &CoastOverrideDef) -> Result<Self, RegisterError> {
        match (
            def.init_fn,
            def.close_fn,
            def.write_fn,
            def.interaction_fn,
            def.track_fn,
        ) {
            (Some(init_fn), Some(close_fn), Some(write_fn), Some(interaction_fn), Some(track_fn)) => {
                Ok(Self {
                    init_fn,
                    close_fn,
                    write_fn,
                    interaction_fn,
                    track_fn,
                    user_data: def.user_data,
                })
            }
            _ => Err(check_operations(|op| match op {
                "init" => def.init_fn.is_some(),
                "close" => def.close_fn.is_some(),
                "write" => def.write_fn.is_some(),
                "interaction" => def.interaction_fn.is_some(),
                "track" => def.track_fn.is_some(),
                _ => false,
            })
            .err()
            .unwrap_or(RegisterError::IncompleteOverride {
                missing: Vec::new(),
            })),
        }
    }
}

fn check_rc(rc: i32) -> Result<(), OverrideError> {
    if rc == 0 {
        Ok(())
    } else {
        Err(OverrideError::new(format!(
            "C callback returned error code {rc}"
        )))
    }
}

fn c_toggles(toggles: &Toggles<'_>) -> CoastToggles {
    CoastToggles {
        opaque: toggles as *const Toggles<'_> as *const c_void,
        set_fn: trampoline_set,
    }
}

#[allow(unsafe_code)]
unsafe extern "C" fn trampoline_set(opaque: *const c_void, capture: i32, enabled: u8) -> i32 {
    if opaque.is_null() {
        return CoastStatus::InvalidArgument as i32;
    }
    let Some(capture) = CoastCapture::from_raw(capture) else {
        return CoastStatus::InvalidArgument as i32;
    };
    // SAFETY: opaque was set to a live &Toggles in c_toggles() for the
    // duration of the callback.
    let toggles = &*(opaque as *const Toggles<'_>);
    toggles.set(capture.into(), enabled != 0);
    CoastStatus::Ok as i32
}

impl Override for CallbackOverride {
    #[allow(unsafe_code)]
    fn init(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        let c = c_toggles(toggles);
        // SAFETY: init_fn and user_data are valid per FFI contract.
        check_rc(unsafe { (self.init_fn)(self.user_data, &c) })
    }

    #[allow(unsafe_code)]
    fn close(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        let c = c_toggles(toggles);
        // SAFETY: close_fn and user_data are valid per FFI contract.
        check_rc(unsafe { (self.close_fn)(self.user_data, &c) })
    }

    #[allow(unsafe_code)]
    fn write(&mut self, toggles: &Toggles<'_>, subblock: &[u8]) -> Result<(), OverrideError> {
        let c = c_toggles(toggles);
        // SAFETY: the slice outlives the call; write_fn must not retain it.
        check_rc(unsafe {
            (self.write_fn)(self.user_data, &c, subblock.as_ptr(), subblock.len())
        })
    }

    #[allow(unsafe_code)]
    fn interaction(&mut self, toggles: &Toggles<'_>, info: &Interaction) -> Result<(), OverrideError> {
        let c = c_toggles(toggles);
        let info = CoastInteraction::from(info);
        // SAFETY: info lives on this stack frame for the whole call.
        check_rc(unsafe { (self.interaction_fn)(self.user_data, &c, &info) })
    }

    #[allow(unsafe_code)]
    fn track(
        &mut self,
        toggles: &Toggles<'_>,
        pre: &Particle,
        post: &Particle,
    ) -> Result<(), OverrideError> {
        let c = c_toggles(toggles);
        let pre = CoastParticle::from(pre);
        let post = CoastParticle::from(post);
        // SAFETY: pre and post live on this stack frame for the whole call.
        check_rc(unsafe { (self.track_fn)(self.user_data, &c, &pre, &post) })
    }
}

/// Install a C override as the active override.
///
/// The previous override is dropped. With nonzero `run_test` the new
/// override is driven through a synthetic session against isolated gates;
/// a self-test failure returns `SelfTestFailed` but leaves the override
/// installed. Must not be called from inside an override callback.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_override_register(def: *const CoastOverrideDef, run_test: u8) -> i32 {
    ffi_guard!({
        if def.is_null() {
            return CoastStatus::InvalidArgument as i32;
        }
        // SAFETY: def is a valid pointer per caller contract.
        let def = unsafe { &*def };

        let ov = match CallbackOverride::from_def(def) {
            Ok(ov) => ov,
            Err(e) => {
                crate::record_error(format!("register: {e}"));
                return CoastStatus::from(&e) as i32;
            }
        };

        match host::install_override(Box::new(ov), run_test != 0) {
            Ok(Some(report)) => {
                log::info!(
                    "C override self-test: {} calls, {} skipped",
                    report.calls,
                    report.skipped.len()
                );
                CoastStatus::Ok as i32
            }
            Ok(None) => CoastStatus::Ok as i32,
            Err(status) => status as i32,
        }
    })
}
