//! C-compatible status codes.
//!
//! [`CoastStatus`] is a `repr(i32)` enum returned by every `coast_*`
//! function. Conversions from the core error types are provided.

use coast_core::{ConfigError, OverrideError, RegisterError};

/// C-compatible status code returned by the `coast_*` functions.
///
/// `Ok` = 0, all errors are negative. Values are ABI-stable.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoastStatus {
    /// Success.
    Ok = 0,
    /// An argument is null, out of range, or otherwise invalid.
    InvalidArgument = -1,
    /// The override definition lacks one or more required callbacks.
    IncompleteOverride = -2,
    /// The override was installed but failed its self-test.
    SelfTestFailed = -3,
    /// An override callback reported an error.
    OverrideFailed = -4,
    /// The CORSIKA configuration or search paths are invalid.
    ConfigError = -5,
    /// Called from inside an override callback.
    Reentrant = -6,
    /// Internal error (e.g. poisoned mutex after a prior panic).
    InternalError = -7,
    /// A Rust panic was caught at the FFI boundary.
    Panicked = -128,
}

impl From<&RegisterError> for CoastStatus {
    fn from(e: &RegisterError) -> Self {
        match e {
            RegisterError::IncompleteOverride { .. } => CoastStatus::IncompleteOverride,
            RegisterError::SelfTestFailed { .. } => CoastStatus::SelfTestFailed,
        }
    }
}

impl From<&ConfigError> for CoastStatus {
    fn from(_e: &ConfigError) -> Self {
        CoastStatus::ConfigError
    }
}

impl From<&OverrideError> for CoastStatus {
    fn from(_e: &OverrideError) -> Self {
        CoastStatus::OverrideFailed
    }
}
