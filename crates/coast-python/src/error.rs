//! Core error -> Python exception mapping.

use coast_core::{ConfigError, OverrideError, RegisterError};
use pyo3::exceptions::{PyFileNotFoundError, PyRuntimeError, PyTypeError, PyValueError};
use pyo3::{PyErr, Python};

/// Exception class a core error is raised as.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ExceptionKind {
    Type,
    Value,
    NotFound,
    Runtime,
}

impl ExceptionKind {
    fn raise(self, msg: String) -> PyErr {
        match self {
            Self::Type => PyTypeError::new_err(msg),
            Self::Value => PyValueError::new_err(msg),
            Self::NotFound => PyFileNotFoundError::new_err(msg),
            Self::Runtime => PyRuntimeError::new_err(msg),
        }
    }
}

fn config_error_kind(e: &ConfigError) -> ExceptionKind {
    match e {
        ConfigError::OverrideNotFound { .. } => ExceptionKind::NotFound,
        _ => ExceptionKind::Value,
    }
}

fn register_error_kind(e: &RegisterError) -> ExceptionKind {
    match e {
        RegisterError::IncompleteOverride { .. } => ExceptionKind::Type,
        RegisterError::SelfTestFailed { .. } => ExceptionKind::Runtime,
    }
}

/// Raise a configuration error as `FileNotFoundError` when a file is
/// missing and `ValueError` otherwise.
pub(crate) fn config_error(e: ConfigError) -> PyErr {
    config_error_kind(&e).raise(e.to_string())
}

/// Recover the exception a Python override raised, unchanged. Errors that
/// did not come from Python become `RuntimeError`.
pub(crate) fn override_error(e: OverrideError) -> PyErr {
    let reason = e.reason().to_owned();
    match e.into_source().map(|source| source.downcast::<PyErr>()) {
        Some(Ok(original)) => *original,
        _ => ExceptionKind::Runtime.raise(reason),
    }
}

/// An incomplete override is a `TypeError`. A failed self-test is a
/// `RuntimeError` whose `__cause__` is the override's own exception.
pub(crate) fn register_error(py: Python<'_>, e: RegisterError) -> PyErr {
    let kind = register_error_kind(&e);
    match e {
        RegisterError::SelfTestFailed { stage, source } => {
            let err = kind.raise(format!("override self-test failed in {stage}()"));
            err.set_cause(py, Some(override_error(source)));
            err
        }
        e => kind.raise(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coast_core::check_operations;

    #[test]
    fn missing_override_file_is_not_found() {
        let e = ConfigError::OverrideNotFound {
            file: "override.py".into(),
        };
        assert_eq!(config_error_kind(&e), ExceptionKind::NotFound);
    }

    #[test]
    fn other_config_errors_are_value_errors() {
        for e in [
            ConfigError::MissingVariable {
                name: "COAST_USER_LIB",
            },
            ConfigError::ThinningUnknown,
            ConfigError::BlankFilename,
        ] {
            assert_eq!(config_error_kind(&e), ExceptionKind::Value);
        }
    }

    #[test]
    fn object_without_track_is_a_type_error() {
        let e = check_operations(|op| op != "track").unwrap_err();
        assert_eq!(register_error_kind(&e), ExceptionKind::Type);
        assert!(e.to_string().ends_with("track"));
    }

    #[test]
    fn failed_self_test_is_a_runtime_error() {
        let e = RegisterError::SelfTestFailed {
            stage: "init",
            source: OverrideError::new("boom"),
        };
        assert_eq!(register_error_kind(&e), ExceptionKind::Runtime);
    }
}
