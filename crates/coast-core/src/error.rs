//! Error types for override registration, dispatch and host configuration.
//!
//! Organised by concern: [`RegisterError`] when installing an override,
//! [`OverrideError`] when a user override fails during a callback, and
//! [`ConfigError`] for the CORSIKA options and override search paths.

use std::error::Error;
use std::fmt;

/// Errors from [`Mediator::register`](crate::Mediator::register).
#[derive(Debug)]
pub enum RegisterError {
    /// The supplied override does not provide every required operation.
    ///
    /// Raised before the override is installed, so no dispatch ever
    /// reaches a partial implementation.
    IncompleteOverride {
        /// Names of the missing operations, in declaration order.
        missing: Vec<&'static str>,
    },
    /// The override was installed but failed the self-test probe.
    SelfTestFailed {
        /// The probe stage that failed (`"init"`, `"write"`, ...).
        stage: &'static str,
        /// The error returned by the override.
        source: OverrideError,
    },
}

impl fmt::Display for RegisterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::IncompleteOverride { missing } => {
                write!(f, "override is missing required operations: ")?;
                for (i, name) in missing.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{name}")?;
                }
                Ok(())
            }
            Self::SelfTestFailed { stage, source } => {
                write!(f, "override self-test failed in {stage}(): {source}")
            }
        }
    }
}

impl Error for RegisterError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::SelfTestFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Failure raised by a user override while handling a callback.
///
/// The mediator never inspects or retries these; it hands them back to
/// whoever drove the dispatch. A foreign error (a Python exception, a C
/// return code) travels unchanged as the [`source`](Error::source).
#[derive(Debug)]
pub struct OverrideError {
    reason: String,
    source: Option<Box<dyn Error + Send + Sync + 'static>>,
}

impl OverrideError {
    /// An error described only by a message.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            source: None,
        }
    }

    /// An error wrapping the original failure.
    pub fn with_source(
        reason: impl Into<String>,
        source: impl Into<Box<dyn Error + Send + Sync + 'static>>,
    ) -> Self {
        Self {
            reason: reason.into(),
            source: Some(source.into()),
        }
    }

    /// Human-readable description.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Take ownership of the wrapped error, if any.
    pub fn into_source(self) -> Option<Box<dyn Error + Send + Sync + 'static>> {
        self.source
    }
}

impl fmt::Display for OverrideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.reason)
    }
}

impl Error for OverrideError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}

/// Errors in the CORSIKA configuration or the override search paths.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The output filename buffer was empty.
    EmptyFilename,
    /// The host passed a non-positive filename length.
    InvalidFilenameLength {
        /// The length as passed by the host.
        length: i64,
    },
    /// The filename consisted only of whitespace.
    BlankFilename,
    /// The filename was not valid UTF-8.
    FilenameNotUtf8,
    /// The THIN option was never set, so the subblock size is unknown.
    ThinningUnknown,
    /// A required environment variable is not set.
    MissingVariable {
        /// Variable name.
        name: &'static str,
    },
    /// The override file was not found in any search location.
    OverrideNotFound {
        /// The override file name that was searched for.
        file: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyFilename => write!(f, "CORSIKA filename is empty"),
            Self::InvalidFilenameLength { length } => {
                write!(f, "CORSIKA filename length {length} is invalid")
            }
            Self::BlankFilename => write!(f, "CORSIKA filename contains only whitespace"),
            Self::FilenameNotUtf8 => write!(f, "CORSIKA filename is not valid UTF-8"),
            Self::ThinningUnknown => write!(f, "CORSIKA option THIN not set"),
            Self::MissingVariable { name } => {
                write!(f, "environment variable {name} is not set")
            }
            Self::OverrideNotFound { file } => write!(f, "cannot find override file {file}"),
        }
    }
}

impl Error for ConfigError {}
