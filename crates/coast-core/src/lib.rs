//! Core types for intercepting CORSIKA COAST callbacks.
//!
//! This is the leaf crate of the workspace. It defines the value records
//! handed to user code ([`Particle`], [`Interaction`]), the capture gates
//! the host consults before each callback, the [`Override`] trait users
//! implement, and the [`Mediator`] that turns the host's flat-argument
//! calls into record-based override calls.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod gate;
pub mod mediator;
pub mod overrides;
pub mod probe;
pub mod record;

pub use config::{CorsikaConfig, CorsikaOption, SearchPaths};
pub use error::{ConfigError, OverrideError, RegisterError};
pub use gate::{Capture, CaptureGates, HostGates, StandaloneGates, Toggles};
pub use mediator::{Mediator, MediatorState};
pub use overrides::{check_operations, DefaultOverride, Override, REQUIRED_OPERATIONS};
pub use probe::{run_probe, ProbeReport};
pub use record::{Interaction, Particle};
