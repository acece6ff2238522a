//! Test utilities and mock overrides for COAST hook development.
//!
//! Provides a [`RecordingOverride`] that logs every call it receives, a
//! [`FailingOverride`] that errors on a chosen operation, a
//! [`RecordingGates`] strategy that remembers toggle requests, record
//! fixtures, and [`capture_logs`] for asserting on diagnostics.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

use std::sync::{Arc, Mutex};

mod logs;

pub use logs::{capture_logs, Captured};

use coast_core::{
    Capture, CaptureGates, Interaction, Override, OverrideError, Particle, Toggles,
};

/// One call observed by a [`RecordingOverride`].
#[derive(Clone, Debug, PartialEq)]
pub enum Call {
    Init,
    Close,
    Write(Vec<u8>),
    Interaction(Interaction),
    Track(Particle, Particle),
}

/// Shared view of the calls a [`RecordingOverride`] has received.
///
/// Stays readable after the override itself has been moved into a
/// mediator.
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<Call>>>,
}

impl CallLog {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn push(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

/// Override that records every call.
pub struct RecordingOverride {
    log: CallLog,
    silence_on_init: bool,
}

impl RecordingOverride {
    /// A recorder and a handle to its log.
    pub fn new() -> (Self, CallLog) {
        let log = CallLog::default();
        (
            Self {
                log: log.clone(),
                silence_on_init: false,
            },
            log,
        )
    }

    /// A recorder that closes every gate from `init`.
    pub fn silencing_on_init() -> (Self, CallLog) {
        let (mut ov, log) = Self::new();
        ov.silence_on_init = true;
        (ov, log)
    }
}

impl Override for RecordingOverride {
    fn init(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        self.log.push(Call::Init);
        if self.silence_on_init {
            toggles.disable_all();
        }
        Ok(())
    }

    fn close(&mut self, _toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        self.log.push(Call::Close);
        Ok(())
    }

    fn write(&mut self, _toggles: &Toggles<'_>, subblock: &[u8]) -> Result<(), OverrideError> {
        self.log.push(Call::Write(subblock.to_vec()));
        Ok(())
    }

    fn interaction(
        &mut self,
        _toggles: &Toggles<'_>,
        info: &Interaction,
    ) -> Result<(), OverrideError> {
        self.log.push(Call::Interaction(*info));
        Ok(())
    }

    fn track(
        &mut self,
        _toggles: &Toggles<'_>,
        pre: &Particle,
        post: &Particle,
    ) -> Result<(), OverrideError> {
        self.log.push(Call::Track(*pre, *post));
        Ok(())
    }
}

/// Override that fails on one named operation and succeeds otherwise.
pub struct FailingOverride {
    operation: &'static str,
}

impl FailingOverride {
    /// Fail whenever `operation` (`"init"`, `"write"`, ...) is called.
    pub fn on(operation: &'static str) -> Self {
        Self { operation }
    }

    fn check(&self, operation: &str) -> Result<(), OverrideError> {
        if operation == self.operation {
            Err(OverrideError::new(format!("{operation} failed on purpose")))
        } else {
            Ok(())
        }
    }
}

impl Override for FailingOverride {
    fn init(&mut self, _: &Toggles<'_>) -> Result<(), OverrideError> {
        self.check("init")
    }

    fn close(&mut self, _: &Toggles<'_>) -> Result<(), OverrideError> {
        self.check("close")
    }

    fn write(&mut self, _: &Toggles<'_>, _: &[u8]) -> Result<(), OverrideError> {
        self.check("write")
    }

    fn interaction(&mut self, _: &Toggles<'_>, _: &Interaction) -> Result<(), OverrideError> {
        self.check("interaction")
    }

    fn track(&mut self, _: &Toggles<'_>, _: &Particle, _: &Particle) -> Result<(), OverrideError> {
        self.check("track")
    }
}

/// Gate strategy that only records requests.
#[derive(Default)]
pub struct RecordingGates {
    requests: Mutex<Vec<(Capture, bool)>>,
}

impl RecordingGates {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle requests in arrival order.
    pub fn requests(&self) -> Vec<(Capture, bool)> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of `enabled = false` requests for `capture`.
    pub fn disables(&self, capture: Capture) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|&&(c, enabled)| c == capture && !enabled)
            .count()
    }
}

impl CaptureGates for RecordingGates {
    fn set_capture(&self, capture: Capture, enabled: bool) {
        self.requests.lock().unwrap().push((capture, enabled));
    }
}

/// A plausible muon at the start of a step.
pub fn sample_pre() -> Particle {
    Particle::new(2.5e-5, 120.0, -40.0, 8_000.0, 310.0, 12.5, 1.0, 6, 3)
}

/// The same muon one step later.
pub fn sample_post() -> Particle {
    Particle::new(2.51e-5, 121.0, -39.5, 7_970.0, 314.0, 12.4, 1.0, 6, 3)
}

/// A proton-air interaction.
pub fn sample_interaction() -> Interaction {
    Interaction::new(0.0, 0.0, 25_000.0, 1.0e5, 280.0, 0.45, 14, 14)
}
