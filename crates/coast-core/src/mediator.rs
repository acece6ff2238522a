//! The [`Mediator`]: owns the active override and forwards host callbacks.
//!
//! The host speaks in flat positional arguments; overrides receive records.
//! The mediator builds the records, hands the override a [`Toggles`] handle
//! bound to the configured gate strategy, and returns whatever the override
//! returns.
//!
//! Dispatch is sequential and non-reentrant. The host is expected to call
//! one entry point at a time; callers that share a mediator across threads
//! must wrap it in their own lock.

use crate::error::{OverrideError, RegisterError};
use crate::gate::{CaptureGates, StandaloneGates, Toggles};
use crate::overrides::{DefaultOverride, Override};
use crate::probe::{run_probe, ProbeReport};
use crate::record::{Interaction, Particle};

/// Which kind of override is currently installed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediatorState {
    /// The [`DefaultOverride`] is active.
    Unconfigured,
    /// A user override has been registered.
    Configured,
}

/// Holds exactly one active override and forwards callbacks to it.
pub struct Mediator {
    active: Box<dyn Override>,
    gates: Box<dyn CaptureGates>,
    state: MediatorState,
}

impl Mediator {
    /// Create a mediator with the default override and the given gates.
    pub fn new(gates: impl CaptureGates + 'static) -> Self {
        Self {
            active: Box::new(DefaultOverride),
            gates: Box::new(gates),
            state: MediatorState::Unconfigured,
        }
    }

    /// Create a mediator for use outside a host process.
    pub fn standalone() -> Self {
        Self::new(StandaloneGates::new())
    }

    /// Current state.
    pub fn state(&self) -> MediatorState {
        self.state
    }

    /// Whether a user override has been registered.
    pub fn is_configured(&self) -> bool {
        self.state == MediatorState::Configured
    }

    /// Install `candidate` as the active override.
    ///
    /// The previous override is dropped unconditionally. With `run_test`,
    /// the new override is then driven through one synthetic callback
    /// sequence against isolated gates (see [`run_probe`]); a probe failure
    /// is reported but the override stays installed.
    pub fn register(
        &mut self,
        candidate: Box<dyn Override>,
        run_test: bool,
    ) -> Result<Option<ProbeReport>, RegisterError> {
        self.active = candidate;
        self.state = MediatorState::Configured;
        log::info!("override registered");

        if !run_test {
            return Ok(None);
        }
        log::info!("running override self-test");
        let report = run_probe(self.active.as_mut())?;
        log::info!(
            "override self-test passed: {} calls, {} toggles",
            report.calls,
            report.toggled.len()
        );
        Ok(Some(report))
    }

    /// Forward `init`.
    pub fn dispatch_init(&mut self) -> Result<(), OverrideError> {
        let toggles = Toggles::new(self.gates.as_ref());
        self.active.init(&toggles)
    }

    /// Forward `close`.
    pub fn dispatch_close(&mut self) -> Result<(), OverrideError> {
        let toggles = Toggles::new(self.gates.as_ref());
        self.active.close(&toggles)
    }

    /// Forward one subblock. The length is the host's business and is not
    /// checked.
    pub fn dispatch_write(&mut self, subblock: &[u8]) -> Result<(), OverrideError> {
        let toggles = Toggles::new(self.gates.as_ref());
        self.active.write(&toggles, subblock)
    }

    /// Build an [`Interaction`] from the flat host arguments and forward it.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch_interaction(
        &mut self,
        x: f64,
        y: f64,
        z: f64,
        total_energy: f64,
        cross_section: f64,
        elasticity: f64,
        projectile_id: i32,
        target_id: i32,
    ) -> Result<(), OverrideError> {
        let info = Interaction::new(
            x,
            y,
            z,
            total_energy,
            cross_section,
            elasticity,
            projectile_id,
            target_id,
        );
        let toggles = Toggles::new(self.gates.as_ref());
        self.active.interaction(&toggles, &info)
    }

    /// Build the `pre` and `post` [`Particle`]s from two flat field groups
    /// and forward both in one call.
    #[allow(clippy::too_many_arguments)]
    pub fn dispatch_track(
        &mut self,
        pre_time: f64,
        pre_x: f64,
        pre_y: f64,
        pre_z: f64,
        pre_depth: f64,
        pre_energy: f64,
        pre_weight: f64,
        pre_id: i32,
        pre_hadronic_generation: i32,
        post_time: f64,
        post_x: f64,
        post_y: f64,
        post_z: f64,
        post_depth: f64,
        post_energy: f64,
        post_weight: f64,
        post_id: i32,
        post_hadronic_generation: i32,
    ) -> Result<(), OverrideError> {
        let pre = Particle::new(
            pre_time,
            pre_x,
            pre_y,
            pre_z,
            pre_depth,
            pre_energy,
            pre_weight,
            pre_id,
            pre_hadronic_generation,
        );
        let post = Particle::new(
            post_time,
            post_x,
            post_y,
            post_z,
            post_depth,
            post_energy,
            post_weight,
            post_id,
            post_hadronic_generation,
        );
        let toggles = Toggles::new(self.gates.as_ref());
        self.active.track(&toggles, &pre, &post)
    }
}

impl Default for Mediator {
    fn default() -> Self {
        Self::standalone()
    }
}

impl std::fmt::Debug for Mediator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mediator")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
