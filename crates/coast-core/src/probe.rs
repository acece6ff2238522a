//! Self-test probe run by [`Mediator::register`](crate::Mediator::register)
//! when `run_test` is set.
//!
//! The probe plays one short, reproducible host session against an
//! override: `init`, a zeroed subblock of each supported size, one
//! interaction, one track, `close`. It honours its own gates the way the
//! host would, so an override that silences a callback in `init` is not
//! called for it. The live host gates are never touched.

use std::sync::Mutex;

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::{THINNED_SUBBLOCK_LEN, UNTHINNED_SUBBLOCK_LEN};
use crate::error::{OverrideError, RegisterError};
use crate::gate::{Capture, CaptureGates, HostGates, Toggles};
use crate::overrides::Override;
use crate::record::{Interaction, Particle};

const PROBE_SEED: u64 = 0x00C0_A575;

/// CORSIKA particle codes used for synthetic records: gamma, e+, e-,
/// mu+, mu-, proton, neutron.
const PROBE_PARTICLE_IDS: [i32; 7] = [1, 2, 3, 5, 6, 14, 13];

/// Outcome of a successful probe.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProbeReport {
    /// Override calls delivered.
    pub calls: usize,
    /// Gated calls withheld because the override had closed the gate.
    pub skipped: Vec<Capture>,
    /// Toggle requests made by the override, in order.
    pub toggled: Vec<(Capture, bool)>,
}

struct ProbeGates {
    flags: HostGates,
    requests: Mutex<Vec<(Capture, bool)>>,
}

impl CaptureGates for ProbeGates {
    fn set_capture(&self, capture: Capture, enabled: bool) {
        self.flags.set_capture(capture, enabled);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push((capture, enabled));
        }
    }
}

/// Uniform sample in `[0, 1)` from the top 53 bits.
fn unit(rng: &mut ChaCha8Rng) -> f64 {
    (rng.next_u64() >> 11) as f64 / (1u64 << 53) as f64
}

fn particle_id(rng: &mut ChaCha8Rng) -> i32 {
    PROBE_PARTICLE_IDS[(rng.next_u32() as usize) % PROBE_PARTICLE_IDS.len()]
}

fn synthetic_interaction(rng: &mut ChaCha8Rng) -> Interaction {
    Interaction::new(
        (unit(rng) - 0.5) * 1e4,
        (unit(rng) - 0.5) * 1e4,
        unit(rng) * 1e5,
        unit(rng) * 1e6,
        unit(rng) * 500.0,
        unit(rng),
        particle_id(rng),
        14,
    )
}

fn synthetic_track(rng: &mut ChaCha8Rng) -> (Particle, Particle) {
    let id = particle_id(rng);
    let generation = (rng.next_u32() % 50) as i32;
    let start = [
        (unit(rng) - 0.5) * 1e4,
        (unit(rng) - 0.5) * 1e4,
        unit(rng) * 1e5,
    ];
    let energy = unit(rng) * 1e3 + 1.0;
    let depth = unit(rng) * 1000.0;
    let pre = Particle::new(
        unit(rng) * 1e-4,
        start[0],
        start[1],
        start[2],
        depth,
        energy,
        1.0,
        id,
        generation,
    );
    let post = Particle::new(
        pre.time() + 1e-7,
        start[0] + 1.0,
        start[1] + 1.0,
        start[2] - 30.0,
        depth + 5.0,
        energy * 0.99,
        1.0,
        id,
        generation,
    );
    (pre, post)
}

fn fail(stage: &'static str) -> impl FnOnce(OverrideError) -> RegisterError {
    move |source| RegisterError::SelfTestFailed { stage, source }
}

/// Drive `target` through one synthetic session.
///
/// Stops at the first override error and reports which stage failed.
pub fn run_probe(target: &mut dyn Override) -> Result<ProbeReport, RegisterError> {
    let gates = ProbeGates {
        flags: HostGates::new(),
        requests: Mutex::new(Vec::new()),
    };
    let toggles = Toggles::new(&gates);
    let mut rng = ChaCha8Rng::seed_from_u64(PROBE_SEED);
    let mut report = ProbeReport::default();

    target.init(&toggles).map_err(fail("init"))?;
    report.calls += 1;

    for len in [THINNED_SUBBLOCK_LEN, UNTHINNED_SUBBLOCK_LEN] {
        if gates.flags.is_capturing(Capture::Write) {
            target
                .write(&toggles, &vec![0u8; len])
                .map_err(fail("write"))?;
            report.calls += 1;
        } else {
            report.skipped.push(Capture::Write);
        }
    }

    let info = synthetic_interaction(&mut rng);
    if gates.flags.is_capturing(Capture::Interaction) {
        target
            .interaction(&toggles, &info)
            .map_err(fail("interaction"))?;
        report.calls += 1;
    } else {
        report.skipped.push(Capture::Interaction);
    }

    let (pre, post) = synthetic_track(&mut rng);
    if gates.flags.is_capturing(Capture::Track) {
        target
            .track(&toggles, &pre, &post)
            .map_err(fail("track"))?;
        report.calls += 1;
    } else {
        report.skipped.push(Capture::Track);
    }

    target.close(&toggles).map_err(fail("close"))?;
    report.calls += 1;

    report.toggled = gates
        .requests
        .into_inner()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    Ok(report)
}
