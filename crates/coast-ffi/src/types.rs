//! C-compatible records and enums passed to C overrides.

use coast_core::{Capture, Interaction, Particle};

/// Callback kind selector for `coast_is_capturing` and `CoastToggles`.
#[repr(i32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoastCapture {
    /// Subblock writes.
    Write = 0,
    /// Interaction reports.
    Interaction = 1,
    /// Particle tracks.
    Track = 2,
}

impl CoastCapture {
    /// Decode a raw discriminant coming from C.
    ///
    /// Returns `None` for values outside the enum so that an invalid C
    /// value never becomes an invalid Rust enum.
    pub fn from_raw(raw: i32) -> Option<Self> {
        match raw {
            0 => Some(Self::Write),
            1 => Some(Self::Interaction),
            2 => Some(Self::Track),
            _ => None,
        }
    }
}

impl From<CoastCapture> for Capture {
    fn from(c: CoastCapture) -> Self {
        match c {
            CoastCapture::Write => Capture::Write,
            CoastCapture::Interaction => Capture::Interaction,
            CoastCapture::Track => Capture::Track,
        }
    }
}

impl From<Capture> for CoastCapture {
    fn from(c: Capture) -> Self {
        match c {
            Capture::Write => CoastCapture::Write,
            Capture::Interaction => CoastCapture::Interaction,
            Capture::Track => CoastCapture::Track,
        }
    }
}

/// Particle snapshot as seen by a C `track_fn`.
///
/// Same field order as the COAST `CParticle` class.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoastParticle {
    /// Position, cm.
    pub x: f64,
    /// Position, cm.
    pub y: f64,
    /// Position, cm.
    pub z: f64,
    /// Traversed atmospheric depth, g/cm².
    pub depth: f64,
    /// Time since first interaction, s.
    pub time: f64,
    /// Energy, GeV.
    pub energy: f64,
    /// Thinning weight.
    pub weight: f64,
    /// CORSIKA particle code.
    pub particle_id: i32,
    /// Hadronic generation counter.
    pub hadronic_generation: i32,
}

/// Interaction report as seen by a C `interaction_fn`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CoastInteraction {
    /// Position, cm.
    pub x: f64,
    /// Position, cm.
    pub y: f64,
    /// Position, cm.
    pub z: f64,
    /// Total energy, GeV.
    pub etot: f64,
    /// Cross-section, mb.
    pub sigma: f64,
    /// Elasticity.
    pub kela: f64,
    /// Projectile particle code.
    pub proj_id: i32,
    /// Target particle code.
    pub target_id: i32,
}

const _: () = assert!(std::mem::size_of::<CoastParticle>() == 64);
const _: () = assert!(std::mem::align_of::<CoastParticle>() == 8);
const _: () = assert!(std::mem::size_of::<CoastInteraction>() == 56);
const _: () = assert!(std::mem::align_of::<CoastInteraction>() == 8);

impl From<&Particle> for CoastParticle {
    fn from(p: &Particle) -> Self {
        let [x, y, z] = p.position();
        Self {
            x,
            y,
            z,
            depth: p.atmospheric_depth(),
            time: p.time(),
            energy: p.energy(),
            weight: p.weight(),
            particle_id: p.particle_id(),
            hadronic_generation: p.hadronic_generation(),
        }
    }
}

impl From<&Interaction> for CoastInteraction {
    fn from(i: &Interaction) -> Self {
        let [x, y, z] = i.position();
        Self {
            x,
            y,
            z,
            etot: i.total_energy(),
            sigma: i.cross_section(),
            kela: i.elasticity(),
            proj_id: i.projectile_id(),
            target_id: i.target_id(),
        }
    }
}
