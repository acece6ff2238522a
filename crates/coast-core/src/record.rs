//! Value records handed to overrides: [`Particle`] and [`Interaction`].
//!
//! Both are built once per callback from the host's flat arguments and
//! dropped when the callback returns. Fields are private; there are no
//! setters.

/// Snapshot of a particle at one end of a simulation step.
///
/// A track callback carries two of these: `pre` (start of the step) and
/// `post` (end of the step).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Particle {
    time: f64,
    position: [f64; 3],
    atmospheric_depth: f64,
    energy: f64,
    weight: f64,
    particle_id: i32,
    hadronic_generation: i32,
}

impl Particle {
    /// Build a particle snapshot. Every field is required.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: f64,
        x: f64,
        y: f64,
        z: f64,
        atmospheric_depth: f64,
        energy: f64,
        weight: f64,
        particle_id: i32,
        hadronic_generation: i32,
    ) -> Self {
        Self {
            time,
            position: [x, y, z],
            atmospheric_depth,
            energy,
            weight,
            particle_id,
            hadronic_generation,
        }
    }

    /// Time since the first interaction, in seconds.
    pub fn time(&self) -> f64 {
        self.time
    }

    /// `[x, y, z]` in meters.
    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    /// Traversed atmospheric depth in g/cm^2.
    pub fn atmospheric_depth(&self) -> f64 {
        self.atmospheric_depth
    }

    /// Total energy.
    pub fn energy(&self) -> f64 {
        self.energy
    }

    /// Thinning weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Particle type in CORSIKA numbering.
    pub fn particle_id(&self) -> i32 {
        self.particle_id
    }

    /// Hadronic generation counter.
    pub fn hadronic_generation(&self) -> i32 {
        self.hadronic_generation
    }
}

/// One hadronic or electromagnetic interaction in the shower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Interaction {
    position: [f64; 3],
    total_energy: f64,
    cross_section: f64,
    elasticity: f64,
    projectile_id: i32,
    target_id: i32,
}

impl Interaction {
    /// Build an interaction record. Every field is required.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x: f64,
        y: f64,
        z: f64,
        total_energy: f64,
        cross_section: f64,
        elasticity: f64,
        projectile_id: i32,
        target_id: i32,
    ) -> Self {
        Self {
            position: [x, y, z],
            total_energy,
            cross_section,
            elasticity,
            projectile_id,
            target_id,
        }
    }

    /// `[x, y, z]` in meters.
    pub fn position(&self) -> [f64; 3] {
        self.position
    }

    /// Total energy in the lab frame.
    pub fn total_energy(&self) -> f64 {
        self.total_energy
    }

    /// Cross section of the process.
    pub fn cross_section(&self) -> f64 {
        self.cross_section
    }

    /// Elasticity.
    pub fn elasticity(&self) -> f64 {
        self.elasticity
    }

    /// Projectile type in CORSIKA numbering.
    pub fn projectile_id(&self) -> i32 {
        self.projectile_id
    }

    /// Target type in CORSIKA numbering.
    pub fn target_id(&self) -> i32 {
        self.target_id
    }
}
