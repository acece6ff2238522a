//! Python views of the callback records.

use pyo3::prelude::*;

/// Particle snapshot at one end of a track step.
///
/// Attributes follow the COAST names: `time`, `position`,
/// `atmosphericDepth`, `energy`, `weight`, `particleID`,
/// `hadronicGeneration`.
///
/// Args:
///     time, x, y, z, atmospheric_depth, energy, weight, particle_id,
///     hadronic_generation
#[pyclass(module = "_coast", frozen)]
#[derive(Clone, Copy)]
pub(crate) struct Particle {
    inner: coast_core::Particle,
}

impl From<coast_core::Particle> for Particle {
    fn from(inner: coast_core::Particle) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl Particle {
    #[new]
    #[allow(clippy::too_many_arguments)]
    fn new(
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
        coast_core::Particle::new(
            time,
            x,
            y,
            z,
            atmospheric_depth,
            energy,
            weight,
            particle_id,
            hadronic_generation,
        )
        .into()
    }

    /// Time since the first interaction, in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.inner.time()
    }

    /// `[x, y, z]`.
    #[getter]
    fn position(&self) -> [f64; 3] {
        self.inner.position()
    }

    /// Traversed depth in g/cm².
    #[getter(atmosphericDepth)]
    fn atmospheric_depth(&self) -> f64 {
        self.inner.atmospheric_depth()
    }

    #[getter]
    fn energy(&self) -> f64 {
        self.inner.energy()
    }

    #[getter]
    fn weight(&self) -> f64 {
        self.inner.weight()
    }

    /// CORSIKA particle code.
    #[getter(particleID)]
    fn particle_id(&self) -> i32 {
        self.inner.particle_id()
    }

    #[getter(hadronicGeneration)]
    fn hadronic_generation(&self) -> i32 {
        self.inner.hadronic_generation()
    }

    fn __eq__(&self, other: PyRef<'_, Self>) -> bool {
        self.inner == other.inner
    }

    fn __repr__(&self) -> String {
        let [x, y, z] = self.inner.position();
        format!(
            "Particle(id={}, time={}, position=[{x}, {y}, {z}], energy={})",
            self.inner.particle_id(),
            self.inner.time(),
            self.inner.energy()
        )
    }
}

/// One hadronic interaction.
///
/// Attributes: `position`, `labEnergy`, `crossSection`, `elasticity`,
/// `projectileID`, `targetID`.
///
/// Args:
///     x, y, z, total_energy, cross_section, elasticity, projectile_id,
///     target_id
#[pyclass(module = "_coast", frozen)]
#[derive(Clone, Copy)]
pub(crate) struct Interaction {
    inner: coast_core::Interaction,
}

impl From<coast_core::Interaction> for Interaction {
    fn from(inner: coast_core::Interaction) -> Self {
        Self { inner }
    }
}

#[pymethods]
impl Interaction {
    #[new]
    #[allow(clippy::too_many_arguments)]
    fn new(
        x: f64,
        y: f64,
        z: f64,
        total_energy: f64,
        cross_section: f64,
        elasticity: f64,
        projectile_id: i32,
        target_id: i32,
    ) -> Self {
        coast_core::Interaction::new(
            x,
            y,
            z,
            total_energy,
            cross_section,
            elasticity,
            projectile_id,
            target_id,
        )
        .into()
    }

    /// `[x, y, z]`.
    #[getter]
    fn position(&self) -> [f64; 3] {
        self.inner.position()
    }

    /// Lab-frame total energy.
    #[getter(labEnergy)]
    fn lab_energy(&self) -> f64 {
        self.inner.total_energy()
    }

    #[getter(crossSection)]
    fn cross_section(&self) -> f64 {
        self.inner.cross_section()
    }

    #[getter]
    fn elasticity(&self) -> f64 {
        self.inner.elasticity()
    }

    #[getter(projectileID)]
    fn projectile_id(&self) -> i32 {
        self.inner.projectile_id()
    }

    #[getter(targetID)]
    fn target_id(&self) -> i32 {
        self.inner.target_id()
    }

    fn __eq__(&self, other: PyRef<'_, Self>) -> bool {
        self.inner == other.inner
    }

    fn __repr__(&self) -> String {
        let [x, y, z] = self.inner.position();
        format!(
            "Interaction(projectile={}, target={}, position=[{x}, {y}, {z}], total_energy={})",
            self.inner.projectile_id(),
            self.inner.target_id(),
            self.inner.total_energy()
        )
    }
}
