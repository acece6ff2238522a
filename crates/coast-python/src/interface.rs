//! The `Interface` mediator object and the Python override bridge.
//!
//! An `Interface` either owns a standalone [`Mediator`] or, for the module
//! `instance` in an `embedded` build, borrows the one the COAST hooks
//! dispatch to. A Python override is wrapped in `PyOverride`, which calls
//! the object's methods under the GIL and passes any toggles it made back
//! to the mediator's [`Toggles`].

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, TryLockError};

use coast_core::{
    check_operations, Mediator, Override, OverrideError, ProbeReport, SearchPaths, Toggles,
};
use pyo3::exceptions::{PyRuntimeError, PyTypeError};
use pyo3::prelude::*;
use pyo3::types::{PyBytes, PyDict, PyTuple, PyType};

use crate::error::{config_error, override_error, register_error};
use crate::record::{Interaction, Particle};
use crate::toggles::forward_requests;

/// Base class for user overrides.
///
/// Subclasses must define `init(self)`, `close(self)`, `write(self,
/// subblock)`, `interaction(self, info)` and `track(self, pre, post)`.
/// Registration fails with `TypeError` if any is missing.
#[pyclass(name = "Override", module = "_coast", subclass)]
pub(crate) struct OverrideBase;

#[pymethods]
impl OverrideBase {
    #[new]
    #[pyo3(signature = (*_args, **_kwargs))]
    fn new(_args: &Bound<'_, PyTuple>, _kwargs: Option<&Bound<'_, PyDict>>) -> Self {
        OverrideBase
    }
}

/// Outcome of a self-test run by `patch(..., runtest=True)`.
#[pyclass(module = "_coast", frozen)]
pub(crate) struct SelfTestReport {
    /// Override calls delivered.
    #[pyo3(get)]
    calls: usize,
    /// Callbacks withheld because the override had silenced them.
    #[pyo3(get)]
    skipped: Vec<&'static str>,
    /// `(callback, enabled)` toggles the override made, in order.
    #[pyo3(get)]
    toggled: Vec<(&'static str, bool)>,
}

impl From<ProbeReport> for SelfTestReport {
    fn from(report: ProbeReport) -> Self {
        Self {
            calls: report.calls,
            skipped: report.skipped.iter().map(|c| c.operation()).collect(),
            toggled: report
                .toggled
                .iter()
                .map(|&(c, enabled)| (c.operation(), enabled))
                .collect(),
        }
    }
}

#[pymethods]
impl SelfTestReport {
    fn __repr__(&self) -> String {
        format!(
            "SelfTestReport(calls={}, skipped={:?}, toggled={:?})",
            self.calls, self.skipped, self.toggled
        )
    }
}

/// A Python object standing in as an [`Override`].
struct PyOverride {
    obj: Py<PyAny>,
}

impl PyOverride {
    fn invoke(
        &self,
        toggles: &Toggles<'_>,
        operation: &'static str,
        call: impl for<'py> FnOnce(&Bound<'py, PyAny>) -> PyResult<Bound<'py, PyAny>>,
    ) -> Result<(), OverrideError> {
        let result = forward_requests(toggles, || {
            Python::attach(|py| call(self.obj.bind(py)).map(drop))
        });
        result.map_err(|err| {
            OverrideError::with_source(format!("{operation}() raised an exception"), err)
        })
    }
}

impl Override for PyOverride {
    fn init(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        self.invoke(toggles, "init", |obj| obj.call_method0("init"))
    }

    fn close(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        self.invoke(toggles, "close", |obj| obj.call_method0("close"))
    }

    fn write(&mut self, toggles: &Toggles<'_>, subblock: &[u8]) -> Result<(), OverrideError> {
        self.invoke(toggles, "write", |obj| {
            obj.call_method1("write", (PyBytes::new(obj.py(), subblock),))
        })
    }

    fn interaction(
        &mut self,
        toggles: &Toggles<'_>,
        info: &coast_core::Interaction,
    ) -> Result<(), OverrideError> {
        self.invoke(toggles, "interaction", |obj| {
            obj.call_method1("interaction", (Interaction::from(*info),))
        })
    }

    fn track(
        &mut self,
        toggles: &Toggles<'_>,
        pre: &coast_core::Particle,
        post: &coast_core::Particle,
    ) -> Result<(), OverrideError> {
        self.invoke(toggles, "track", |obj| {
            obj.call_method1("track", (Particle::from(*pre), Particle::from(*post)))
        })
    }
}

/// Where an [`Interface`] keeps its override.
enum Slot {
    /// A mediator of its own, on standalone gates.
    Local(Mutex<Mediator>),
    /// The mediator behind the COAST hooks.
    #[cfg(feature = "embedded")]
    Host,
}

impl Slot {
    fn with<R>(&self, f: impl FnOnce(&mut Mediator) -> R) -> PyResult<R> {
        match self {
            Self::Local(mediator) => {
                let mut guard = lock(mediator)?;
                Ok(f(&mut guard))
            }
            #[cfg(feature = "embedded")]
            Self::Host => coast_ffi::with_mediator(f).map_err(|status| match status {
                coast_ffi::CoastStatus::Reentrant => busy(),
                status => PyRuntimeError::new_err(format!("COAST host unavailable ({status:?})")),
            }),
        }
    }
}

fn busy() -> PyErr {
    PyRuntimeError::new_err("Interface called from inside an override callback")
}

fn lock(mediator: &Mutex<Mediator>) -> PyResult<MutexGuard<'_, Mediator>> {
    match mediator.try_lock() {
        Ok(guard) => Ok(guard),
        Err(TryLockError::WouldBlock) => Err(busy()),
        Err(TryLockError::Poisoned(_)) => Err(PyRuntimeError::new_err(
            "Interface state poisoned by an earlier panic",
        )),
    }
}

/// Holds the active override and forwards host callbacks to it.
///
/// The module-level `instance` is the one the host drives; separate
/// instances are useful for testing an override in isolation.
#[pyclass(module = "_coast", frozen)]
pub(crate) struct Interface {
    slot: Slot,
}

impl Interface {
    /// The process-wide `instance`: the host's mediator when embedded.
    pub(crate) fn for_module() -> Self {
        #[cfg(feature = "embedded")]
        {
            Self { slot: Slot::Host }
        }
        #[cfg(not(feature = "embedded"))]
        {
            Self::new()
        }
    }
}

#[pymethods]
impl Interface {
    /// Create a standalone interface with the default override installed.
    #[new]
    pub(crate) fn new() -> Self {
        Self {
            slot: Slot::Local(Mutex::new(Mediator::standalone())),
        }
    }

    /// Instantiate `classtype(*args, **kwargs)` and register it.
    ///
    /// Returns a `SelfTestReport` when `runtest` is true, else `None`.
    #[pyo3(signature = (classtype, runtest=false, *args, **kwargs))]
    fn patch(
        &self,
        py: Python<'_>,
        classtype: &Bound<'_, PyAny>,
        runtest: bool,
        args: &Bound<'_, PyTuple>,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Option<SelfTestReport>> {
        if !classtype.is_instance_of::<PyType>() {
            return Err(PyTypeError::new_err(
                "patch() expects an override class, not an instance; use register() for instances",
            ));
        }
        let obj = classtype.call(args.clone(), kwargs)?;
        self.register(py, obj, runtest)
    }

    /// Register an already constructed override object.
    #[pyo3(signature = (obj, runtest=false))]
    fn register(
        &self,
        py: Python<'_>,
        obj: Bound<'_, PyAny>,
        runtest: bool,
    ) -> PyResult<Option<SelfTestReport>> {
        check_operations(|op| {
            obj.getattr(op)
                .map(|attr| attr.is_callable())
                .unwrap_or(false)
        })
        .map_err(|e| register_error(py, e))?;

        let candidate = Box::new(PyOverride { obj: obj.unbind() });
        let result = self.slot.with(|m| m.register(candidate, runtest))?;
        match result {
            Ok(report) => Ok(report.map(SelfTestReport::from)),
            Err(e) => Err(register_error(py, e)),
        }
    }

    /// Whether a user override has replaced the default one.
    #[getter]
    fn configured(&self) -> PyResult<bool> {
        self.slot.with(|m| m.is_configured())
    }

    fn _init(&self) -> PyResult<()> {
        let result = self.slot.with(|m| m.dispatch_init())?;
        result.map_err(override_error)
    }

    fn _close(&self) -> PyResult<()> {
        let result = self.slot.with(|m| m.dispatch_close())?;
        result.map_err(override_error)
    }

    fn _write(&self, subblock: &[u8]) -> PyResult<()> {
        let result = self.slot.with(|m| m.dispatch_write(subblock))?;
        result.map_err(override_error)
    }

    #[allow(clippy::too_many_arguments)]
    fn _interaction(
        &self,
        x: f64,
        y: f64,
        z: f64,
        etot: f64,
        sigma: f64,
        kela: f64,
        projectile_id: i32,
        target_id: i32,
    ) -> PyResult<()> {
        let result = self.slot.with(|m| {
            m.dispatch_interaction(x, y, z, etot, sigma, kela, projectile_id, target_id)
        })?;
        result.map_err(override_error)
    }

    #[allow(clippy::too_many_arguments)]
    fn _track(
        &self,
        t_1: f64,
        x_1: f64,
        y_1: f64,
        z_1: f64,
        depth_1: f64,
        energy_1: f64,
        weight_1: f64,
        id_1: i32,
        hadgen_1: i32,
        t_2: f64,
        x_2: f64,
        y_2: f64,
        z_2: f64,
        depth_2: f64,
        energy_2: f64,
        weight_2: f64,
        id_2: i32,
        hadgen_2: i32,
    ) -> PyResult<()> {
        let result = self.slot.with(|m| {
            m.dispatch_track(
                t_1, x_1, y_1, z_1, depth_1, energy_1, weight_1, id_1, hadgen_1, t_2, x_2, y_2,
                z_2, depth_2, energy_2, weight_2, id_2, hadgen_2,
            )
        })?;
        result.map_err(override_error)
    }

    fn __repr__(&self) -> String {
        match self.slot.with(|m| m.state()) {
            Ok(state) => format!("Interface(state={state:?})"),
            Err(_) => "Interface(<busy>)".to_owned(),
        }
    }
}

/// Path of the user override file.
///
/// Looks in `$CORSIKA_PYTHON_INTERFACE`, then `$COAST_USER_LIB`. Raises
/// `FileNotFoundError` if neither holds the file and `ValueError` if
/// `COAST_USER_LIB` is unset.
#[pyfunction]
#[pyo3(signature = (filename=None))]
pub(crate) fn locate_override(filename: Option<String>) -> PyResult<PathBuf> {
    let mut paths = SearchPaths::from_env();
    if let Some(name) = filename {
        paths = paths.with_override_file(name);
    }
    paths.resolve_override().map_err(config_error)
}

/// `$COAST_USER_LIB/python/packages`, where helper packages live.
#[pyfunction]
pub(crate) fn packages_path() -> PyResult<PathBuf> {
    SearchPaths::from_env().packages_dir().map_err(config_error)
}
