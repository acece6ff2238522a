//! Python bindings for writing COAST overrides.
//!
//! The native extension is named `_coast`. A user script subclasses
//! `Override`, implements `init`, `close`, `write`, `interaction` and
//! `track`, and installs it with `_coast.patch(MyOverride)`.
//!
//! Built with the `embedded` feature, the extension also carries the COAST
//! hook symbols and `_coast.instance` shares their mediator, so the patched
//! override receives CORSIKA's callbacks directly. Otherwise a test script
//! drives `instance` through its `_init`, `_write`, `_interaction`, `_track`
//! and `_close` methods.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

use pyo3::prelude::*;

mod error;
mod interface;
mod record;
mod toggles;

fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .try_init();
}

/// The native `_coast` extension module.
#[pymodule]
fn _coast(m: &Bound<'_, PyModule>) -> PyResult<()> {
    init_logging();

    // Records
    m.add_class::<record::Particle>()?;
    m.add_class::<record::Interaction>()?;

    // Override plumbing
    m.add_class::<interface::OverrideBase>()?;
    m.add_class::<interface::Interface>()?;
    m.add_class::<interface::SelfTestReport>()?;

    let instance = Bound::new(m.py(), interface::Interface::for_module())?;
    m.add("patch", instance.getattr("patch")?)?;
    m.add("instance", instance)?;
    m.add("EMBEDDED", toggles::EMBEDDED)?;

    // Toggles
    m.add_function(wrap_pyfunction!(toggles::disable_write, m)?)?;
    m.add_function(wrap_pyfunction!(toggles::enable_write, m)?)?;
    m.add_function(wrap_pyfunction!(toggles::disable_interaction, m)?)?;
    m.add_function(wrap_pyfunction!(toggles::enable_interaction, m)?)?;
    m.add_function(wrap_pyfunction!(toggles::disable_track, m)?)?;
    m.add_function(wrap_pyfunction!(toggles::enable_track, m)?)?;
    m.add_function(wrap_pyfunction!(toggles::disable_all, m)?)?;
    for (name, alias) in toggles::ALIASES {
        m.add(alias, m.getattr(name)?)?;
    }

    // Search paths
    m.add_function(wrap_pyfunction!(interface::locate_override, m)?)?;
    m.add_function(wrap_pyfunction!(interface::packages_path, m)?)?;

    Ok(())
}
