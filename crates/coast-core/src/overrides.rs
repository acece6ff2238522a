//! The [`Override`] trait and the fallback [`DefaultOverride`].

use crate::error::{OverrideError, RegisterError};
use crate::gate::Toggles;
use crate::record::{Interaction, Particle};

/// Operation names every override must provide, in declaration order.
///
/// Used to validate overrides that arrive at runtime (C function tables,
/// Python objects) where the compiler cannot enforce completeness.
pub const REQUIRED_OPERATIONS: [&str; 5] = ["init", "close", "write", "interaction", "track"];

/// Validate a runtime-supplied override before it is installed.
///
/// `provides` answers whether the candidate implements the named
/// operation. Every missing operation is reported, not just the first.
pub fn check_operations(provides: impl Fn(&str) -> bool) -> Result<(), RegisterError> {
    let missing: Vec<&'static str> = REQUIRED_OPERATIONS
        .iter()
        .copied()
        .filter(|name| !provides(name))
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(RegisterError::IncompleteOverride { missing })
    }
}

/// User code attached to the COAST callbacks.
///
/// # Contract
///
/// - All five operations are required; there are no default bodies.
/// - `init` runs once before any other callback, `close` once at the end.
/// - `write`, `interaction` and `track` only run while their gate is open.
///   Use the [`Toggles`] handle to close a gate and save the per-call cost.
/// - Errors are returned to the host untouched.
///
/// # Examples
///
/// Count tracks and stop listening to everything else:
///
/// ```
/// use coast_core::{Interaction, Override, OverrideError, Particle, Toggles};
///
/// #[derive(Default)]
/// struct TrackCounter {
///     tracks: u64,
/// }
///
/// impl Override for TrackCounter {
///     fn init(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError> {
///         toggles.disable_write();
///         toggles.disable_interaction();
///         Ok(())
///     }
///     fn close(&mut self, _: &Toggles<'_>) -> Result<(), OverrideError> {
///         Ok(())
///     }
///     fn write(&mut self, _: &Toggles<'_>, _: &[u8]) -> Result<(), OverrideError> {
///         Ok(())
///     }
///     fn interaction(&mut self, _: &Toggles<'_>, _: &Interaction) -> Result<(), OverrideError> {
///         Ok(())
///     }
///     fn track(
///         &mut self,
///         _: &Toggles<'_>,
///         _pre: &Particle,
///         _post: &Particle,
///     ) -> Result<(), OverrideError> {
///         self.tracks += 1;
///         Ok(())
///     }
/// }
/// ```
pub trait Override: Send + 'static {
    /// Called once when the host initialises its output.
    fn init(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError>;

    /// Called once when the host finishes.
    fn close(&mut self, toggles: &Toggles<'_>) -> Result<(), OverrideError>;

    /// One opaque CORSIKA data subblock.
    ///
    /// 1248 bytes with thinning, 1092 without. The layout is not
    /// interpreted here.
    fn write(&mut self, toggles: &Toggles<'_>, subblock: &[u8]) -> Result<(), OverrideError>;

    /// One interaction in the shower.
    fn interaction(
        &mut self,
        toggles: &Toggles<'_>,
        info: &Interaction,
    ) -> Result<(), OverrideError>;

    /// One particle step, from `pre` to `post`.
    fn track(
        &mut self,
        toggles: &Toggles<'_>,
        pre: &Particle,
        post: &Particle,
    ) -> Result<(), OverrideError>;
}

/// Override installed until the user registers one.
///
/// Ignores `init` and `close`. The first `write`, `interaction` or `track`
/// closes its own gate, so an unconfigured run stops paying for callbacks
/// nobody listens to.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultOverride;

impl Override for DefaultOverride {
    fn init(&mut self, _toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        Ok(())
    }

    fn close(&mut self, _toggles: &Toggles<'_>) -> Result<(), OverrideError> {
        Ok(())
    }

    fn write(&mut self, toggles: &Toggles<'_>, _subblock: &[u8]) -> Result<(), OverrideError> {
        toggles.disable_write();
        Ok(())
    }

    fn interaction(
        &mut self,
        toggles: &Toggles<'_>,
        _info: &Interaction,
    ) -> Result<(), OverrideError> {
        toggles.disable_interaction();
        Ok(())
    }

    fn track(
        &mut self,
        toggles: &Toggles<'_>,
        _pre: &Particle,
        _post: &Particle,
    ) -> Result<(), OverrideError> {
        toggles.disable_track();
        Ok(())
    }
}
