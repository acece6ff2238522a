//! Capture gates: per-callback switches the host checks before dispatching.
//!
//! The gate state belongs to the host. Overrides only flip switches, through
//! the [`Toggles`] handle passed into every override call. Two strategies
//! implement [`CaptureGates`]:
//!
//! - [`HostGates`]: atomic flags read by the host before each callback.
//! - [`StandaloneGates`]: used when no host is attached. Every toggle logs
//!   a warning and changes nothing, so override logic can be exercised
//!   outside a simulation run.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// The callback kinds that can be switched off.
///
/// `init` and `close` are always delivered and have no gate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Capture {
    /// Subblock writes (`wrida_`).
    Write,
    /// Interaction reports (`interaction_`).
    Interaction,
    /// Particle tracks (`track_`).
    Track,
}

impl Capture {
    /// All gated callback kinds.
    pub const ALL: [Capture; 3] = [Capture::Write, Capture::Interaction, Capture::Track];

    /// Name of the gated override operation.
    pub fn operation(self) -> &'static str {
        match self {
            Self::Write => "write",
            Self::Interaction => "interaction",
            Self::Track => "track",
        }
    }
}

impl fmt::Display for Capture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.operation())
    }
}

/// Strategy for applying toggle requests.
pub trait CaptureGates: Send + Sync {
    /// Turn delivery of `capture` callbacks on or off.
    fn set_capture(&self, capture: Capture, enabled: bool);
}

impl<T: CaptureGates + ?Sized> CaptureGates for &T {
    fn set_capture(&self, capture: Capture, enabled: bool) {
        (**self).set_capture(capture, enabled)
    }
}

impl<T: CaptureGates + ?Sized> CaptureGates for Arc<T> {
    fn set_capture(&self, capture: Capture, enabled: bool) {
        (**self).set_capture(capture, enabled)
    }
}

/// Gate flags owned by the host process. All gates start open.
#[derive(Debug)]
pub struct HostGates {
    write: AtomicBool,
    interaction: AtomicBool,
    track: AtomicBool,
}

impl HostGates {
    /// Create a gate set with every gate open.
    pub const fn new() -> Self {
        Self {
            write: AtomicBool::new(true),
            interaction: AtomicBool::new(true),
            track: AtomicBool::new(true),
        }
    }

    fn flag(&self, capture: Capture) -> &AtomicBool {
        match capture {
            Capture::Write => &self.write,
            Capture::Interaction => &self.interaction,
            Capture::Track => &self.track,
        }
    }

    /// Whether the host should currently deliver `capture` callbacks.
    pub fn is_capturing(&self, capture: Capture) -> bool {
        self.flag(capture).load(Ordering::Acquire)
    }

    /// Reopen every gate.
    pub fn reset(&self) {
        for capture in Capture::ALL {
            self.flag(capture).store(true, Ordering::Release);
        }
    }
}

impl Default for HostGates {
    fn default() -> Self {
        Self::new()
    }
}

impl CaptureGates for HostGates {
    fn set_capture(&self, capture: Capture, enabled: bool) {
        log::debug!(
            "{} capture {}",
            capture,
            if enabled { "enabled" } else { "disabled" }
        );
        self.flag(capture).store(enabled, Ordering::Release);
    }
}

/// Gates used when no host is attached.
///
/// Toggles are accepted and ignored; each one logs a warning. The number
/// of ignored requests is kept for inspection.
#[derive(Debug, Default)]
pub struct StandaloneGates {
    ignored: AtomicU64,
}

impl StandaloneGates {
    /// Create standalone gates.
    pub const fn new() -> Self {
        Self {
            ignored: AtomicU64::new(0),
        }
    }

    /// Number of toggle requests ignored so far.
    pub fn ignored(&self) -> u64 {
        self.ignored.load(Ordering::Relaxed)
    }
}

impl CaptureGates for StandaloneGates {
    fn set_capture(&self, capture: Capture, enabled: bool) {
        self.ignored.fetch_add(1, Ordering::Relaxed);
        log::warn!(
            "not in embedding mode: {} {} capture is ineffective",
            if enabled { "enabling" } else { "disabling" },
            capture
        );
    }
}

/// Handle overrides use to switch callback delivery.
///
/// Borrowed from the mediator for the duration of one override call.
#[derive(Clone, Copy)]
pub struct Toggles<'a> {
    gates: &'a dyn CaptureGates,
}

impl<'a> Toggles<'a> {
    /// Wrap a gate strategy.
    pub fn new(gates: &'a dyn CaptureGates) -> Self {
        Self { gates }
    }

    /// Switch one gate.
    pub fn set(&self, capture: Capture, enabled: bool) {
        self.gates.set_capture(capture, enabled);
    }

    /// Stop the host from calling `write`.
    pub fn disable_write(&self) {
        self.set(Capture::Write, false);
    }

    /// Let the host call `write` again.
    pub fn enable_write(&self) {
        self.set(Capture::Write, true);
    }

    /// Stop the host from calling `interaction`.
    pub fn disable_interaction(&self) {
        self.set(Capture::Interaction, false);
    }

    /// Let the host call `interaction` again.
    pub fn enable_interaction(&self) {
        self.set(Capture::Interaction, true);
    }

    /// Stop the host from calling `track`.
    pub fn disable_track(&self) {
        self.set(Capture::Track, false);
    }

    /// Let the host call `track` again.
    pub fn enable_track(&self) {
        self.set(Capture::Track, true);
    }

    /// Close every gate.
    pub fn disable_all(&self) {
        for capture in Capture::ALL {
            self.set(capture, false);
        }
    }
}

impl fmt::Debug for Toggles<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toggles").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_gates_start_open() {
        let gates = HostGates::new();
        for capture in Capture::ALL {
            assert!(gates.is_capturing(capture));
        }
    }

    #[test]
    fn gates_are_independent() {
        let gates = HostGates::new();
        let toggles = Toggles::new(&gates);
        toggles.disable_interaction();
        assert!(gates.is_capturing(Capture::Write));
        assert!(!gates.is_capturing(Capture::Interaction));
        assert!(gates.is_capturing(Capture::Track));

        toggles.enable_interaction();
        assert!(gates.is_capturing(Capture::Interaction));
    }

    #[test]
    fn disable_all_then_reset() {
        let gates = HostGates::new();
        Toggles::new(&gates).disable_all();
        for capture in Capture::ALL {
            assert!(!gates.is_capturing(capture));
        }
        gates.reset();
        for capture in Capture::ALL {
            assert!(gates.is_capturing(capture));
        }
    }

    #[test]
    fn standalone_toggles_never_fail_and_are_counted() {
        let gates = StandaloneGates::new();
        let toggles = Toggles::new(&gates);
        toggles.disable_write();
        toggles.enable_write();
        toggles.disable_interaction();
        toggles.enable_interaction();
        toggles.disable_track();
        toggles.enable_track();
        assert_eq!(gates.ignored(), 6);
    }

    #[test]
    fn arc_gates_share_state() {
        let gates = Arc::new(HostGates::new());
        let shared: Box<dyn CaptureGates> = Box::new(Arc::clone(&gates));
        Toggles::new(shared.as_ref()).disable_track();
        assert!(!gates.is_capturing(Capture::Track));
    }

    #[test]
    fn capture_names_match_operations() {
        assert_eq!(Capture::Write.to_string(), "write");
        assert_eq!(Capture::Interaction.operation(), "interaction");
        assert_eq!(Capture::Track.operation(), "track");
    }
}
