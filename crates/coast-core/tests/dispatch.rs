//! End-to-end dispatch through the mediator with recording mocks.

use std::sync::Arc;

use coast_core::{Capture, HostGates, Mediator, MediatorState, Particle, RegisterError};
use coast_test_utils::{Call, FailingOverride, RecordingGates, RecordingOverride};

fn host_mediator() -> (Mediator, Arc<HostGates>) {
    let gates = Arc::new(HostGates::new());
    (Mediator::new(Arc::clone(&gates)), gates)
}

#[test]
fn default_write_disables_write_exactly_once() {
    let gates = Arc::new(RecordingGates::new());
    let mut m = Mediator::new(Arc::clone(&gates));
    m.dispatch_write(&[0u8; 1248]).unwrap();
    assert_eq!(gates.requests(), vec![(Capture::Write, false)]);
    assert_eq!(gates.disables(Capture::Write), 1);
}

#[test]
fn default_overrides_silence_independently() {
    let gates = Arc::new(RecordingGates::new());
    let mut m = Mediator::new(Arc::clone(&gates));
    m.dispatch_interaction(0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1, 1)
        .unwrap();
    assert_eq!(gates.requests(), vec![(Capture::Interaction, false)]);

    m.dispatch_track(
        0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1, 0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1, 0,
    )
    .unwrap();
    assert_eq!(
        gates.requests(),
        vec![(Capture::Interaction, false), (Capture::Track, false)]
    );
    assert_eq!(gates.disables(Capture::Write), 0);
}

#[test]
fn interaction_uses_three_distinct_coordinates() {
    let mut m = Mediator::standalone();
    let (ov, log) = RecordingOverride::new();
    m.register(Box::new(ov), false).unwrap();
    m.dispatch_interaction(1.0, 2.0, 3.0, 10.0, 0.5, 0.9, 14, 14)
        .unwrap();
    match &log.calls()[..] {
        [Call::Interaction(info)] => {
            assert_eq!(info.position(), [1.0, 2.0, 3.0]);
            assert_eq!(info.total_energy(), 10.0);
            assert_eq!(info.cross_section(), 0.5);
            assert_eq!(info.elasticity(), 0.9);
            assert_eq!(info.projectile_id(), 14);
            assert_eq!(info.target_id(), 14);
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

#[test]
fn track_builds_independent_particles() {
    let mut m = Mediator::standalone();
    let (ov, log) = RecordingOverride::new();
    m.register(Box::new(ov), false).unwrap();
    m.dispatch_track(
        1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8, 9, 10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17, 18,
    )
    .unwrap();
    match &log.calls()[..] {
        [Call::Track(pre, post)] => {
            assert_eq!(*pre, Particle::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8, 9));
            assert_eq!(
                *post,
                Particle::new(10.0, 11.0, 12.0, 13.0, 14.0, 15.0, 16.0, 17, 18)
            );
        }
        other => panic!("unexpected calls: {other:?}"),
    }
}

#[test]
fn write_passes_bytes_through_unchanged() {
    let mut m = Mediator::standalone();
    let (ov, log) = RecordingOverride::new();
    m.register(Box::new(ov), false).unwrap();
    // Odd length on purpose: the mediator does not validate size.
    let block: Vec<u8> = (0..17u8).collect();
    m.dispatch_write(&block).unwrap();
    assert_eq!(log.calls(), vec![Call::Write(block)]);
}

#[test]
fn replaced_override_never_sees_calls() {
    let mut m = Mediator::standalone();
    let (first, first_log) = RecordingOverride::new();
    let (second, second_log) = RecordingOverride::new();
    m.register(Box::new(first), false).unwrap();
    m.dispatch_init().unwrap();
    m.register(Box::new(second), false).unwrap();
    m.dispatch_write(&[1, 2, 3]).unwrap();
    m.dispatch_close().unwrap();

    assert_eq!(first_log.calls(), vec![Call::Init]);
    assert_eq!(
        second_log.calls(),
        vec![Call::Write(vec![1, 2, 3]), Call::Close]
    );
    assert_eq!(m.state(), MediatorState::Configured);
}

#[test]
fn override_errors_propagate_unchanged() {
    let mut m = Mediator::standalone();
    m.register(Box::new(FailingOverride::on("write")), false)
        .unwrap();
    m.dispatch_init().unwrap();
    let err = m.dispatch_write(&[0u8; 4]).unwrap_err();
    assert_eq!(err.reason(), "write failed on purpose");
}

#[test]
fn self_test_uses_isolated_gates() {
    let (mut m, gates) = host_mediator();
    let (ov, log) = RecordingOverride::silencing_on_init();
    let report = m.register(Box::new(ov), true).unwrap().unwrap();

    // init and close only; every gated call was withheld by the probe.
    assert_eq!(report.calls, 2);
    assert_eq!(report.toggled.len(), 3);
    assert_eq!(log.calls(), vec![Call::Init, Call::Close]);
    for capture in Capture::ALL {
        assert!(gates.is_capturing(capture));
    }
}

#[test]
fn self_test_sees_both_subblock_sizes() {
    let mut m = Mediator::standalone();
    let (ov, log) = RecordingOverride::new();
    let report = m.register(Box::new(ov), true).unwrap().unwrap();
    assert_eq!(report.calls, 6);
    assert!(report.skipped.is_empty());

    let sizes: Vec<usize> = log
        .calls()
        .iter()
        .filter_map(|c| match c {
            Call::Write(bytes) => Some(bytes.len()),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![1248, 1092]);
}

#[test]
fn failed_self_test_keeps_override_installed() {
    let mut m = Mediator::standalone();
    let err = m
        .register(Box::new(FailingOverride::on("track")), true)
        .unwrap_err();
    assert!(matches!(
        err,
        RegisterError::SelfTestFailed { stage: "track", .. }
    ));
    assert!(m.is_configured());
    assert!(m.dispatch_write(&[]).is_ok());
    assert!(m.dispatch_track(
        0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0, 0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0, 0
    )
    .is_err());
}

#[test]
fn standalone_toggles_warn_once_per_request() {
    use coast_core::{StandaloneGates, Toggles};
    use coast_test_utils::capture_logs;

    let gates = StandaloneGates::new();
    let ((), logs) = capture_logs(|| {
        let toggles = Toggles::new(&gates);
        toggles.disable_write();
        toggles.enable_track();
    });
    let warnings: Vec<_> = logs
        .iter()
        .filter(|r| r.level == log::Level::Warn)
        .map(|r| r.message.as_str())
        .collect();
    assert_eq!(
        warnings,
        vec![
            "not in embedding mode: disabling write capture is ineffective",
            "not in embedding mode: enabling track capture is ineffective",
        ]
    );
    assert!(logs.iter().all(|r| r.target == "coast_core::gate"));
    assert_eq!(gates.ignored(), 2);
}

#[test]
fn default_override_on_standalone_mediator_only_warns() {
    use coast_test_utils::capture_logs;

    let mut m = Mediator::standalone();
    let (result, logs) = capture_logs(|| m.dispatch_write(&[0u8; 1092]));
    result.unwrap();
    assert!(logs
        .iter()
        .any(|r| r.level == log::Level::Warn && r.message.contains("disabling write")));
}
