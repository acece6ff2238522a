//! Drives the exported COAST hooks the way CORSIKA does.
//!
//! The host is process-wide, so every test takes `TEST_LOCK` and starts
//! from `coast_reset`.

#![allow(unsafe_code)]

use std::ffi::{c_char, c_int, c_void};
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use coast_core::Capture;
use coast_ffi::*;

static TEST_LOCK: Mutex<()> = Mutex::new(());

fn fresh_host() -> MutexGuard<'static, ()> {
    let guard = TEST_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    assert_eq!(coast_reset(), CoastStatus::Ok as i32);
    guard
}

fn init(thinning: bool) {
    let name = b"DAT000042   ";
    let thinning = c_int::from(thinning);
    let off: c_int = 0;
    inida_(
        name.as_ptr() as *const c_char,
        &thinning,
        &off,
        &off,
        &off,
        &off,
        name.len() as c_int,
    );
}

fn last_error() -> String {
    let len = coast_last_error_message(std::ptr::null_mut(), 0);
    let mut buf = vec![0u8; len as usize + 1];
    coast_last_error_message(buf.as_mut_ptr() as *mut c_char, buf.len());
    String::from_utf8(buf[..len as usize].to_vec()).unwrap()
}

fn particle(z: f64, id: i32) -> CoastParticle {
    CoastParticle {
        x: 1.0,
        y: 2.0,
        z,
        depth: 100.0,
        time: 1e-6,
        energy: 5.0,
        weight: 1.0,
        particle_id: id,
        hadronic_generation: 0,
    }
}

#[derive(Default)]
struct Recorder {
    inits: AtomicUsize,
    closes: AtomicUsize,
    writes: Mutex<Vec<usize>>,
    positions: Mutex<Vec<[f64; 3]>>,
    tracks: Mutex<Vec<(i32, i32)>>,
    nested_register: AtomicI32,
}

fn recorder(user_data: *mut c_void) -> &'static Recorder {
    unsafe { &*(user_data as *const Recorder) }
}

unsafe extern "C" fn rec_init(user_data: *mut c_void, _: *const CoastToggles) -> i32 {
    recorder(user_data).inits.fetch_add(1, Ordering::SeqCst);
    0
}

unsafe extern "C" fn rec_close(user_data: *mut c_void, _: *const CoastToggles) -> i32 {
    recorder(user_data).closes.fetch_add(1, Ordering::SeqCst);
    0
}

unsafe extern "C" fn rec_write(
    user_data: *mut c_void,
    _: *const CoastToggles,
    _: *const u8,
    len: usize,
) -> i32 {
    recorder(user_data).writes.lock().unwrap().push(len);
    0
}

unsafe extern "C" fn rec_interaction(
    user_data: *mut c_void,
    _: *const CoastToggles,
    info: *const CoastInteraction,
) -> i32 {
    let info = &*info;
    recorder(user_data)
        .positions
        .lock()
        .unwrap()
        .push([info.x, info.y, info.z]);
    0
}

unsafe extern "C" fn rec_track(
    user_data: *mut c_void,
    _: *const CoastToggles,
    pre: *const CoastParticle,
    post: *const CoastParticle,
) -> i32 {
    recorder(user_data)
        .tracks
        .lock()
        .unwrap()
        .push(((*pre).particle_id, (*post).particle_id));
    0
}

unsafe extern "C" fn failing_track(
    _: *mut c_void,
    _: *const CoastToggles,
    _: *const CoastParticle,
    _: *const CoastParticle,
) -> i32 {
    3
}

unsafe extern "C" fn reentrant_init(user_data: *mut c_void, _: *const CoastToggles) -> i32 {
    let def = recording_def(user_data);
    let rc = coast_override_register(&def, 0);
    recorder(user_data).nested_register.store(rc, Ordering::SeqCst);
    0
}

unsafe extern "C" fn silence_writes_on_init(_: *mut c_void, toggles: *const CoastToggles) -> i32 {
    let t = &*toggles;
    (t.set_fn)(t.opaque, CoastCapture::Write as i32, 0)
}

fn recording_def(user_data: *mut c_void) -> CoastOverrideDef {
    CoastOverrideDef {
        init_fn: Some(rec_init),
        close_fn: Some(rec_close),
        write_fn: Some(rec_write),
        interaction_fn: Some(rec_interaction),
        track_fn: Some(rec_track),
        user_data,
    }
}

fn leaked_recorder() -> (&'static Recorder, *mut c_void) {
    let rec: &'static Recorder = Box::leak(Box::default());
    (rec, rec as *const Recorder as *mut c_void)
}

fn is_capturing(kind: CoastCapture) -> bool {
    let mut out = 0xFFu8;
    assert_eq!(coast_is_capturing(kind as i32, &mut out), 0);
    out == 1
}

#[test]
fn default_override_silences_write_after_first_subblock() {
    let _g = fresh_host();
    init(true);
    let block = [0f32; 312];
    wrida_(block.as_ptr());
    assert!(!is_capturing(CoastCapture::Write));
    assert!(is_capturing(CoastCapture::Interaction));
    assert!(is_capturing(CoastCapture::Track));
}

#[test]
fn subblock_size_follows_thinning() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);

    init(true);
    let thinned = [0f32; 312];
    wrida_(thinned.as_ptr());

    init(false);
    let plain = [0f32; 273];
    wrida_(plain.as_ptr());

    assert_eq!(*rec.writes.lock().unwrap(), vec![1248, 1092]);
    assert_eq!(rec.inits.load(Ordering::SeqCst), 2);
}

#[test]
fn write_before_init_reports_unknown_thinning() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);
    let block = [0f32; 312];
    wrida_(block.as_ptr());
    assert!(rec.writes.lock().unwrap().is_empty());
    assert_eq!(last_error(), "write: CORSIKA option THIN not set");
}

#[test]
fn interaction_and_track_reach_the_c_override() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);
    init(false);

    let info = CoastInteraction {
        x: 1.0,
        y: 2.0,
        z: 3.0,
        etot: 10.0,
        sigma: 0.5,
        kela: 0.9,
        proj_id: 14,
        target_id: 14,
    };
    interaction_(&info);
    track_(&particle(500.0, 5), &particle(470.0, 6));

    assert_eq!(*rec.positions.lock().unwrap(), vec![[1.0, 2.0, 3.0]]);
    assert_eq!(*rec.tracks.lock().unwrap(), vec![(5, 6)]);
}

#[test]
fn closed_gate_skips_dispatch() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);
    init(false);

    assert_eq!(coast_disable_track(), 0);
    track_(&particle(500.0, 5), &particle(470.0, 5));
    assert!(rec.tracks.lock().unwrap().is_empty());

    assert_eq!(coast_enable_track(), 0);
    track_(&particle(500.0, 5), &particle(470.0, 5));
    assert_eq!(rec.tracks.lock().unwrap().len(), 1);
}

#[test]
fn override_toggles_reach_host_gates() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    let mut def = recording_def(data);
    def.init_fn = Some(silence_writes_on_init);
    assert_eq!(coast_override_register(&def, 0), 0);
    init(true);

    let block = [0f32; 312];
    wrida_(block.as_ptr());
    assert!(rec.writes.lock().unwrap().is_empty());
    assert!(!host_capturing(Capture::Write));
}

fn host_capturing(capture: Capture) -> bool {
    host_gates().is_capturing(capture)
}

#[test]
fn close_dispatches_then_shuts_every_gate() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);
    init(false);
    cloda_();
    assert_eq!(rec.closes.load(Ordering::SeqCst), 1);
    for kind in [CoastCapture::Write, CoastCapture::Interaction, CoastCapture::Track] {
        assert!(!is_capturing(kind));
    }

    assert_eq!(coast_reset(), 0);
    assert!(is_capturing(CoastCapture::Write));
}

#[test]
fn next_init_reopens_gates_closed_by_close() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);
    init(false);
    cloda_();
    assert!(!is_capturing(CoastCapture::Track));

    init(false);
    track_(&particle(500.0, 5), &particle(470.0, 6));
    assert_eq!(*rec.tracks.lock().unwrap(), vec![(5, 6)]);
    assert_eq!(rec.inits.load(Ordering::SeqCst), 2);
}

#[test]
fn init_toggles_survive_the_gate_reopening() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    let mut def = recording_def(data);
    def.init_fn = Some(silence_writes_on_init);
    assert_eq!(coast_override_register(&def, 0), 0);
    init(true);
    cloda_();
    init(true);

    assert!(!is_capturing(CoastCapture::Write));
    assert!(is_capturing(CoastCapture::Interaction));
    assert!(rec.writes.lock().unwrap().is_empty());
}

#[test]
fn fortran_true_from_any_compiler_selects_thinning() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    assert_eq!(coast_override_register(&recording_def(data), 0), 0);

    let name = b"DAT000043";
    let ifort_true: c_int = -1;
    let off: c_int = 0;
    inida_(
        name.as_ptr() as *const c_char,
        &ifort_true,
        &off,
        &off,
        &off,
        &off,
        name.len() as c_int,
    );
    let block = [0f32; 312];
    wrida_(block.as_ptr());
    assert_eq!(*rec.writes.lock().unwrap(), vec![1248]);
}

#[test]
fn incomplete_definition_is_rejected_before_install() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    let mut def = recording_def(data);
    def.close_fn = None;
    assert_eq!(
        coast_override_register(&def, 0),
        CoastStatus::IncompleteOverride as i32
    );
    assert!(last_error().contains("close"));

    init(false);
    assert_eq!(rec.inits.load(Ordering::SeqCst), 0);
}

#[test]
fn failed_self_test_still_installs_override() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    let mut def = recording_def(data);
    def.track_fn = Some(failing_track);
    assert_eq!(
        coast_override_register(&def, 1),
        CoastStatus::SelfTestFailed as i32
    );
    // The probe ran init and both writes against its own gates.
    assert_eq!(rec.inits.load(Ordering::SeqCst), 1);
    assert_eq!(*rec.writes.lock().unwrap(), vec![1248, 1092]);
    assert!(is_capturing(CoastCapture::Write));

    init(false);
    assert_eq!(rec.inits.load(Ordering::SeqCst), 2);
    track_(&particle(1.0, 1), &particle(0.5, 1));
    assert!(last_error().contains("C callback returned error code 3"));
}

#[test]
fn registering_from_inside_a_callback_is_reentrant() {
    let _g = fresh_host();
    let (rec, data) = leaked_recorder();
    let mut def = recording_def(data);
    def.init_fn = Some(reentrant_init);
    assert_eq!(coast_override_register(&def, 0), 0);
    init(false);
    assert_eq!(
        rec.nested_register.load(Ordering::SeqCst),
        CoastStatus::Reentrant as i32
    );
}

#[test]
fn null_hook_arguments_are_recorded_not_fatal() {
    let _g = fresh_host();
    init(false);
    interaction_(std::ptr::null());
    assert_eq!(last_error(), "interaction: null pointer passed for info");
    track_(std::ptr::null(), std::ptr::null());
    assert_eq!(last_error(), "track: null pointer passed for particle");
}

#[test]
fn is_capturing_validates_arguments() {
    let _g = fresh_host();
    let mut out = 0u8;
    assert_eq!(
        coast_is_capturing(7, &mut out),
        CoastStatus::InvalidArgument as i32
    );
    assert_eq!(
        coast_is_capturing(CoastCapture::Write as i32, std::ptr::null_mut()),
        CoastStatus::InvalidArgument as i32
    );
    assert_eq!(coast_disable_all(), 0);
    assert!(!is_capturing(CoastCapture::Interaction));
    assert_eq!(coast_enable_write(), 0);
    assert!(is_capturing(CoastCapture::Write));
    assert_eq!(coast_enable_interaction(), 0);
    assert_eq!(coast_disable_write(), 0);
    assert_eq!(coast_disable_interaction(), 0);
    assert!(!is_capturing(CoastCapture::Write));
}

#[test]
fn atmosphere_table_hook_is_inert() {
    let _g = fresh_host();
    let n: c_int = 2;
    let heights = [0.0f64, 1.0e5];
    let indices = [1.0003f64, 1.0];
    tabularizedatmosphere_(&n, heights.as_ptr(), indices.as_ptr());
    for kind in [CoastCapture::Write, CoastCapture::Interaction, CoastCapture::Track] {
        assert!(is_capturing(kind));
    }
}

#[test]
fn rust_override_installed_in_process_sees_hooks() {
    use coast_test_utils::{Call, RecordingOverride};

    let _g = fresh_host();
    let (ov, log) = RecordingOverride::new();
    let report = install_override(Box::new(ov), true).unwrap().unwrap();
    assert_eq!(report.calls, 6);
    assert_eq!(log.len(), 6);

    init(false);
    let block = [0f32; 273];
    wrida_(block.as_ptr());
    cloda_();

    let calls = log.calls();
    assert_eq!(calls[6], Call::Init);
    assert_eq!(calls[7], Call::Write(vec![0u8; 1092]));
    assert_eq!(calls[8], Call::Close);
}

#[test]
fn mediator_shared_with_embedders_is_the_one_hooks_reach() {
    use coast_test_utils::{Call, RecordingOverride};

    let _g = fresh_host();
    let (ov, log) = RecordingOverride::new();
    let report = with_mediator(|mediator| mediator.register(Box::new(ov), false)).unwrap();
    assert!(report.unwrap().is_none());
    assert!(with_mediator(|mediator| mediator.is_configured()).unwrap());

    init(false);
    track_(&particle(500.0, 5), &particle(470.0, 6));
    let calls = log.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], Call::Init);
    assert!(matches!(calls[1], Call::Track(pre, post)
        if pre.particle_id() == 5 && post.particle_id() == 6));
}
