//! The COAST hook symbols and the process-wide host state behind them.
//!
//! CORSIKA calls `inida_`, `wrida_`, `interaction_`, `track_` and `cloda_`
//! from its simulation thread. All of them share one [`Mediator`] behind a
//! mutex, created lazily with the default override. The capture gates live
//! outside that mutex so an override can flip them from inside a callback,
//! and so the hooks can skip a closed gate without taking the lock.

use std::ffi::{c_char, c_int};
use std::fmt;
use std::sync::{Mutex, TryLockError};

use coast_core::{
    Capture, CaptureGates, ConfigError, CorsikaConfig, HostGates, Mediator, Override,
    OverrideError, ProbeReport, RegisterError, SearchPaths, Toggles,
};

use crate::status::CoastStatus;
use crate::types::{CoastCapture, CoastInteraction, CoastParticle};

static GATES: HostGates = HostGates::new();
static HOST: Mutex<Option<Host>> = Mutex::new(None);

struct Host {
    mediator: Mediator,
    config: Option<CorsikaConfig>,
}

impl Host {
    fn new() -> Self {
        Self {
            mediator: Mediator::new(&GATES),
            config: None,
        }
    }

    fn subblock_len(&self) -> Result<usize, ConfigError> {
        self.config
            .as_ref()
            .ok_or(ConfigError::ThinningUnknown)?
            .subblock_len()
    }
}

/// Why a hook or registration call did not complete.
#[derive(Debug)]
enum HookError {
    /// The host lock is held: called from inside an override callback.
    Reentrant,
    /// The host lock was poisoned by an earlier panic.
    Poisoned,
    /// A required pointer argument was null.
    NullArgument(&'static str),
    Config(ConfigError),
    Override(OverrideError),
    Register(RegisterError),
}

impl fmt::Display for HookError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reentrant => write!(f, "host is busy (called from inside an override)"),
            Self::Poisoned => write!(f, "host state poisoned by an earlier panic"),
            Self::NullArgument(name) => write!(f, "null pointer passed for {name}"),
            Self::Config(e) => write!(f, "{e}"),
            Self::Override(e) => write!(f, "{e}"),
            Self::Register(e) => write!(f, "{e}"),
        }
    }
}

impl From<ConfigError> for HookError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<OverrideError> for HookError {
    fn from(e: OverrideError) -> Self {
        Self::Override(e)
    }
}

impl From<RegisterError> for HookError {
    fn from(e: RegisterError) -> Self {
        Self::Register(e)
    }
}

impl From<&HookError> for CoastStatus {
    fn from(e: &HookError) -> Self {
        match e {
            HookError::Reentrant => CoastStatus::Reentrant,
            HookError::Poisoned => CoastStatus::InternalError,
            HookError::NullArgument(_) => CoastStatus::InvalidArgument,
            HookError::Config(e) => CoastStatus::from(e),
            HookError::Override(e) => CoastStatus::from(e),
            HookError::Register(e) => CoastStatus::from(e),
        }
    }
}

/// Run `f` against the host, creating it on first use.
///
/// Uses `try_lock`: the hooks are driven from one thread, so a held lock
/// means an override called back into the host.
fn with_host<R>(
    f: impl FnOnce(&mut Host) -> Result<R, HookError>,
) -> Result<R, HookError> {
    let mut guard = match HOST.try_lock() {
        Ok(guard) => guard,
        Err(TryLockError::WouldBlock) => return Err(HookError::Reentrant),
        Err(TryLockError::Poisoned(_)) => return Err(HookError::Poisoned),
    };
    f(guard.get_or_insert_with(Host::new))
}

/// Run a void hook body, logging and recording any failure.
fn run_hook(hook: &'static str, body: impl FnOnce() -> Result<(), HookError>) {
    let status: i32 = ffi_guard!({
        match body() {
            Ok(()) => CoastStatus::Ok as i32,
            Err(e) => {
                crate::record_error(format!("{hook}: {e}"));
                CoastStatus::from(&e) as i32
            }
        }
    });
    log::trace!("{hook} finished with status {status}");
}

fn init_logging() {
    use env_logger::{Builder, Env};
    use std::io::Write;

    let _ = Builder::from_env(Env::default().default_filter_or("warn"))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{} {}] {}",
                record.level(),
                record.target(),
                record.args()
            )
        })
        .try_init();
}

/// Read a Fortran `LOGICAL`. Compilers disagree on the bit pattern of
/// `.TRUE.` (1 for gfortran, -1 for ifort), so any non-zero word is true.
#[allow(unsafe_code)]
fn read_flag(flag: *const c_int, name: &'static str) -> Result<bool, HookError> {
    if flag.is_null() {
        return Err(HookError::NullArgument(name));
    }
    // SAFETY: non-null and points to a host-owned default-kind LOGICAL.
    Ok(unsafe { *flag } != 0)
}

#[allow(unsafe_code)]
fn filename_bytes<'a>(filename: *const c_char, str_length: c_int) -> Result<&'a [u8], HookError> {
    if filename.is_null() {
        return Err(HookError::NullArgument("filename"));
    }
    if str_length <= 0 {
        return Err(ConfigError::InvalidFilenameLength {
            length: i64::from(str_length),
        }
        .into());
    }
    // SAFETY: Fortran passes a buffer of exactly `str_length` bytes.
    Ok(unsafe { std::slice::from_raw_parts(filename.cast::<u8>(), str_length as usize) })
}

/// Build the run configuration from the `inida_` arguments.
///
/// Options are always applied; a bad filename is reported but does not
/// discard them.
fn build_config(
    filename: *const c_char,
    str_length: c_int,
    flags: [bool; 5],
) -> (CorsikaConfig, Option<HookError>) {
    let [thinning, curved, slant, stackinput, preshower] = flags;
    let mut config = CorsikaConfig::default();
    config.set_thinning(thinning);
    config.set_curved(curved);
    config.set_slant(slant);
    config.set_stackinput(stackinput);
    config.set_preshower(preshower);
    let err = filename_bytes(filename, str_length)
        .and_then(|raw| config.set_filename(raw).map_err(HookError::from))
        .err();
    (config, err)
}

/// COAST initialisation hook.
///
/// Records the run options, locates the user override file for the log,
/// reopens every gate closed by a previous `cloda_`, and dispatches `init`
/// to the active override.
#[no_mangle]
#[allow(unsafe_code)]
#[allow(clippy::too_many_arguments)]
pub extern "C" fn inida_(
    filename: *const c_char,
    thinning: *const c_int,
    curved: *const c_int,
    slant: *const c_int,
    stackinput: *const c_int,
    preshower: *const c_int,
    str_length: c_int,
) {
    init_logging();
    run_hook("init", || {
        let flags = [
            read_flag(thinning, "thinning")?,
            read_flag(curved, "curved")?,
            read_flag(slant, "slant")?,
            read_flag(stackinput, "stackinput")?,
            read_flag(preshower, "preshower")?,
        ];
        let (config, config_err) = build_config(filename, str_length, flags);
        if let Some(e) = config_err {
            crate::record_error(format!("init: {e}"));
        }
        log::info!(
            "CORSIKA run: file {:?}, thinning {:?}",
            config.filename(),
            config.thinning()
        );

        match SearchPaths::from_env().resolve_override() {
            Ok(path) => log::info!("override file found at {}", path.display()),
            Err(e) => log::debug!("no override file: {e}"),
        }

        with_host(|host| {
            host.config = Some(config);
            GATES.reset();
            host.mediator.dispatch_init()?;
            Ok(())
        })
    });
}

/// COAST subblock hook. `subblock` points to one CORSIKA subblock of
/// `CREAL` words, 312 when thinning and 273 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn wrida_(subblock: *const f32) {
    run_hook("write", || {
        if !GATES.is_capturing(Capture::Write) {
            return Ok(());
        }
        with_host(|host| {
            let len = host.subblock_len()?;
            if subblock.is_null() {
                return Err(HookError::NullArgument("subblock"));
            }
            // SAFETY: the host passes a subblock of `len` bytes for the
            // configured thinning mode.
            let bytes = unsafe { std::slice::from_raw_parts(subblock.cast::<u8>(), len) };
            host.mediator.dispatch_write(bytes)?;
            Ok(())
        })
    });
}

/// COAST interaction hook.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn interaction_(info: *const CoastInteraction) {
    run_hook("interaction", || {
        if !GATES.is_capturing(Capture::Interaction) {
            return Ok(());
        }
        if info.is_null() {
            return Err(HookError::NullArgument("info"));
        }
        // SAFETY: non-null and points to a host-owned CInteraction.
        let info = unsafe { *info };
        with_host(|host| {
            host.mediator.dispatch_interaction(
                info.x,
                info.y,
                info.z,
                info.etot,
                info.sigma,
                info.kela,
                info.proj_id,
                info.target_id,
            )?;
            Ok(())
        })
    });
}

/// COAST track hook: one step from `pre` to `post`.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn track_(pre: *const CoastParticle, post: *const CoastParticle) {
    run_hook("track", || {
        if !GATES.is_capturing(Capture::Track) {
            return Ok(());
        }
        if pre.is_null() || post.is_null() {
            return Err(HookError::NullArgument("particle"));
        }
        // SAFETY: both non-null and point to host-owned CParticles.
        let (pre, post) = unsafe { (*pre, *post) };
        with_host(|host| {
            host.mediator.dispatch_track(
                pre.time,
                pre.x,
                pre.y,
                pre.z,
                pre.depth,
                pre.energy,
                pre.weight,
                pre.particle_id,
                pre.hadronic_generation,
                post.time,
                post.x,
                post.y,
                post.z,
                post.depth,
                post.energy,
                post.weight,
                post.particle_id,
                post.hadronic_generation,
            )?;
            Ok(())
        })
    });
}

/// COAST close hook. Dispatches `close`, then shuts every gate.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn cloda_() {
    run_hook("close", || {
        let result = with_host(|host| {
            host.mediator.dispatch_close()?;
            Ok(())
        });
        Toggles::new(&GATES).disable_all();
        result
    });
}

/// Declared by CORSIKA for special builds; unused.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn tabularizedatmosphere_(
    _n_points: *const c_int,
    _height: *const f64,
    _refractive_index: *const f64,
) {
}

fn set_gate(capture: Capture, enabled: bool) -> i32 {
    ffi_guard!({
        GATES.set_capture(capture, enabled);
        CoastStatus::Ok as i32
    })
}

/// Stop delivering `wrida_` calls to the override.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_disable_write() -> i32 {
    set_gate(Capture::Write, false)
}

/// Resume delivering `wrida_` calls to the override.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_enable_write() -> i32 {
    set_gate(Capture::Write, true)
}

/// Stop delivering `interaction_` calls to the override.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_disable_interaction() -> i32 {
    set_gate(Capture::Interaction, false)
}

/// Resume delivering `interaction_` calls to the override.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_enable_interaction() -> i32 {
    set_gate(Capture::Interaction, true)
}

/// Stop delivering `track_` calls to the override.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_disable_track() -> i32 {
    set_gate(Capture::Track, false)
}

/// Resume delivering `track_` calls to the override.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_enable_track() -> i32 {
    set_gate(Capture::Track, true)
}

/// Close every gate.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_disable_all() -> i32 {
    ffi_guard!({
        Toggles::new(&GATES).disable_all();
        CoastStatus::Ok as i32
    })
}

/// Query a gate. `kind` is a [`CoastCapture`] discriminant; `*out` is set
/// to 1 when the gate is open and 0 otherwise.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_is_capturing(kind: i32, out: *mut u8) -> i32 {
    ffi_guard!({
        if out.is_null() {
            return CoastStatus::InvalidArgument as i32;
        }
        let Some(kind) = CoastCapture::from_raw(kind) else {
            return CoastStatus::InvalidArgument as i32;
        };
        let open = GATES.is_capturing(kind.into());
        // SAFETY: out is non-null per check above.
        unsafe { *out = u8::from(open) };
        CoastStatus::Ok as i32
    })
}

/// Drop the active override and configuration, reinstall the default
/// override and reopen every gate.
#[no_mangle]
#[allow(unsafe_code)]
pub extern "C" fn coast_reset() -> i32 {
    ffi_guard!({
        let result = with_host(|host| {
            *host = Host::new();
            Ok(())
        });
        match result {
            Ok(()) => {
                GATES.reset();
                crate::LAST_ERROR.with(|cell| cell.borrow_mut().clear());
                log::debug!("host reset");
                CoastStatus::Ok as i32
            }
            Err(e) => CoastStatus::from(&e) as i32,
        }
    })
}

/// Run `f` against the mediator the hooks dispatch to.
///
/// Lets an in-process embedder (the Python bindings built with `embedded`)
/// share the host's override slot instead of keeping its own. Returns
/// [`CoastStatus::Reentrant`] when called from inside an override callback.
pub fn with_mediator<R>(f: impl FnOnce(&mut Mediator) -> R) -> Result<R, CoastStatus> {
    with_host(|host| Ok(f(&mut host.mediator))).map_err(|e| CoastStatus::from(&e))
}

/// Install a Rust override in the process-wide host.
///
/// The Rust-side counterpart of `coast_override_register` for embedders
/// linking this crate directly. Failures are also recorded as the thread's
/// last error.
pub fn install_override(
    candidate: Box<dyn Override>,
    run_test: bool,
) -> Result<Option<ProbeReport>, CoastStatus> {
    with_host(|host| Ok(host.mediator.register(candidate, run_test)?)).map_err(|e| {
        crate::record_error(format!("register: {e}"));
        CoastStatus::from(&e)
    })
}

/// The gates read by the hooks, for in-process embedders.
pub fn host_gates() -> &'static HostGates {
    &GATES
}
