//! Host configuration: CORSIKA run options and override search paths.
//!
//! [`CorsikaConfig`] captures what `inida_` reports about the run. The only
//! option this layer acts on is THIN, which fixes the subblock size; the
//! others are kept for overrides that want them.
//!
//! [`SearchPaths`] locates user override code from environment variables.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Particles per CORSIKA data subblock.
pub const SUBBLOCK_PARTICLES: usize = 39;

/// Bytes per `CREAL` word.
pub const WORD_BYTES: usize = 4;

/// Subblock size in bytes with thinning (8 words per particle).
pub const THINNED_SUBBLOCK_LEN: usize = SUBBLOCK_PARTICLES * 8 * WORD_BYTES;

/// Subblock size in bytes without thinning (7 words per particle).
pub const UNTHINNED_SUBBLOCK_LEN: usize = SUBBLOCK_PARTICLES * 7 * WORD_BYTES;

/// Variable naming a directory that holds the user override.
pub const OVERRIDE_DIR_VAR: &str = "CORSIKA_PYTHON_INTERFACE";

/// Variable naming the COAST user library installation.
pub const USER_LIB_VAR: &str = "COAST_USER_LIB";

/// Override file looked up when no other name is configured.
pub const DEFAULT_OVERRIDE_FILE: &str = "override.py";

/// Tri-state CORSIKA option.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CorsikaOption {
    /// The option is not used in this run.
    Disabled,
    /// The option is used in this run.
    Enabled,
    /// The host never reported the option.
    #[default]
    Unknown,
}

impl From<bool> for CorsikaOption {
    fn from(v: bool) -> Self {
        if v {
            Self::Enabled
        } else {
            Self::Disabled
        }
    }
}

/// Run options reported by the host at initialisation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CorsikaConfig {
    filename: String,
    thinning: CorsikaOption,
    curved: CorsikaOption,
    slant: CorsikaOption,
    stackinput: CorsikaOption,
    preshower: CorsikaOption,
}

impl CorsikaConfig {
    /// Build a config from the values passed to `inida_`.
    ///
    /// `filename` is the raw Fortran buffer: anything after a NUL byte is
    /// ignored and trailing whitespace padding is trimmed.
    pub fn new(
        filename: &[u8],
        thinning: bool,
        curved: bool,
        slant: bool,
        stackinput: bool,
        preshower: bool,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.set_filename(filename)?;
        config.thinning = thinning.into();
        config.curved = curved.into();
        config.slant = slant.into();
        config.stackinput = stackinput.into();
        config.preshower = preshower.into();
        Ok(config)
    }

    /// Set the binary output filename from a raw, possibly padded buffer.
    pub fn set_filename(&mut self, raw: &[u8]) -> Result<(), ConfigError> {
        if raw.is_empty() {
            return Err(ConfigError::EmptyFilename);
        }
        let raw = match raw.iter().position(|&b| b == 0) {
            Some(nul) => &raw[..nul],
            None => raw,
        };
        let trimmed = raw.trim_ascii_end();
        if trimmed.is_empty() {
            return Err(ConfigError::BlankFilename);
        }
        let name = std::str::from_utf8(trimmed).map_err(|_| ConfigError::FilenameNotUtf8)?;
        self.filename = name.to_owned();
        Ok(())
    }

    /// Record whether THIN is used.
    pub fn set_thinning(&mut self, v: bool) {
        self.thinning = v.into();
    }

    /// Record whether CURVED is used.
    pub fn set_curved(&mut self, v: bool) {
        self.curved = v.into();
    }

    /// Record whether SLANT is used.
    pub fn set_slant(&mut self, v: bool) {
        self.slant = v.into();
    }

    /// Record whether STACKIN is used.
    pub fn set_stackinput(&mut self, v: bool) {
        self.stackinput = v.into();
    }

    /// Record whether PRESHOWER is used.
    pub fn set_preshower(&mut self, v: bool) {
        self.preshower = v.into();
    }

    /// CORSIKA binary output filename, without padding.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// THIN option.
    pub fn thinning(&self) -> CorsikaOption {
        self.thinning
    }

    /// CURVED option.
    pub fn curved(&self) -> CorsikaOption {
        self.curved
    }

    /// SLANT option.
    pub fn slant(&self) -> CorsikaOption {
        self.slant
    }

    /// STACKIN option.
    pub fn stackinput(&self) -> CorsikaOption {
        self.stackinput
    }

    /// PRESHOWER option.
    pub fn preshower(&self) -> CorsikaOption {
        self.preshower
    }

    /// Size in bytes of the subblocks the host will pass to `write`.
    pub fn subblock_len(&self) -> Result<usize, ConfigError> {
        match self.thinning {
            CorsikaOption::Enabled => Ok(THINNED_SUBBLOCK_LEN),
            CorsikaOption::Disabled => Ok(UNTHINNED_SUBBLOCK_LEN),
            CorsikaOption::Unknown => Err(ConfigError::ThinningUnknown),
        }
    }
}

/// Where to look for user override code.
///
/// Built once from the environment (or any lookup function in tests);
/// empty variables count as unset.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SearchPaths {
    user_lib: Option<PathBuf>,
    override_dir: Option<PathBuf>,
    override_file: String,
}

impl SearchPaths {
    /// Read [`USER_LIB_VAR`] and [`OVERRIDE_DIR_VAR`] from the process
    /// environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var_os(name))
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<OsString>) -> Self {
        let read = |name: &str| lookup(name).filter(|v| !v.is_empty()).map(PathBuf::from);
        Self {
            user_lib: read(USER_LIB_VAR),
            override_dir: read(OVERRIDE_DIR_VAR),
            override_file: DEFAULT_OVERRIDE_FILE.to_owned(),
        }
    }

    /// Look for a different override file name.
    pub fn with_override_file(mut self, name: impl Into<String>) -> Self {
        self.override_file = name.into();
        self
    }

    /// Override file name being searched for.
    pub fn override_file(&self) -> &str {
        &self.override_file
    }

    /// The COAST user library directory.
    pub fn user_lib(&self) -> Result<&Path, ConfigError> {
        self.user_lib
            .as_deref()
            .ok_or(ConfigError::MissingVariable { name: USER_LIB_VAR })
    }

    /// Directory holding the bundled interface packages.
    pub fn packages_dir(&self) -> Result<PathBuf, ConfigError> {
        Ok(self.user_lib()?.join("python").join("packages"))
    }

    /// Find the override file.
    ///
    /// The override directory wins if it contains the file; otherwise the
    /// user library directory is tried.
    pub fn resolve_override(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.override_dir {
            let candidate = dir.join(&self.override_file);
            if candidate.is_file() {
                return Ok(candidate);
            }
            log::debug!("no override at {}", candidate.display());
        }

        let candidate = self.user_lib()?.join(&self.override_file);
        if candidate.is_file() {
            return Ok(candidate);
        }
        Err(ConfigError::OverrideNotFound {
            file: self.override_file.clone(),
        })
    }
}
