//! # dart-launcher
//!
//! Pre-flight gate in front of the DART host. The host executable and one
//! auxiliary component must hash to known SHA-256 values before the host is
//! started; anything else aborts with a status code naming the cause.

use sha2::{Digest, Sha256};
use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command};
use thiserror::Error;
use tracing::{debug, info};

/// Expected SHA-256 of the host executable, uppercase hex.
///
/// Release builds set `DART_MAIN_SHA256` at compile time.
pub const MAIN_SHA256: &str = match option_env!("DART_MAIN_SHA256") {
    Some(hash) => hash,
    None => "30E49E43E09602CA9823A09CF6DA04C90334EDD4864A463C69D19C0A72409613",
};

/// Expected SHA-256 of the auxiliary component, uppercase hex.
pub const AUXILIARY_SHA256: &str = match option_env!("DART_AUXILIARY_SHA256") {
    Some(hash) => hash,
    None => "43535990DA17776D53A0958B813B16604FD94B5FC7AA34CF2C0630F2624A976C",
};

/// File stem of the host executable.
pub const MAIN_NAME: &str = "dart-host";

/// File stem of the auxiliary component.
pub const AUXILIARY_NAME: &str = "QtWebEngineProcess";

const BUFFER_SIZE: usize = 8192;

/// Why the host was not started.
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("{} not found: {source}", path.display())]
    MainMissing { path: PathBuf, source: io::Error },

    #[error("Integrity check failed for {}: installation is damaged or was tampered with", path.display())]
    MainMismatch { path: PathBuf, actual: String },

    #[error("{} not found: {source}", path.display())]
    AuxiliaryMissing { path: PathBuf, source: io::Error },

    #[error("Integrity check failed for {}", path.display())]
    AuxiliaryMismatch { path: PathBuf, actual: String },

    #[error("Failed to start {}: {source}", path.display())]
    Launch { path: PathBuf, source: io::Error },
}

impl LaunchError {
    /// Process exit status for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::MainMissing { .. } => 2,
            LaunchError::MainMismatch { .. } => 3,
            LaunchError::AuxiliaryMissing { .. } => 5,
            LaunchError::AuxiliaryMismatch { .. } => 6,
            LaunchError::Launch { .. } => 7,
        }
    }
}

/// A file that must match a known hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub path: PathBuf,
    pub expected: String,
}

impl Artifact {
    pub fn new(path: impl Into<PathBuf>, expected: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            expected: expected.into(),
        }
    }

    /// Hash the file. `Ok(None)` means it hashed fine but does not match.
    fn check(&self) -> io::Result<Option<String>> {
        let actual = sha256_file(&self.path)?;
        debug!("{}: {}", self.path.display(), actual);
        if actual.eq_ignore_ascii_case(&self.expected) {
            Ok(None)
        } else {
            Ok(Some(actual))
        }
    }
}

/// What to verify and what to start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    pub main: Artifact,
    pub auxiliary: Artifact,
}

impl LaunchPlan {
    /// Both artifacts next to each other in `dir`, with the built-in hashes.
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            main: Artifact::new(dir.join(executable(MAIN_NAME)), MAIN_SHA256),
            auxiliary: Artifact::new(dir.join(executable(AUXILIARY_NAME)), AUXILIARY_SHA256),
        }
    }

    /// The plan for the directory holding the running launcher.
    pub fn beside_current_exe() -> io::Result<Self> {
        let exe = env::current_exe()?;
        let dir = exe.parent().unwrap_or_else(|| Path::new("."));
        Ok(Self::in_dir(dir))
    }

    /// Check the main executable, then the auxiliary component.
    pub fn verify(&self) -> Result<(), LaunchError> {
        match self.main.check() {
            Err(source) => {
                return Err(LaunchError::MainMissing {
                    path: self.main.path.clone(),
                    source,
                })
            }
            Ok(Some(actual)) => {
                return Err(LaunchError::MainMismatch {
                    path: self.main.path.clone(),
                    actual,
                })
            }
            Ok(None) => {}
        }

        match self.auxiliary.check() {
            Err(source) => Err(LaunchError::AuxiliaryMissing {
                path: self.auxiliary.path.clone(),
                source,
            }),
            Ok(Some(actual)) => Err(LaunchError::AuxiliaryMismatch {
                path: self.auxiliary.path.clone(),
                actual,
            }),
            Ok(None) => {
                info!("Integrity check passed");
                Ok(())
            }
        }
    }

    /// Start the main executable with `args`. Does not wait for it.
    pub fn spawn<I, S>(&self, args: I) -> Result<Child, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        Command::new(&self.main.path)
            .args(args)
            .spawn()
            .map_err(|source| LaunchError::Launch {
                path: self.main.path.clone(),
                source,
            })
    }

    /// Verify, then start the main executable.
    pub fn launch<I, S>(&self, args: I) -> Result<Child, LaunchError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.verify()?;
        let child = self.spawn(args)?;
        info!("Started {} (pid {})", self.main.path.display(), child.id());
        Ok(child)
    }
}

/// Platform file name for an executable stem.
pub fn executable(stem: &str) -> String {
    format!("{}{}", stem, env::consts::EXE_SUFFIX)
}

/// SHA-256 of a file's contents as uppercase hex.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    let mut buffer = [0u8; BUFFER_SIZE];
    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode_upper(hasher.finalize()))
}
