//! Error type shared by every setup component
//!
//! Provisioning itself never fails: absence, pending reboots and nonzero exit
//! codes are outcomes, not errors. `SetupError` covers the things that can
//! genuinely go wrong around it (spawning a process, touching the filesystem,
//! reading configuration) and is always reported, never escalated.

use std::io;
use std::path::PathBuf;

/// Result type alias using `SetupError`
pub type Result<T> = std::result::Result<T, SetupError>;

#[derive(thiserror::Error, Debug)]
pub enum SetupError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to launch {program}: {source}")]
    Spawn { program: String, source: io::Error },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Uninstall registration failed: {0}")]
    Registration(String),

    #[error("Shortcut operation failed: {0}")]
    Shortcut(String),

    #[error("Administrator privileges are required")]
    PermissionDenied,
}

impl SetupError {
    /// Numeric code to report when a subprocess could not be started at all
    ///
    /// Uses the OS error number when there is one, `-1` otherwise.
    pub fn launch_code(&self) -> i32 {
        match self {
            SetupError::Spawn { source, .. } | SetupError::Io(source) => {
                source.raw_os_error().unwrap_or(-1)
            }
            _ => -1,
        }
    }
}

impl From<toml::de::Error> for SetupError {
    fn from(e: toml::de::Error) -> Self {
        SetupError::Config(e.to_string())
    }
}
