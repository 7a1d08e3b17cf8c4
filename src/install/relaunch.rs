//! Running the uninstaller from outside the directory it removes
//!
//! Windows refuses to delete a running executable, so an uninstall started
//! from the deployed copy re-runs itself from a temporary copy and exits.

use std::path::{Path, PathBuf};

use log::info;

use crate::config::SetupConfig;
use crate::error::{Result, SetupError};

/// Whether `path` lies under `dir`, comparing canonical paths when they resolve
pub fn is_inside(path: &Path, dir: &Path) -> bool {
    let path = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let dir = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
    path.starts_with(&dir)
}

/// Name of the temporary copy used for one uninstall run
pub fn temporary_copy_path(pid: u32) -> PathBuf {
    std::env::temp_dir().join(format!(
        "tempmon-setup-uninstall-{pid}{}",
        std::env::consts::EXE_SUFFIX
    ))
}

/// Re-run this command from a temporary copy when the executable lives in
/// the install directory; true when the copy was launched and this process
/// should exit without uninstalling
pub fn relaunch_outside_install_dir(config: &SetupConfig) -> Result<bool> {
    let exe = std::env::current_exe()?;
    if !cfg!(target_os = "windows") || !is_inside(&exe, &config.install_dir) {
        return Ok(false);
    }

    let copy = temporary_copy_path(std::process::id());
    std::fs::copy(&exe, &copy).map_err(|source| SetupError::Copy {
        from: exe.clone(),
        to: copy.clone(),
        source,
    })?;

    info!("Continuing uninstall from {}", copy.display());
    std::process::Command::new(&copy)
        .args(std::env::args_os().skip(1))
        .spawn()
        .map_err(|source| SetupError::Spawn {
            program: copy.display().to_string(),
            source,
        })?;
    Ok(true)
}
