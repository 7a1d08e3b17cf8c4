//! Uninstall registration ("Apps & features" entry).
//!
//! Written field by field at install time, removed as one key at uninstall.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::config::SetupConfig;
use crate::error::{Result, SetupError};

const UNINSTALL_ROOT: &str = r"Software\Microsoft\Windows\CurrentVersion\Uninstall";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UninstallEntry {
    pub display_name: String,
    pub uninstall_string: String,
    pub display_icon: String,
    pub publisher: String,
    pub display_version: String,
    pub install_location: String,
    /// `YYYYMMDD`
    pub install_date: String,
}

impl UninstallEntry {
    pub fn from_config(config: &SetupConfig, uninstall_command: impl Into<String>) -> Self {
        Self {
            display_name: config.app.name.clone(),
            uninstall_string: uninstall_command.into(),
            display_icon: config.app_icon().to_string_lossy().into_owned(),
            publisher: config.app.publisher.clone(),
            display_version: config.app.version.clone(),
            install_location: config.install_dir.to_string_lossy().into_owned(),
            install_date: chrono::Local::now().format("%Y%m%d").to_string(),
        }
    }

    /// Registry value names paired with their data, in write order
    pub fn values(&self) -> [(&'static str, &str); 7] {
        [
            ("DisplayName", self.display_name.as_str()),
            ("UninstallString", self.uninstall_string.as_str()),
            ("DisplayIcon", self.display_icon.as_str()),
            ("Publisher", self.publisher.as_str()),
            ("DisplayVersion", self.display_version.as_str()),
            ("InstallLocation", self.install_location.as_str()),
            ("InstallDate", self.install_date.as_str()),
        ]
    }
}

pub trait Registration {
    fn write(&self, entry: &UninstallEntry) -> Result<()>;
    /// Remove the whole record; removing a missing record succeeds
    fn remove(&self) -> Result<()>;
}

/// Registry path of the uninstall record for `app_id`, relative to HKLM
pub fn uninstall_key_path(app_id: &str) -> String {
    format!("{UNINSTALL_ROOT}\\{app_id}")
}

/// Uninstall record under `HKLM\...\Uninstall`
#[cfg(target_os = "windows")]
pub struct RegistryKey {
    root: winreg::RegKey,
    path: String,
}

#[cfg(target_os = "windows")]
impl RegistryKey {
    pub fn new(app_id: &str) -> Self {
        Self::under(
            winreg::RegKey::predef(winreg::enums::HKEY_LOCAL_MACHINE),
            uninstall_key_path(app_id),
        )
    }

    /// Record at `path` below an already open key
    pub fn under(root: winreg::RegKey, path: impl Into<String>) -> Self {
        Self {
            root,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(target_os = "windows")]
impl Registration for RegistryKey {
    fn write(&self, entry: &UninstallEntry) -> Result<()> {
        let (key, _) = self.root.create_subkey(&self.path).map_err(|e| {
            SetupError::Registration(format!("Failed to create {}: {e}", self.path))
        })?;
        for (name, data) in entry.values() {
            key.set_value(name, &data).map_err(|e| {
                SetupError::Registration(format!("Failed to set {name}: {e}"))
            })?;
        }
        info!("Registered uninstall entry {}", self.path);
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        // RegDeleteTreeW: the key and every value in one call
        match self.root.delete_subkey_all(&self.path) {
            Ok(()) => {
                info!("Removed uninstall entry {}", self.path);
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("Uninstall entry {} already removed", self.path);
                Ok(())
            }
            Err(e) => Err(SetupError::Registration(format!(
                "Failed to delete {}: {e}",
                self.path
            ))),
        }
    }
}

/// TOML manifest standing in for the registry on platforms without one
#[derive(Debug, Clone)]
pub struct ManifestFile {
    path: PathBuf,
}

impl ManifestFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn for_app(app_id: &str) -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("tempmon-setup")
            .join("uninstall");
        Self::new(dir.join(format!("{app_id}.toml")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn read(&self) -> Result<UninstallEntry> {
        let raw = fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&raw)?)
    }
}

impl Registration for ManifestFile {
    fn write(&self, entry: &UninstallEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let body = toml::to_string_pretty(entry)
            .map_err(|e| SetupError::Registration(format!("Failed to serialize entry: {e}")))?;
        fs::write(&self.path, body)?;
        info!("Registered uninstall entry {}", self.path.display());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                info!("Removed uninstall entry {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "windows")] {
        /// The registration store native to this platform
        pub fn native(config: &SetupConfig) -> Box<dyn Registration> {
            Box::new(RegistryKey::new(&config.app.id))
        }
    } else {
        /// The registration store native to this platform
        pub fn native(config: &SetupConfig) -> Box<dyn Registration> {
            Box::new(ManifestFile::for_app(&config.app.id))
        }
    }
}
