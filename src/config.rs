use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SetupError};
use crate::provision::{DependencyCandidate, ServiceSpec, ServiceType, StartMode, VerifyPolicy};

/// Top‑level setup configuration.
///
/// Every field has a built-in default matching the TempMon distribution, so an
/// empty (or absent) config file yields a working installer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SetupConfig {
    pub app: AppConfig,
    /// Application directory; removed recursively on uninstall
    pub install_dir: PathBuf,
    /// Where bundled binaries are copied from (defaults to the setup executable's directory)
    pub payload_dir: Option<PathBuf>,
    /// Deployment manifest, targets relative to `install_dir`
    pub files: Vec<FileEntry>,
    pub driver: DriverConfig,
    pub service: ServiceConfig,
    pub verify: VerifyConfig,
    pub shortcuts: ShortcutConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    /// Key name of the uninstall registration entry
    pub id: String,
    pub name: String,
    pub publisher: String,
    pub version: String,
    /// Main executable, relative to `install_dir`
    pub executable: PathBuf,
    /// Icon shown in the uninstall list; the executable when unset
    pub icon: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileEntry {
    /// File name (or relative path) inside the payload directory
    pub source: PathBuf,
    /// Destination relative to the install directory
    pub target: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DriverConfig {
    pub primary: String,
    /// Other service names the same driver may register under
    pub alternates: Vec<String>,
    /// Silent installer, relative to `install_dir`
    pub installer: PathBuf,
    pub install_args: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceConfig {
    pub name: String,
    pub display_name: String,
    /// Service executable, relative to `install_dir`
    pub binary: PathBuf,
    /// `automatic` or `manual`
    pub start_mode: StartMode,
    /// `own` or `shared`
    pub service_type: ServiceType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifyConfig {
    /// Wait before the first post-install driver query
    pub settle_delay_ms: u64,
    /// Number of post-install queries; 1 means a single check
    pub attempts: u32,
    /// Multiplier applied to the delay between attempts
    pub backoff_factor: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ShortcutConfig {
    pub start_menu: bool,
    pub desktop: bool,
}

impl Default for SetupConfig {
    fn default() -> Self {
        Self {
            app: AppConfig::default(),
            install_dir: default_install_dir(),
            payload_dir: None,
            files: default_files(),
            driver: DriverConfig::default(),
            service: ServiceConfig::default(),
            verify: VerifyConfig::default(),
            shortcuts: ShortcutConfig::default(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            id: "TempMon".to_string(),
            name: "TempMon".to_string(),
            publisher: "TempMon".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            executable: PathBuf::from("tempmon.exe"),
            icon: None,
        }
    }
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            primary: "PawnIO".to_string(),
            alternates: vec!["PawnIOLib".to_string()],
            installer: Path::new("drivers").join("PawnIO_setup.exe"),
            install_args: vec!["-install".to_string(), "-silent".to_string()],
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "LibreHardwareMonitorService".to_string(),
            display_name: "LibreHardwareMonitor Service".to_string(),
            binary: Path::new("service").join("LibreHardwareMonitorService.exe"),
            start_mode: StartMode::Automatic,
            service_type: ServiceType::Own,
        }
    }
}

impl Default for VerifyConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            attempts: 1,
            backoff_factor: 2,
        }
    }
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            start_menu: true,
            desktop: true,
        }
    }
}

fn default_files() -> Vec<FileEntry> {
    let entry = |source: &str, target: PathBuf| FileEntry {
        source: PathBuf::from(source),
        target,
    };
    vec![
        entry("tempmon.exe", PathBuf::from("tempmon.exe")),
        entry("PawnIO_setup.exe", Path::new("drivers").join("PawnIO_setup.exe")),
        entry(
            "LibreHardwareMonitorService.exe",
            Path::new("service").join("LibreHardwareMonitorService.exe"),
        ),
        entry(
            "LibreHardwareMonitorLib.dll",
            Path::new("service").join("LibreHardwareMonitorLib.dll"),
        ),
    ]
}

fn default_install_dir() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("C:\\Program Files"))
            .join("TempMon")
    }

    #[cfg(not(target_os = "windows"))]
    {
        dirs::data_local_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("tempmon")
    }
}

impl SetupConfig {
    /// Load configuration from `path`, or the built-in defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let raw = fs::read_to_string(path).map_err(|e| {
            SetupError::Config(format!("Failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration as TOML so a later run can `load` it back
    pub fn save(&self, path: &Path) -> Result<()> {
        let raw = toml::to_string_pretty(self)
            .map_err(|e| SetupError::Config(format!("Failed to serialize configuration: {e}")))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, raw).map_err(|e| {
            SetupError::Config(format!("Failed to write {}: {e}", path.display()))
        })
    }

    fn validate(&self) -> Result<()> {
        if self.driver.primary.trim().is_empty() {
            return Err(SetupError::Config("driver.primary must not be empty".to_string()));
        }
        if self.service.name.trim().is_empty() {
            return Err(SetupError::Config("service.name must not be empty".to_string()));
        }
        if self.app.id.trim().is_empty() {
            return Err(SetupError::Config("app.id must not be empty".to_string()));
        }
        Ok(())
    }

    /// Directory the deployment manifest is read from
    pub fn payload_dir(&self) -> PathBuf {
        if let Some(dir) = &self.payload_dir {
            return dir.clone();
        }
        std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn app_executable(&self) -> PathBuf {
        self.install_dir.join(&self.app.executable)
    }

    pub fn app_icon(&self) -> PathBuf {
        match &self.app.icon {
            Some(icon) => self.install_dir.join(icon),
            None => self.app_executable(),
        }
    }

    pub fn driver_installer(&self) -> PathBuf {
        self.install_dir.join(&self.driver.installer)
    }

    pub fn driver_candidate(&self) -> DependencyCandidate {
        DependencyCandidate::new(&self.driver.primary)
            .with_alternates(self.driver.alternates.iter().cloned())
    }

    pub fn service_spec(&self) -> ServiceSpec {
        ServiceSpec::new(
            &self.service.name,
            self.install_dir.join(&self.service.binary),
            &self.service.display_name,
        )
        .with_start_mode(self.service.start_mode)
        .with_service_type(self.service.service_type)
    }

    pub fn verify_policy(&self) -> VerifyPolicy {
        VerifyPolicy {
            settle_delay: Duration::from_millis(self.verify.settle_delay_ms),
            attempts: self.verify.attempts.max(1),
            backoff_factor: self.verify.backoff_factor.max(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_describe_the_tempmon_dependencies() {
        let cfg = SetupConfig::default();
        assert_eq!(cfg.driver.primary, "PawnIO");
        assert_eq!(cfg.service.name, "LibreHardwareMonitorService");
        assert_eq!(cfg.verify.settle_delay_ms, 2000);
        assert_eq!(cfg.verify.attempts, 1);
        assert!(cfg.files.iter().any(|f| f.target == cfg.driver.installer));
        assert!(cfg.files.iter().any(|f| f.target == cfg.service.binary));
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_fields() {
        let cfg: SetupConfig = toml::from_str(
            r#"
            install_dir = "/opt/tempmon"

            [driver]
            alternates = ["PawnIO_v2", "PawnIOLib"]

            [verify]
            settle_delay_ms = 0
            "#,
        )
        .unwrap();

        assert_eq!(cfg.install_dir, PathBuf::from("/opt/tempmon"));
        assert_eq!(cfg.driver.primary, "PawnIO");
        assert_eq!(cfg.driver.alternates.len(), 2);
        assert_eq!(cfg.verify.settle_delay_ms, 0);
        assert_eq!(cfg.verify.attempts, 1);
        assert_eq!(cfg.service.display_name, "LibreHardwareMonitor Service");
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = toml::from_str::<SetupConfig>("[driver]\nprimery = \"x\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn load_without_path_uses_defaults() {
        let cfg = SetupConfig::load(None).unwrap();
        assert_eq!(cfg.app.id, "TempMon");
    }

    #[test]
    fn load_rejects_empty_service_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("setup.toml");
        fs::write(&path, "[service]\nname = \"\"\n").unwrap();

        let err = SetupConfig::load(Some(&path)).unwrap_err();
        assert!(matches!(err, SetupError::Config(_)));
    }

    #[test]
    fn derived_paths_are_rooted_in_install_dir() {
        let cfg = SetupConfig {
            install_dir: PathBuf::from("/opt/tempmon"),
            ..SetupConfig::default()
        };
        assert!(cfg.driver_installer().starts_with("/opt/tempmon"));
        assert!(cfg.service_spec().binary_path.starts_with("/opt/tempmon"));
        assert_eq!(cfg.app_icon(), cfg.app_executable());
    }

    #[test]
    fn service_start_mode_and_type_are_configurable() {
        let cfg: SetupConfig = toml::from_str(
            "[service]\nstart_mode = \"manual\"\nservice_type = \"shared\"\n",
        )
        .unwrap();
        let spec = cfg.service_spec();
        assert_eq!(spec.start_mode, StartMode::Manual);
        assert_eq!(spec.service_type, ServiceType::Shared);

        let create = crate::system::sc::create(&spec);
        assert_eq!(&create.args[4..6], ["start=", "demand"]);
        assert_eq!(&create.args[8..10], ["type=", "share"]);

        assert!(toml::from_str::<SetupConfig>("[service]\nstart_mode = \"boot\"\n").is_err());
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("setup.toml");
        let mut cfg = SetupConfig {
            install_dir: dir.path().join("TempMon"),
            ..SetupConfig::default()
        };
        cfg.app.id = "TempMonBeta".to_string();
        cfg.service.start_mode = StartMode::Manual;

        cfg.save(&path).unwrap();
        let loaded = SetupConfig::load(Some(&path)).unwrap();

        assert_eq!(loaded.install_dir, cfg.install_dir);
        assert_eq!(loaded.app.id, "TempMonBeta");
        assert_eq!(loaded.service.start_mode, StartMode::Manual);
        assert_eq!(loaded.files, cfg.files);
    }

    #[test]
    fn verify_policy_never_has_zero_attempts() {
        let mut cfg = SetupConfig::default();
        cfg.verify.attempts = 0;
        cfg.verify.backoff_factor = 0;
        let policy = cfg.verify_policy();
        assert_eq!(policy.attempts, 1);
        assert_eq!(policy.backoff_factor, 1);
    }
}
