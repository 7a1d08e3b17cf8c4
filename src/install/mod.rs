//! TempMon installation and removal
//!
//! The orchestrators in [`orchestration`] and [`uninstall`] only talk to
//! their collaborators through traits (`Deployment`, `Registration`,
//! `Shortcuts`, `Confirmation`, `ProgressSink`); [`runners`] wires in the
//! real implementations for the console.

pub mod deploy;
pub mod orchestration;
pub mod progress;
pub mod prompt;
pub mod registration;
pub mod relaunch;
pub mod runners;
pub mod shortcuts;
pub mod status;
pub mod uninstall;

pub use deploy::{Deployment, FileDeployer};
pub use orchestration::{
    InstallSummary, Installer, saved_config_path, uninstall_command, uninstaller_path,
};
pub use progress::{InstallProgress, Level, ProgressSink};
pub use prompt::{Confirmation, FixedAnswer, InteractivePrompt};
pub use registration::{ManifestFile, Registration, UninstallEntry};
#[cfg(target_os = "windows")]
pub use registration::RegistryKey;
pub use relaunch::{is_inside, relaunch_outside_install_dir};
pub use runners::{InstallOptions, run_install, run_status, run_uninstall};
pub use shortcuts::{ShortcutSet, ShortcutStyle, Shortcuts};
pub use status::StatusReport;
pub use uninstall::{ServiceTeardown, UninstallSummary, Uninstaller};
