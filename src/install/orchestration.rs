//! Installation sequencing.
//!
//! Files first (the driver installer and service binary are referenced by
//! path), then the driver and the service, then the uninstall entry, and
//! shortcuts last so they never point at a half-provisioned application.
//! Nothing is rolled back: each step's failure is reported and the next step
//! still runs.

use std::path::{Path, PathBuf};

use log::debug;

use super::deploy::Deployment;
use super::progress::{InstallProgress, ProgressSink};
use super::registration::{Registration, UninstallEntry};
use super::shortcuts::Shortcuts;
use crate::config::SetupConfig;
use crate::provision::{DriverProvisioner, DriverReport, ServiceProvisioner, ServiceReport};
use crate::system::CommandRunner;

/// Where the setup executable copies itself so it can run the uninstall later
pub fn uninstaller_path(config: &SetupConfig) -> PathBuf {
    config
        .install_dir
        .join(format!("tempmon-setup{}", std::env::consts::EXE_SUFFIX))
}

/// Copy of the active configuration kept next to the uninstaller
pub fn saved_config_path(config: &SetupConfig) -> PathBuf {
    config.install_dir.join("setup.toml")
}

/// Command line recorded as the uninstall entry's `UninstallString`
pub fn uninstall_command(config: &SetupConfig, saved_config: Option<&Path>) -> String {
    let exe = uninstaller_path(config);
    match saved_config {
        Some(path) => format!("\"{}\" --config \"{}\" uninstall", exe.display(), path.display()),
        None => format!("\"{}\" uninstall", exe.display()),
    }
}

/// What happened during one install run, for the completion screen
#[derive(Debug, Clone)]
pub struct InstallSummary {
    pub files_deployed: bool,
    pub driver: DriverReport,
    pub service: ServiceReport,
    pub registered: bool,
    /// `None` when shortcuts were not requested
    pub shortcuts_created: Option<bool>,
}

impl InstallSummary {
    pub fn reboot_required(&self) -> bool {
        self.driver.outcome.needs_reboot()
    }

    pub fn degraded(&self) -> bool {
        !self.files_deployed
            || self.service.needs_attention()
            || self.driver.outcome.is_warning()
            || (self.driver.is_inconclusive() && !self.reboot_required())
    }

    /// One-line verdict shown at the end of the install
    pub fn headline(&self) -> &'static str {
        if self.degraded() {
            "Installation complete. TempMon may have limited functionality."
        } else if self.reboot_required() {
            "Installation complete. TempMon will function after a reboot."
        } else {
            "Installation complete."
        }
    }
}

pub struct Installer<'a, R: ?Sized> {
    config: &'a SetupConfig,
    runner: &'a R,
    files: &'a dyn Deployment,
    registration: &'a dyn Registration,
    shortcuts: Option<&'a dyn Shortcuts>,
    persist: bool,
    uninstall_command: Option<String>,
}

impl<'a, R: CommandRunner + ?Sized> Installer<'a, R> {
    pub fn new(
        config: &'a SetupConfig,
        runner: &'a R,
        files: &'a dyn Deployment,
        registration: &'a dyn Registration,
    ) -> Self {
        Self {
            config,
            runner,
            files,
            registration,
            shortcuts: None,
            persist: false,
            uninstall_command: None,
        }
    }

    pub fn with_shortcuts(mut self, shortcuts: &'a dyn Shortcuts) -> Self {
        self.shortcuts = Some(shortcuts);
        self
    }

    /// Keep a copy of the configuration in the install directory and point
    /// the uninstall command at it
    pub fn saving_config(mut self) -> Self {
        self.persist = true;
        self
    }

    pub fn with_uninstall_command(mut self, command: impl Into<String>) -> Self {
        self.uninstall_command = Some(command.into());
        self
    }

    fn persist_config(&self, progress: &mut dyn ProgressSink) -> Option<PathBuf> {
        if !self.persist {
            return None;
        }
        let path = saved_config_path(self.config);
        match self.config.save(&path) {
            Ok(()) => {
                debug!("Saved configuration to {}", path.display());
                Some(path)
            }
            Err(e) => {
                progress.report(InstallProgress::warning(
                    "files",
                    0.22,
                    format!("Uninstall will use default settings: {e}"),
                ));
                None
            }
        }
    }

    pub fn run(&self, progress: &mut dyn ProgressSink) -> InstallSummary {
        progress.report(InstallProgress::new("files", 0.0, "Deploying application files..."));
        let files_deployed = match self.files.deploy() {
            Ok(count) => {
                progress.report(InstallProgress::success(
                    "files",
                    0.2,
                    format!("Deployed {count} files to {}", self.config.install_dir.display()),
                ));
                true
            }
            Err(e) => {
                progress.report(InstallProgress::warning(
                    "files",
                    0.2,
                    format!("File deployment incomplete: {e}"),
                ));
                false
            }
        };

        let saved_config = self.persist_config(progress);

        progress.report(InstallProgress::new(
            "driver",
            0.25,
            format!("Checking {} driver...", self.config.driver.primary),
        ));
        let driver = DriverProvisioner::from_config(self.runner, self.config).provision();
        progress.report(InstallProgress::outcome(
            "driver",
            0.5,
            !driver.needs_attention(),
            driver.to_string(),
        ));

        progress.report(InstallProgress::new(
            "service",
            0.55,
            format!("Checking {} service...", self.config.service.name),
        ));
        let service = ServiceProvisioner::from_config(self.runner, self.config).provision();
        progress.report(InstallProgress::outcome(
            "service",
            0.75,
            !service.needs_attention(),
            service.to_string(),
        ));

        let command = self
            .uninstall_command
            .clone()
            .unwrap_or_else(|| uninstall_command(self.config, saved_config.as_deref()));
        let entry = UninstallEntry::from_config(self.config, command);
        let registered = match self.registration.write(&entry) {
            Ok(()) => {
                progress.report(InstallProgress::success("registry", 0.85, "Registered for uninstall"));
                true
            }
            Err(e) => {
                progress.report(InstallProgress::warning("registry", 0.85, e.to_string()));
                false
            }
        };

        let shortcuts_created = self.shortcuts.map(|shortcuts| match shortcuts.create() {
            Ok(()) => {
                progress.report(InstallProgress::success("shortcuts", 0.95, "Created shortcuts"));
                true
            }
            Err(e) => {
                progress.report(InstallProgress::warning("shortcuts", 0.95, e.to_string()));
                false
            }
        });

        let summary = InstallSummary {
            files_deployed,
            driver,
            service,
            registered,
            shortcuts_created,
        };
        progress.report(InstallProgress::outcome(
            "complete",
            1.0,
            !summary.degraded(),
            summary.headline(),
        ));
        summary
    }
}
