//! Uninstallation and cleanup.
//!
//! The shared-service question comes first because removing the service is
//! the only step visible outside this application. Everything after it is
//! local cleanup and always runs. The driver is never removed.

use std::fmt;

use log::{info, warn};

use super::deploy::Deployment;
use super::progress::{InstallProgress, ProgressSink};
use super::prompt::Confirmation;
use super::registration::Registration;
use super::shortcuts::Shortcuts;
use crate::config::SetupConfig;
use crate::system::{CommandRunner, SystemQuery, sc};

/// What happened to the shared service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceTeardown {
    /// User chose to keep it
    Kept,
    NotRegistered,
    /// Deleted; `stop_code` is the exit of the preceding stop (nonzero when it was not running)
    Removed { stop_code: i32 },
    DeleteFailed(i32),
}

impl ServiceTeardown {
    pub fn is_failure(self) -> bool {
        matches!(self, Self::DeleteFailed(_))
    }
}

impl fmt::Display for ServiceTeardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Kept => write!(f, "Keeping the shared service"),
            Self::NotRegistered => write!(f, "Service was not installed"),
            Self::Removed { .. } => write!(f, "Service removed"),
            Self::DeleteFailed(code) => {
                write!(f, "Service could not be deleted (exit code {code})")
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UninstallSummary {
    pub service: ServiceTeardown,
    pub files_removed: bool,
    pub shortcuts_removed: bool,
    pub unregistered: bool,
}

impl UninstallSummary {
    pub fn clean(&self) -> bool {
        self.files_removed
            && self.shortcuts_removed
            && self.unregistered
            && !self.service.is_failure()
    }
}

pub struct Uninstaller<'a, R: ?Sized> {
    config: &'a SetupConfig,
    runner: &'a R,
    files: &'a dyn Deployment,
    registration: &'a dyn Registration,
    shortcuts: &'a dyn Shortcuts,
}

impl<'a, R: CommandRunner + ?Sized> Uninstaller<'a, R> {
    pub fn new(
        config: &'a SetupConfig,
        runner: &'a R,
        files: &'a dyn Deployment,
        registration: &'a dyn Registration,
        shortcuts: &'a dyn Shortcuts,
    ) -> Self {
        Self {
            config,
            runner,
            files,
            registration,
            shortcuts,
        }
    }

    pub fn shared_service_question(&self) -> String {
        format!(
            "Remove the shared {} ({})?",
            self.config.service.display_name, self.config.service.name
        )
    }

    pub fn run(
        &self,
        prompt: &mut dyn Confirmation,
        progress: &mut dyn ProgressSink,
    ) -> UninstallSummary {
        let service = if prompt.confirm(&self.shared_service_question()) {
            self.remove_service()
        } else {
            ServiceTeardown::Kept
        };
        progress.report(match service {
            ServiceTeardown::Kept => InstallProgress::new("service", 0.3, service.to_string()),
            _ => InstallProgress::outcome("service", 0.3, !service.is_failure(), service.to_string()),
        });

        let files_removed = match self.files.remove() {
            Ok(()) => {
                progress.report(InstallProgress::success(
                    "files",
                    0.6,
                    format!("Removed {}", self.config.install_dir.display()),
                ));
                true
            }
            Err(e) => {
                progress.report(InstallProgress::warning(
                    "files",
                    0.6,
                    format!("Failed to remove installation directory: {e}"),
                ));
                false
            }
        };

        let shortcuts_removed = match self.shortcuts.remove() {
            Ok(()) => {
                progress.report(InstallProgress::success("shortcuts", 0.8, "Removed shortcuts"));
                true
            }
            Err(e) => {
                progress.report(InstallProgress::warning("shortcuts", 0.8, e.to_string()));
                false
            }
        };

        let unregistered = match self.registration.remove() {
            Ok(()) => {
                progress.report(InstallProgress::success("registry", 1.0, "Removed uninstall entry"));
                true
            }
            Err(e) => {
                progress.report(InstallProgress::warning("registry", 1.0, e.to_string()));
                false
            }
        };

        UninstallSummary {
            service,
            files_removed,
            shortcuts_removed,
            unregistered,
        }
    }

    /// Stop then delete; a failed stop never prevents the delete
    fn remove_service(&self) -> ServiceTeardown {
        let name = &self.config.service.name;
        if !SystemQuery::new(self.runner).query(name).is_found() {
            info!("Service '{name}' is not registered; nothing to remove");
            return ServiceTeardown::NotRegistered;
        }

        let stop_code = match self.runner.status(&sc::stop(name)) {
            Ok(code) => code,
            Err(e) => e.launch_code(),
        };
        if stop_code != 0 {
            warn!("Stopping '{name}' returned {stop_code}; deleting anyway");
        }

        let delete_code = match self.runner.status(&sc::delete(name)) {
            Ok(code) => code,
            Err(e) => e.launch_code(),
        };
        if delete_code == 0 {
            info!("Service '{name}' deleted");
            ServiceTeardown::Removed { stop_code }
        } else {
            warn!("Deleting '{name}' returned {delete_code}");
            ServiceTeardown::DeleteFailed(delete_code)
        }
    }
}
