//! Provisioning outcomes and exit-code classification

use std::fmt;

/// Exit code installers use for "succeeded, restart to finish"
pub const REBOOT_REQUIRED: i32 = 3010;

/// Result of ensuring one dependency is present.
///
/// Outcomes are reported, never acted on: nothing downstream changes what it
/// does to the filesystem based on which variant it got.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisioningOutcome {
    AlreadyPresent,
    InstalledOk,
    InstalledRebootRequired,
    /// Install step ran but exited with this nonzero code
    InstalledWithWarning(i32),
    /// Install step could not be launched
    Failed(i32),
}

impl ProvisioningOutcome {
    /// Classify the exit code of the driver's silent installer
    pub fn from_installer_exit(code: i32) -> Self {
        match code {
            0 => ProvisioningOutcome::InstalledOk,
            REBOOT_REQUIRED => ProvisioningOutcome::InstalledRebootRequired,
            other => ProvisioningOutcome::InstalledWithWarning(other),
        }
    }

    pub fn needs_reboot(self) -> bool {
        matches!(self, ProvisioningOutcome::InstalledRebootRequired)
    }

    pub fn is_warning(self) -> bool {
        matches!(
            self,
            ProvisioningOutcome::InstalledWithWarning(_) | ProvisioningOutcome::Failed(_)
        )
    }

    /// The exit or OS error code carried by warning outcomes
    pub fn code(self) -> Option<i32> {
        match self {
            ProvisioningOutcome::InstalledWithWarning(c) | ProvisioningOutcome::Failed(c) => {
                Some(c)
            }
            _ => None,
        }
    }
}

impl fmt::Display for ProvisioningOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisioningOutcome::AlreadyPresent => write!(f, "already installed"),
            ProvisioningOutcome::InstalledOk => write!(f, "installed"),
            ProvisioningOutcome::InstalledRebootRequired => write!(f, "installed, reboot required"),
            ProvisioningOutcome::InstalledWithWarning(code) => {
                write!(f, "installed with warning (exit code {code})")
            }
            ProvisioningOutcome::Failed(code) => write!(f, "could not be installed (error {code})"),
        }
    }
}
