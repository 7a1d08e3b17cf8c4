//! Kernel driver provisioning.
//!
//! The driver may be registered under its canonical name or an alternate one
//! (a re-signed build registers differently but behaves the same), so every
//! presence check walks all candidate names before concluding absence.

use std::fmt;
use std::path::Path;
use std::thread;

use log::{info, warn};

use super::{DependencyCandidate, ProvisioningOutcome, VerifyPolicy};
use crate::config::SetupConfig;
use crate::system::{CommandRunner, Invocation, SystemQuery};

/// Post-install re-check of the driver registration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// Registered under this name
    Verified(String),
    /// Still not visible; usually active only after a reboot
    Inconclusive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverReport {
    pub driver: String,
    pub outcome: ProvisioningOutcome,
    /// Name the driver was found under when it was already present
    pub matched: Option<String>,
    /// Only set when an install was attempted
    pub verification: Option<Verification>,
}

impl DriverReport {
    pub fn is_inconclusive(&self) -> bool {
        matches!(self.verification, Some(Verification::Inconclusive))
    }

    /// Whether the user should be told about a degraded or pending state
    pub fn needs_attention(&self) -> bool {
        self.outcome.is_warning() || self.outcome.needs_reboot() || self.is_inconclusive()
    }
}

impl fmt::Display for DriverReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} driver {}", self.driver, self.outcome)?;
        if let Some(name) = self.matched.as_deref().filter(|n| *n != self.driver) {
            write!(f, " (registered as '{name}')")?;
        }
        match &self.verification {
            Some(Verification::Verified(_)) => write!(f, ", verified"),
            Some(Verification::Inconclusive) if self.outcome.needs_reboot() => {
                write!(f, ", verification inconclusive")
            }
            Some(Verification::Inconclusive) => {
                write!(f, ", verification inconclusive, may require reboot")
            }
            None => Ok(()),
        }
    }
}

/// Ensures the kernel driver is registered, running its silent installer if not
pub struct DriverProvisioner<'a, R: ?Sized> {
    runner: &'a R,
    candidate: DependencyCandidate,
    installer: Invocation,
    policy: VerifyPolicy,
}

impl<'a, R: CommandRunner + ?Sized> DriverProvisioner<'a, R> {
    pub fn new(
        runner: &'a R,
        candidate: DependencyCandidate,
        installer: Invocation,
        policy: VerifyPolicy,
    ) -> Self {
        Self {
            runner,
            candidate,
            installer,
            policy,
        }
    }

    pub fn from_config(runner: &'a R, config: &SetupConfig) -> Self {
        Self::new(
            runner,
            config.driver_candidate(),
            installer_invocation(&config.driver_installer(), &config.driver.install_args),
            config.verify_policy(),
        )
    }

    /// First candidate name currently registered, if any
    fn find_registered(&self) -> Option<String> {
        let query = SystemQuery::new(self.runner);
        self.candidate
            .names()
            .find(|name| query.query(name).is_found())
            .map(str::to_string)
    }

    pub fn provision(&self) -> DriverReport {
        let driver = self.candidate.name.clone();

        if let Some(name) = self.find_registered() {
            if name == driver {
                info!("Driver '{driver}' is already installed");
            } else {
                info!("Driver '{driver}' is already installed under alternate name '{name}'");
            }
            return DriverReport {
                driver,
                outcome: ProvisioningOutcome::AlreadyPresent,
                matched: Some(name),
                verification: None,
            };
        }

        info!("Driver '{driver}' not found, running {}", self.installer);
        let outcome = match self.runner.status(&self.installer) {
            Ok(code) => ProvisioningOutcome::from_installer_exit(code),
            Err(e) => {
                warn!("Driver installer did not run: {e}");
                ProvisioningOutcome::Failed(e.launch_code())
            }
        };
        match outcome {
            ProvisioningOutcome::InstalledOk => info!("Driver installer finished"),
            ProvisioningOutcome::InstalledRebootRequired => {
                info!("Driver installed; a reboot is required before it is active")
            }
            other => warn!("Driver {other}; continuing"),
        }

        let verification = self.verify();
        match &verification {
            Verification::Verified(name) => info!("Driver verified as '{name}'"),
            Verification::Inconclusive => {
                warn!("Driver verification inconclusive, may require reboot")
            }
        }

        DriverReport {
            driver,
            outcome,
            matched: None,
            verification: Some(verification),
        }
    }

    /// Give the OS time to register the driver, then re-query every candidate name
    fn verify(&self) -> Verification {
        for delay in self.policy.delays() {
            if !delay.is_zero() {
                thread::sleep(delay);
            }
            if let Some(name) = self.find_registered() {
                return Verification::Verified(name);
            }
        }
        Verification::Inconclusive
    }
}

fn installer_invocation(installer: &Path, args: &[String]) -> Invocation {
    Invocation::new(installer).args(args.iter().cloned())
}
