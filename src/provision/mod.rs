//! Dependency provisioning: check, install when missing, verify.
//!
//! Each dependency is a predicate over the live service registry plus an
//! install action. Presence is re-queried for every decision and never cached
//! between steps.

mod driver;
mod outcome;
mod service;

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use driver::{DriverProvisioner, DriverReport, Verification};
pub use outcome::{ProvisioningOutcome, REBOOT_REQUIRED};
pub use service::{ServiceProvisioner, ServiceReport, ServiceStep};

/// A dependency that may be registered under more than one service name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyCandidate {
    pub name: String,
    pub alternates: Vec<String>,
}

impl DependencyCandidate {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alternates: Vec::new(),
        }
    }

    pub fn with_alternates<I, S>(mut self, alternates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.alternates
            .extend(alternates.into_iter().map(Into::into));
        self
    }

    /// Canonical name first, then alternates in configured order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.alternates.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StartMode {
    #[default]
    Automatic,
    /// Started on demand only
    Manual,
}

impl StartMode {
    pub fn as_sc_arg(self) -> &'static str {
        match self {
            StartMode::Automatic => "auto",
            StartMode::Manual => "demand",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    /// Runs in its own process
    #[default]
    Own,
    Shared,
}

impl ServiceType {
    pub fn as_sc_arg(self) -> &'static str {
        match self {
            ServiceType::Own => "own",
            ServiceType::Shared => "share",
        }
    }
}

/// Registration parameters for the background service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
    pub name: String,
    pub binary_path: PathBuf,
    pub display_name: String,
    pub start_mode: StartMode,
    pub service_type: ServiceType,
}

impl ServiceSpec {
    pub fn new(
        name: impl Into<String>,
        binary_path: impl Into<PathBuf>,
        display_name: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            binary_path: binary_path.into(),
            display_name: display_name.into(),
            start_mode: StartMode::default(),
            service_type: ServiceType::default(),
        }
    }

    pub fn with_start_mode(mut self, start_mode: StartMode) -> Self {
        self.start_mode = start_mode;
        self
    }

    pub fn with_service_type(mut self, service_type: ServiceType) -> Self {
        self.service_type = service_type;
        self
    }
}

/// When to re-query after installing the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyPolicy {
    pub settle_delay: Duration,
    pub attempts: u32,
    pub backoff_factor: u32,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            settle_delay: Duration::from_secs(2),
            attempts: 1,
            backoff_factor: 2,
        }
    }
}

impl VerifyPolicy {
    /// Policy with no waiting at all
    pub fn immediate() -> Self {
        Self {
            settle_delay: Duration::ZERO,
            attempts: 1,
            backoff_factor: 1,
        }
    }

    /// Wait before each verification query
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let factor = self.backoff_factor.max(1);
        std::iter::successors(Some(self.settle_delay), move |d| Some(d.saturating_mul(factor)))
            .take(self.attempts.max(1) as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_names_start_with_canonical() {
        let candidate = DependencyCandidate::new("PawnIO").with_alternates(["PawnIOLib", "PawnIO2"]);
        let names: Vec<&str> = candidate.names().collect();
        assert_eq!(names, ["PawnIO", "PawnIOLib", "PawnIO2"]);
    }

    #[test]
    fn service_spec_defaults_to_automatic_own_process() {
        let spec = ServiceSpec::new("Svc", "svc.exe", "Service");
        assert_eq!(spec.start_mode.as_sc_arg(), "auto");
        assert_eq!(spec.service_type.as_sc_arg(), "own");
    }

    #[test]
    fn default_policy_is_single_two_second_wait() {
        let delays: Vec<Duration> = VerifyPolicy::default().delays().collect();
        assert_eq!(delays, [Duration::from_secs(2)]);
    }

    #[test]
    fn backoff_multiplies_each_wait() {
        let policy = VerifyPolicy {
            settle_delay: Duration::from_millis(500),
            attempts: 4,
            backoff_factor: 2,
        };
        let delays: Vec<u128> = policy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(delays, [500, 1000, 2000, 4000]);
    }
}
