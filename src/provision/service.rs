//! Background telemetry service provisioning.
//!
//! Creation and start are separate failure points: a created-but-stopped
//! service is reported differently from one that never registered.

use std::fmt;

use log::{info, warn};

use super::{ProvisioningOutcome, ServiceSpec};
use crate::config::SetupConfig;
use crate::system::{CommandRunner, SystemQuery, sc};

/// Step that produced a warning outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStep {
    Create,
    Start,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceReport {
    pub service: String,
    pub outcome: ProvisioningOutcome,
    pub failed_step: Option<ServiceStep>,
}

impl ServiceReport {
    pub fn needs_attention(&self) -> bool {
        self.outcome.is_warning()
    }
}

impl fmt::Display for ServiceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.failed_step, self.outcome.code()) {
            (Some(ServiceStep::Create), Some(code)) => write!(
                f,
                "{} service could not be created (exit code {code})",
                self.service
            ),
            (Some(ServiceStep::Start), Some(code)) => write!(
                f,
                "{} service created but not started (exit code {code})",
                self.service
            ),
            _ => write!(f, "{} service {}", self.service, self.outcome),
        }
    }
}

/// Ensures the telemetry service is registered and running
pub struct ServiceProvisioner<'a, R: ?Sized> {
    runner: &'a R,
    spec: ServiceSpec,
}

impl<'a, R: CommandRunner + ?Sized> ServiceProvisioner<'a, R> {
    pub fn new(runner: &'a R, spec: ServiceSpec) -> Self {
        Self { runner, spec }
    }

    pub fn from_config(runner: &'a R, config: &SetupConfig) -> Self {
        Self::new(runner, config.service_spec())
    }

    pub fn provision(&self) -> ServiceReport {
        let name = &self.spec.name;

        if SystemQuery::new(self.runner).query(name).is_found() {
            info!("Service '{name}' is already installed");
            return self.report(ProvisioningOutcome::AlreadyPresent, None);
        }

        info!("Creating service '{name}' ({})", self.spec.binary_path.display());
        match self.runner.status(&sc::create(&self.spec)) {
            Ok(0) => {}
            Ok(code) => {
                warn!("Service '{name}' could not be created (exit code {code}); not starting it");
                return self.report(
                    ProvisioningOutcome::InstalledWithWarning(code),
                    Some(ServiceStep::Create),
                );
            }
            Err(e) => {
                warn!("Service create command did not run: {e}");
                return self.report(
                    ProvisioningOutcome::Failed(e.launch_code()),
                    Some(ServiceStep::Create),
                );
            }
        }

        match self.runner.status(&sc::start(name)) {
            Ok(0) => {
                info!("Service '{name}' created and started");
                self.report(ProvisioningOutcome::InstalledOk, None)
            }
            Ok(code) => {
                warn!("Service '{name}' created but failed to start (exit code {code})");
                self.report(
                    ProvisioningOutcome::InstalledWithWarning(code),
                    Some(ServiceStep::Start),
                )
            }
            Err(e) => {
                warn!("Service start command did not run: {e}");
                self.report(
                    ProvisioningOutcome::Failed(e.launch_code()),
                    Some(ServiceStep::Start),
                )
            }
        }
    }

    fn report(&self, outcome: ProvisioningOutcome, failed_step: Option<ServiceStep>) -> ServiceReport {
        ServiceReport {
            service: self.spec.name.clone(),
            outcome,
            failed_step,
        }
    }
}
