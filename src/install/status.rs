//! Driver and service run state, as shown by `status`

use crate::config::SetupConfig;
use crate::system::{CommandRunner, ServiceState, SystemQuery};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    /// Registered driver name (canonical or alternate) and its state
    pub driver: Option<(String, ServiceState)>,
    pub service: Option<ServiceState>,
}

impl StatusReport {
    pub fn collect<R: CommandRunner + ?Sized>(runner: &R, config: &SetupConfig) -> Self {
        let query = SystemQuery::new(runner);
        let candidate = config.driver_candidate();
        let driver = candidate
            .names()
            .find_map(|name| query.state(name).map(|state| (name.to_string(), state)));
        let service = query.state(&config.service.name);
        Self { driver, service }
    }

    pub fn all_running(&self) -> bool {
        let driver_running = self
            .driver
            .as_ref()
            .is_some_and(|(_, state)| state.is_running());
        driver_running && self.service.is_some_and(ServiceState::is_running)
    }
}
