//! Service registration and run-state queries
//!
//! Registration is decided purely by the exit status of `sc query`. The run
//! state is parsed from the `STATE` line of the same command's output.

use log::{debug, warn};

use super::runner::CommandRunner;
use super::sc;

/// Whether a service or driver is registered with the service manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Found,
    NotFound,
}

impl Presence {
    pub fn is_found(self) -> bool {
        matches!(self, Presence::Found)
    }
}

/// Run state of a registered service or driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceState {
    Running,
    Stopped,
    StartPending,
    StopPending,
    Unknown,
}

impl ServiceState {
    pub fn is_running(self) -> bool {
        matches!(self, ServiceState::Running)
    }

    /// Parse the `STATE` line of `sc query` output
    pub fn parse(sc_output: &str) -> Self {
        let Some(line) = sc_output
            .lines()
            .map(str::trim)
            .find(|l| l.starts_with("STATE") && l.contains(':'))
        else {
            return ServiceState::Unknown;
        };

        match () {
            _ if line.contains("START_PENDING") => ServiceState::StartPending,
            _ if line.contains("STOP_PENDING") => ServiceState::StopPending,
            _ if line.contains("RUNNING") => ServiceState::Running,
            _ if line.contains("STOPPED") => ServiceState::Stopped,
            _ => ServiceState::Unknown,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ServiceState::Running => "Running",
            ServiceState::Stopped => "Stopped",
            ServiceState::StartPending => "Starting...",
            ServiceState::StopPending => "Stopping...",
            ServiceState::Unknown => "Unknown",
        }
    }
}

/// Read-only view of the service registry
pub struct SystemQuery<'a, R: ?Sized> {
    runner: &'a R,
}

impl<'a, R: CommandRunner + ?Sized> SystemQuery<'a, R> {
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// Exit status zero means registered. A query that cannot be launched
    /// counts as not registered.
    pub fn query(&self, name: &str) -> Presence {
        match self.runner.status(&sc::query(name)) {
            Ok(0) => {
                debug!("'{name}' is registered");
                Presence::Found
            }
            Ok(code) => {
                debug!("'{name}' is not registered (sc query exit {code})");
                Presence::NotFound
            }
            Err(e) => {
                warn!("Could not query '{name}': {e}");
                Presence::NotFound
            }
        }
    }

    /// Run state, or `None` when the name is not registered
    pub fn state(&self, name: &str) -> Option<ServiceState> {
        match self.runner.execute(&sc::query(name)) {
            Ok(output) if output.success() => Some(ServiceState::parse(&output.stdout)),
            Ok(_) => None,
            Err(e) => {
                warn!("Could not query '{name}': {e}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::error::{Result, SetupError};
    use crate::system::runner::{CommandOutput, Invocation};

    const RUNNING_OUTPUT: &str = "
SERVICE_NAME: PawnIO
        TYPE               : 1  KERNEL_DRIVER
        STATE              : 4  RUNNING
                                (STOPPABLE, NOT_PAUSABLE, IGNORES_SHUTDOWN)
        WIN32_EXIT_CODE    : 0  (0x0)
";

    struct Canned {
        reply: Option<CommandOutput>,
        seen: RefCell<Vec<Invocation>>,
    }

    impl CommandRunner for Canned {
        fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.seen.borrow_mut().push(invocation.clone());
            self.reply.clone().ok_or_else(|| SetupError::Spawn {
                program: "sc".to_string(),
                source: std::io::Error::from_raw_os_error(2),
            })
        }
    }

    fn canned(code: i32, stdout: &str) -> Canned {
        Canned {
            reply: Some(CommandOutput {
                code,
                stdout: stdout.to_string(),
            }),
            seen: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn parses_every_state() {
        assert_eq!(ServiceState::parse(RUNNING_OUTPUT), ServiceState::Running);
        assert_eq!(
            ServiceState::parse("STATE              : 1  STOPPED"),
            ServiceState::Stopped
        );
        assert_eq!(
            ServiceState::parse("  STATE : 2  START_PENDING"),
            ServiceState::StartPending
        );
        assert_eq!(
            ServiceState::parse("  STATE : 3  STOP_PENDING"),
            ServiceState::StopPending
        );
        assert_eq!(ServiceState::parse("STATE : 7  PAUSED"), ServiceState::Unknown);
        assert_eq!(ServiceState::parse(""), ServiceState::Unknown);
    }

    #[test]
    fn state_is_read_from_the_state_line_only() {
        let output = "SERVICE_NAME: RUNNING_SVC\n        STATE              : 1  STOPPED\n";
        assert_eq!(ServiceState::parse(output), ServiceState::Stopped);
    }

    #[test]
    fn zero_exit_means_found() {
        let runner = canned(0, RUNNING_OUTPUT);
        let query = SystemQuery::new(&runner);
        assert_eq!(query.query("PawnIO"), Presence::Found);
        assert_eq!(runner.seen.borrow()[0].args, ["query", "PawnIO"]);
    }

    #[test]
    fn nonzero_exit_means_not_found() {
        let runner = canned(1060, "[SC] EnumQueryServicesStatus:OpenService FAILED 1060");
        let query = SystemQuery::new(&runner);
        assert_eq!(query.query("PawnIO"), Presence::NotFound);
        assert_eq!(query.state("PawnIO"), None);
    }

    #[test]
    fn launch_failure_is_not_found_rather_than_error() {
        let runner = Canned {
            reply: None,
            seen: RefCell::new(Vec::new()),
        };
        let query = SystemQuery::new(&runner);
        assert_eq!(query.query("PawnIO"), Presence::NotFound);
        assert_eq!(query.state("PawnIO"), None);
    }

    #[test]
    fn state_of_registered_service() {
        let runner = canned(0, RUNNING_OUTPUT);
        assert_eq!(
            SystemQuery::new(&runner).state("PawnIO"),
            Some(ServiceState::Running)
        );
    }
}
