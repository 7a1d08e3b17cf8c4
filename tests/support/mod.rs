/*
 * Scripted stand-ins for the operating system.
 *
 * `FakeSystem` answers `sc`, the driver installer and `powershell`
 * from an in-memory service registry. The collaborator fakes append to a
 * shared journal so tests can assert step order across all of them.
 */

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;

use tempmon_setup::SetupConfig;
use tempmon_setup::error::{Result, SetupError};
use tempmon_setup::install::{Confirmation, Deployment, Registration, Shortcuts, UninstallEntry};
use tempmon_setup::system::{CommandOutput, CommandRunner, Invocation};

pub type Journal = Rc<RefCell<Vec<String>>>;

pub fn journal() -> Journal {
    Rc::new(RefCell::new(Vec::new()))
}

/// Position of the first journal entry starting with `prefix`
pub fn position(journal: &Journal, prefix: &str) -> usize {
    journal
        .borrow()
        .iter()
        .position(|entry| entry.starts_with(prefix))
        .unwrap_or_else(|| panic!("no journal entry starting with '{prefix}': {:?}", journal.borrow()))
}

/// Defaults with no settle delay so tests never sleep
pub fn test_config() -> SetupConfig {
    let mut config = SetupConfig {
        install_dir: PathBuf::from("/opt/tempmon"),
        ..SetupConfig::default()
    };
    config.verify.settle_delay_ms = 0;
    config
}

pub struct FakeSystem {
    registered: RefCell<BTreeSet<String>>,
    stopped: BTreeSet<String>,
    journal: Journal,
    /// `None` means the installer cannot be launched
    installer_exit: Option<i32>,
    driver_registers_as: Option<String>,
    visible_after: u32,
    pending: RefCell<Option<(String, u32)>>,
    create_exit: i32,
    start_exit: i32,
    stop_exit: i32,
    delete_exit: i32,
    installer_runs: Cell<u32>,
}

impl FakeSystem {
    pub fn new(journal: &Journal) -> Self {
        Self {
            registered: RefCell::new(BTreeSet::new()),
            stopped: BTreeSet::new(),
            journal: Rc::clone(journal),
            installer_exit: Some(0),
            driver_registers_as: None,
            visible_after: 0,
            pending: RefCell::new(None),
            create_exit: 0,
            start_exit: 0,
            stop_exit: 0,
            delete_exit: 0,
            installer_runs: Cell::new(0),
        }
    }

    pub fn with_registered(self, name: &str) -> Self {
        self.registered.borrow_mut().insert(name.to_string());
        self
    }

    /// Registered, but `sc query` reports it as stopped
    pub fn with_stopped(mut self, name: &str) -> Self {
        self.stopped.insert(name.to_string());
        self.with_registered(name)
    }

    pub fn installer_exits(mut self, code: i32) -> Self {
        self.installer_exit = Some(code);
        self
    }

    pub fn installer_missing(mut self) -> Self {
        self.installer_exit = None;
        self
    }

    /// The installer registers the driver under `name`
    pub fn driver_registers_as(mut self, name: &str) -> Self {
        self.driver_registers_as = Some(name.to_string());
        self
    }

    /// The registration only shows up on the `queries`-th `sc query` after install
    pub fn visible_after(mut self, queries: u32) -> Self {
        self.visible_after = queries;
        self
    }

    pub fn create_exits(mut self, code: i32) -> Self {
        self.create_exit = code;
        self
    }

    pub fn start_exits(mut self, code: i32) -> Self {
        self.start_exit = code;
        self
    }

    pub fn stop_exits(mut self, code: i32) -> Self {
        self.stop_exit = code;
        self
    }

    pub fn delete_exits(mut self, code: i32) -> Self {
        self.delete_exit = code;
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.registered.borrow().contains(name)
    }

    pub fn installer_runs(&self) -> u32 {
        self.installer_runs.get()
    }

    /// Whether `sc <verb> <name>` was issued
    pub fn issued(&self, verb: &str, name: &str) -> bool {
        let entry = format!("sc {verb} {name}");
        self.journal.borrow().iter().any(|e| *e == entry)
    }

    fn sc(&self, args: &[String]) -> CommandOutput {
        let verb = args.first().map(String::as_str).unwrap_or_default();
        let name = args.get(1).cloned().unwrap_or_default();
        self.journal.borrow_mut().push(format!("sc {verb} {name}"));

        let code = match verb {
            "query" => {
                self.tick();
                if self.is_registered(&name) { 0 } else { 1060 }
            }
            "create" => {
                if self.create_exit == 0 {
                    self.registered.borrow_mut().insert(name.clone());
                }
                self.create_exit
            }
            "start" => self.start_exit,
            "stop" => self.stop_exit,
            "delete" => {
                if self.delete_exit == 0 {
                    self.registered.borrow_mut().remove(&name);
                }
                self.delete_exit
            }
            _ => 1,
        };
        let stdout = if verb == "query" && code == 0 {
            let state = if self.stopped.contains(&name) { "1  STOPPED" } else { "4  RUNNING" };
            format!("SERVICE_NAME: {name}\n        STATE              : {state}\n")
        } else {
            String::new()
        };
        CommandOutput { code, stdout }
    }

    fn tick(&self) {
        let mut pending = self.pending.borrow_mut();
        if let Some((name, remaining)) = pending.as_mut() {
            *remaining = remaining.saturating_sub(1);
            if *remaining == 0 {
                self.registered.borrow_mut().insert(name.clone());
                *pending = None;
            }
        }
    }

    fn installer(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.journal
            .borrow_mut()
            .push(format!("installer {}", invocation.program_name()));
        self.installer_runs.set(self.installer_runs.get() + 1);

        let Some(code) = self.installer_exit else {
            return Err(SetupError::Spawn {
                program: invocation.program.display().to_string(),
                source: io::Error::from_raw_os_error(2),
            });
        };
        if let Some(name) = &self.driver_registers_as {
            if self.visible_after == 0 {
                self.registered.borrow_mut().insert(name.clone());
            } else {
                *self.pending.borrow_mut() = Some((name.clone(), self.visible_after));
            }
        }
        Ok(CommandOutput {
            code,
            stdout: String::new(),
        })
    }
}

impl CommandRunner for FakeSystem {
    fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
        match invocation.program_name().as_str() {
            "sc" => Ok(self.sc(&invocation.args)),
            "powershell" => {
                self.journal
                    .borrow_mut()
                    .push(format!("{} {}", invocation.program_name(), invocation.args[0]));
                Ok(CommandOutput::default())
            }
            _ => self.installer(invocation),
        }
    }
}

/// Deployment that only records calls
pub struct FakeFiles {
    journal: Journal,
    pub fail: bool,
}

impl FakeFiles {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            fail: false,
        }
    }

    pub fn failing(journal: &Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }

    fn outcome(&self) -> Result<()> {
        if self.fail {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied").into())
        } else {
            Ok(())
        }
    }
}

impl Deployment for FakeFiles {
    fn deploy(&self) -> Result<usize> {
        self.journal.borrow_mut().push("files deploy".to_string());
        self.outcome().map(|()| 4)
    }

    fn remove(&self) -> Result<()> {
        self.journal.borrow_mut().push("files remove".to_string());
        self.outcome()
    }
}

pub struct FakeRegistration {
    journal: Journal,
    pub fail: bool,
    pub written: RefCell<Option<UninstallEntry>>,
}

impl FakeRegistration {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
            fail: false,
            written: RefCell::new(None),
        }
    }

    pub fn failing(journal: &Journal) -> Self {
        Self {
            fail: true,
            ..Self::new(journal)
        }
    }
}

impl Registration for FakeRegistration {
    fn write(&self, entry: &UninstallEntry) -> Result<()> {
        self.journal.borrow_mut().push("registration write".to_string());
        if self.fail {
            return Err(SetupError::Registration("access denied writing uninstall key".to_string()));
        }
        *self.written.borrow_mut() = Some(entry.clone());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.journal.borrow_mut().push("registration remove".to_string());
        Ok(())
    }
}

pub struct FakeShortcuts {
    journal: Journal,
}

impl FakeShortcuts {
    pub fn new(journal: &Journal) -> Self {
        Self {
            journal: Rc::clone(journal),
        }
    }
}

impl Shortcuts for FakeShortcuts {
    fn create(&self) -> Result<()> {
        self.journal.borrow_mut().push("shortcuts create".to_string());
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        self.journal.borrow_mut().push("shortcuts remove".to_string());
        Ok(())
    }
}

/// Answers every question the same way and records that it was asked
pub struct ScriptedAnswer {
    journal: Journal,
    answer: bool,
}

impl ScriptedAnswer {
    pub fn new(journal: &Journal, answer: bool) -> Self {
        Self {
            journal: Rc::clone(journal),
            answer,
        }
    }
}

impl Confirmation for ScriptedAnswer {
    fn confirm(&mut self, _question: &str) -> bool {
        self.journal.borrow_mut().push("prompt".to_string());
        self.answer
    }
}
