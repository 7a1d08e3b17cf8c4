//! Start Menu and desktop shortcuts.
//!
//! Windows `.lnk` files are written through the WScript.Shell COM object via
//! PowerShell; other platforms get freedesktop `.desktop` entries.

use std::fs;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::config::SetupConfig;
use crate::error::{Result, SetupError};
use crate::system::{CommandRunner, Invocation};

pub trait Shortcuts {
    fn create(&self) -> Result<()>;
    fn remove(&self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutStyle {
    /// `.lnk` created with PowerShell
    WindowsLink,
    /// `.desktop` file
    DesktopEntry,
}

impl ShortcutStyle {
    pub fn native() -> Self {
        if cfg!(target_os = "windows") {
            ShortcutStyle::WindowsLink
        } else {
            ShortcutStyle::DesktopEntry
        }
    }

    fn extension(self) -> &'static str {
        match self {
            ShortcutStyle::WindowsLink => "lnk",
            ShortcutStyle::DesktopEntry => "desktop",
        }
    }
}

/// One application shortcut placed in several directories
pub struct ShortcutSet<'a, R: ?Sized> {
    runner: &'a R,
    style: ShortcutStyle,
    name: String,
    target: PathBuf,
    icon: PathBuf,
    locations: Vec<PathBuf>,
}

impl<'a, R: CommandRunner + ?Sized> ShortcutSet<'a, R> {
    pub fn new(
        runner: &'a R,
        style: ShortcutStyle,
        name: impl Into<String>,
        target: impl Into<PathBuf>,
    ) -> Self {
        let target = target.into();
        Self {
            runner,
            style,
            name: name.into(),
            icon: target.clone(),
            target,
            locations: Vec::new(),
        }
    }

    /// Start Menu and/or desktop shortcuts as configured
    pub fn from_config(runner: &'a R, config: &SetupConfig) -> Self {
        let mut set = Self::new(
            runner,
            ShortcutStyle::native(),
            &config.app.name,
            config.app_executable(),
        )
        .with_icon(config.app_icon());

        if config.shortcuts.start_menu {
            match start_menu_dir() {
                Some(dir) => set = set.at(dir),
                None => warn!("Could not determine the Start Menu directory"),
            }
        }
        if config.shortcuts.desktop {
            match dirs::desktop_dir() {
                Some(dir) => set = set.at(dir),
                None => warn!("Could not determine the desktop directory"),
            }
        }
        set
    }

    pub fn with_icon(mut self, icon: impl Into<PathBuf>) -> Self {
        self.icon = icon.into();
        self
    }

    /// Add a directory to place the shortcut in
    pub fn at(mut self, dir: impl Into<PathBuf>) -> Self {
        self.locations.push(dir.into());
        self
    }

    /// Full path of every shortcut file this set manages
    pub fn paths(&self) -> Vec<PathBuf> {
        let file = format!("{}.{}", self.name, self.style.extension());
        self.locations.iter().map(|dir| dir.join(&file)).collect()
    }

    fn create_one(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        match self.style {
            ShortcutStyle::WindowsLink => {
                let code = self.runner.status(&self.link_invocation(path))?;
                if code != 0 {
                    return Err(SetupError::Shortcut(format!(
                        "powershell exited with {code} creating {}",
                        path.display()
                    )));
                }
            }
            ShortcutStyle::DesktopEntry => fs::write(path, self.desktop_entry())?,
        }
        info!("Created shortcut {}", path.display());
        Ok(())
    }

    fn link_invocation(&self, path: &Path) -> Invocation {
        let working_dir = self.target.parent().unwrap_or(Path::new("."));
        let script = format!(
            "$s = (New-Object -ComObject WScript.Shell).CreateShortcut('{}'); \
             $s.TargetPath = '{}'; $s.WorkingDirectory = '{}'; $s.IconLocation = '{}'; $s.Save()",
            ps_quote(path),
            ps_quote(&self.target),
            ps_quote(working_dir),
            ps_quote(&self.icon),
        );
        Invocation::new("powershell").args([
            "-NoProfile".to_string(),
            "-NonInteractive".to_string(),
            "-ExecutionPolicy".to_string(),
            "Bypass".to_string(),
            "-Command".to_string(),
            script,
        ])
    }

    fn desktop_entry(&self) -> String {
        format!(
            "[Desktop Entry]\nType=Application\nName={}\nExec=\"{}\"\nIcon={}\nTerminal=false\n",
            self.name,
            self.target.display(),
            self.icon.display()
        )
    }
}

impl<R: CommandRunner + ?Sized> Shortcuts for ShortcutSet<'_, R> {
    fn create(&self) -> Result<()> {
        let mut failed = 0;
        for path in self.paths() {
            if let Err(e) = self.create_one(&path) {
                warn!("{e}");
                failed += 1;
            }
        }
        if failed > 0 {
            return Err(SetupError::Shortcut(format!("{failed} shortcut(s) not created")));
        }
        Ok(())
    }

    fn remove(&self) -> Result<()> {
        for path in self.paths() {
            match fs::remove_file(&path) {
                Ok(()) => info!("Removed shortcut {}", path.display()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => warn!("Failed to remove shortcut {}: {e}", path.display()),
            }
        }
        Ok(())
    }
}

cfg_if::cfg_if! {
    if #[cfg(target_os = "windows")] {
        fn start_menu_dir() -> Option<PathBuf> {
            dirs::data_dir().map(|d| d.join("Microsoft\\Windows\\Start Menu\\Programs"))
        }
    } else {
        fn start_menu_dir() -> Option<PathBuf> {
            dirs::data_dir().map(|d| d.join("applications"))
        }
    }
}

/// Single-quoted PowerShell literal body: embedded quotes are doubled
fn ps_quote(path: &Path) -> String {
    path.to_string_lossy().replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::system::CommandOutput;

    #[derive(Default)]
    struct Recorder {
        code: i32,
        seen: RefCell<Vec<Invocation>>,
    }

    impl CommandRunner for Recorder {
        fn execute(&self, invocation: &Invocation) -> Result<CommandOutput> {
            self.seen.borrow_mut().push(invocation.clone());
            Ok(CommandOutput {
                code: self.code,
                stdout: String::new(),
            })
        }
    }

    #[test]
    fn desktop_entries_are_written_and_removed() {
        let runner = Recorder::default();
        let menu = tempfile::tempdir().unwrap();
        let desk = tempfile::tempdir().unwrap();
        let set = ShortcutSet::new(&runner, ShortcutStyle::DesktopEntry, "TempMon", "/opt/tempmon/tempmon")
            .at(menu.path())
            .at(desk.path());

        set.create().unwrap();
        let entry = fs::read_to_string(menu.path().join("TempMon.desktop")).unwrap();
        assert!(entry.contains("Exec=\"/opt/tempmon/tempmon\""));
        assert!(desk.path().join("TempMon.desktop").is_file());
        assert!(runner.seen.borrow().is_empty());

        set.remove().unwrap();
        assert!(!menu.path().join("TempMon.desktop").exists());
        set.remove().unwrap();
    }

    #[test]
    fn windows_links_go_through_powershell() {
        let runner = Recorder::default();
        let menu = tempfile::tempdir().unwrap();
        let set = ShortcutSet::new(
            &runner,
            ShortcutStyle::WindowsLink,
            "TempMon",
            "C:/Program Files/O'Brien/tempmon.exe",
        )
        .at(menu.path());

        set.create().unwrap();
        let seen = runner.seen.borrow();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].program_name(), "powershell");
        let script = seen[0].args.last().unwrap();
        assert!(script.contains("TempMon.lnk"));
        assert!(script.contains("O''Brien"));
    }

    #[test]
    fn failing_powershell_is_a_shortcut_error() {
        let runner = Recorder {
            code: 1,
            ..Recorder::default()
        };
        let menu = tempfile::tempdir().unwrap();
        let set = ShortcutSet::new(&runner, ShortcutStyle::WindowsLink, "TempMon", "C:/t.exe")
            .at(menu.path());
        assert!(matches!(set.create(), Err(SetupError::Shortcut(_))));
    }
}
