//! Console runners for install, uninstall and status
//!
//! These wire the real collaborators (`SystemRunner`, file deployer, native
//! registration and shortcuts) into the orchestrators and render their
//! progress on the terminal.

use std::io::Write;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use super::deploy::FileDeployer;
use super::orchestration::{InstallSummary, Installer, uninstaller_path};
use super::progress::{InstallProgress, Level, ProgressSink};
use super::prompt::{Confirmation, FixedAnswer, InteractivePrompt};
use super::registration;
use super::shortcuts::ShortcutSet;
use super::status::StatusReport;
use super::uninstall::{UninstallSummary, Uninstaller};
use crate::config::SetupConfig;
use crate::privilege;
use crate::system::{ServiceState, SystemRunner};

/// Options gathered from the command line
#[derive(Debug, Clone)]
pub struct InstallOptions {
    pub shortcuts: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self { shortcuts: true }
    }
}

/// Drives an indicatif bar; step results are printed above it
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new() -> Result<Self> {
        let bar = ProgressBar::new(100);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{bar:50.cyan/blue}] {pos:>3}%  {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("█▓░"),
        );
        Ok(Self { bar })
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl ProgressSink for BarProgress {
    fn report(&mut self, progress: InstallProgress) {
        self.bar.set_position((progress.progress * 100.0).round() as u64);
        match progress.level {
            Level::Info => self.bar.set_message(progress.message),
            Level::Success => self.bar.println(format!("  ✓ {}", progress.message)),
            Level::Warning => self.bar.println(format!("  ⚠ {}", progress.message)),
        }
    }
}

/// Plain colored lines, for runs that also prompt on the terminal
pub struct LineProgress {
    stdout: StandardStream,
}

impl LineProgress {
    pub fn new() -> Self {
        Self {
            stdout: StandardStream::stdout(ColorChoice::Auto),
        }
    }
}

impl Default for LineProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for LineProgress {
    fn report(&mut self, progress: InstallProgress) {
        let (color, mark) = match progress.level {
            Level::Info => (Color::Cyan, "→"),
            Level::Success => (Color::Green, "✓"),
            Level::Warning => (Color::Yellow, "⚠"),
        };
        let _ = self.stdout.set_color(ColorSpec::new().set_fg(Some(color)));
        let _ = writeln!(self.stdout, "  {mark} {}", progress.message);
        let _ = self.stdout.reset();
    }
}

fn show_banner(title: &str) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(
        stdout,
        "\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━"
    );
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(stdout, "  {title}");
    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)));
    let _ = writeln!(
        stdout,
        "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n"
    );
    let _ = stdout.reset();
}

fn warn_if_not_elevated() {
    if let Err(e) = privilege::check_privileges() {
        warn!("{e}");
        let mut stdout = StandardStream::stdout(ColorChoice::Auto);
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(
            stdout,
            "⚠ Not running elevated; driver and service steps will likely fail\n"
        );
        let _ = stdout.reset();
    }
}

fn show_completion(summary: &InstallSummary) {
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    let color = if summary.degraded() {
        Color::Yellow
    } else {
        Color::Green
    };

    let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
    let _ = writeln!(stdout, "\n{}", summary.headline());
    let _ = stdout.reset();
    let _ = writeln!(stdout, "   Driver:  {}", summary.driver);
    let _ = writeln!(stdout, "   Service: {}", summary.service);
    if !summary.registered {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(stdout, "   ⚠ Not registered for uninstall");
        let _ = stdout.reset();
    }
    if summary.shortcuts_created == Some(false) {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)));
        let _ = writeln!(stdout, "   ⚠ Some shortcuts could not be created");
        let _ = stdout.reset();
    }
}

/// Run the installation against the live system
pub fn run_install(config: &SetupConfig, options: &InstallOptions) -> Result<InstallSummary> {
    show_banner(&format!("{} Setup", config.app.name));
    warn_if_not_elevated();

    let runner = SystemRunner;
    let mut files = FileDeployer::from_config(config);
    let uninstaller = uninstaller_path(config);
    match std::env::current_exe() {
        // reinstalling from the deployed copy would truncate it
        Ok(exe) if exe != uninstaller => files = files.with_file(exe, &uninstaller),
        Ok(_) => {}
        Err(e) => warn!("Could not locate the setup executable: {e}"),
    }
    let registration = registration::native(config);
    let shortcuts = ShortcutSet::from_config(&runner, config);

    let mut installer =
        Installer::new(config, &runner, &files, registration.as_ref()).saving_config();
    if options.shortcuts {
        installer = installer.with_shortcuts(&shortcuts);
    }

    let mut progress = BarProgress::new()?;
    let summary = installer.run(&mut progress);
    progress.finish();

    show_completion(&summary);
    Ok(summary)
}

/// Run the uninstallation; `answer` pre-decides the shared-service question
pub fn run_uninstall(config: &SetupConfig, answer: Option<bool>) -> UninstallSummary {
    show_banner(&format!("{} Uninstall", config.app.name));
    warn_if_not_elevated();

    let runner = SystemRunner;
    let files = FileDeployer::from_config(config);
    let registration = registration::native(config);
    let shortcuts = ShortcutSet::from_config(&runner, config);
    let uninstaller = Uninstaller::new(config, &runner, &files, registration.as_ref(), &shortcuts);

    let mut prompt: Box<dyn Confirmation> = match answer {
        Some(answer) => Box::new(FixedAnswer(answer)),
        None => Box::new(InteractivePrompt),
    };
    let mut progress = LineProgress::new();
    let summary = uninstaller.run(prompt.as_mut(), &mut progress);

    let mut stdout = StandardStream::stdout(ColorChoice::Auto);
    if summary.clean() {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true));
        let _ = writeln!(stdout, "\nUninstallation completed successfully!");
    } else {
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)).set_bold(true));
        let _ = writeln!(stdout, "\nUninstallation completed with warnings");
    }
    let _ = stdout.reset();
    summary
}

/// Print driver and service state; true when both are running
pub fn run_status(config: &SetupConfig) -> bool {
    let report = StatusReport::collect(&SystemRunner, config);
    let mut stdout = StandardStream::stdout(ColorChoice::Auto);

    let mut line = |label: &str, name: &str, state: Option<ServiceState>| {
        let (color, text) = match state {
            Some(ServiceState::Running) => (Color::Green, ServiceState::Running.label()),
            Some(state) => (Color::Yellow, state.label()),
            None => (Color::Red, "not installed"),
        };
        let _ = write!(stdout, "{label:<8} {name:<32} ");
        let _ = stdout.set_color(ColorSpec::new().set_fg(Some(color)).set_bold(true));
        let _ = writeln!(stdout, "{text}");
        let _ = stdout.reset();
    };

    match &report.driver {
        Some((name, state)) => line("Driver", name.as_str(), Some(*state)),
        None => line("Driver", &config.driver.primary, None),
    }
    line("Service", &config.service.name, report.service);

    report.all_running()
}
