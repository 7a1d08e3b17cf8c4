use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "TempMon setup: installs the app, its driver and its sensor service")]
pub struct Args {
    /// Path to a TOML configuration file (built-in defaults otherwise)
    #[arg(long, short = 'c', global = true)]
    pub config: Option<PathBuf>,

    /// Log at debug level
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub sub: Cmd,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Deploy files, provision driver and service, register for uninstall
    Install {
        /// Skip Start Menu and desktop shortcuts
        #[arg(long)]
        no_shortcuts: bool,
    },
    /// Remove the application; asks before removing the shared service
    Uninstall {
        /// Remove the shared service without asking
        #[arg(long)]
        remove_service: bool,

        /// Keep the shared service without asking
        #[arg(long, conflicts_with = "remove_service")]
        keep_service: bool,
    },
    /// Show driver and service state (Exit 0 = both running, 1 otherwise)
    Status,
}

impl Cmd {
    /// Pre-decided answer for the shared-service question, if any
    pub fn service_answer(&self) -> Option<bool> {
        match self {
            Cmd::Uninstall {
                remove_service: true,
                ..
            } => Some(true),
            Cmd::Uninstall {
                keep_service: true, ..
            } => Some(false),
            _ => None,
        }
    }
}
