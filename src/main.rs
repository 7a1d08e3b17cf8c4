mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, error, warn};
use tempmon_setup::SetupConfig;
use tempmon_setup::install::{self, InstallOptions};

fn main() {
    let args = cli::Args::parse();

    let mut logger = env_logger::Builder::from_default_env();
    logger.format(|buf, record| {
        use std::io::Write;
        writeln!(
            buf,
            "[{} {} {}:{}] {}",
            buf.timestamp_millis(),
            record.level(),
            record.file().unwrap_or("unknown"),
            record.line().unwrap_or(0),
            record.args()
        )
    });
    if let Some(level) = log_level(args.verbose, std::env::var_os("RUST_LOG").is_some()) {
        logger.filter_level(level);
    }
    logger.init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("FATAL: Failed to create Tokio runtime: {e}");
            std::process::exit(1);
        }
    };
    match rt.block_on(real_main(args)) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
}

/// `--verbose` wins over `RUST_LOG`; `RUST_LOG` wins over the default
fn log_level(verbose: bool, rust_log_set: bool) -> Option<LevelFilter> {
    match (verbose, rust_log_set) {
        (true, _) => Some(LevelFilter::Debug),
        (false, true) => None,
        (false, false) => Some(LevelFilter::Info),
    }
}

async fn real_main(args: cli::Args) -> Result<i32> {
    let config = SetupConfig::load(args.config.as_deref()).context("Invalid configuration")?;
    debug!("Install directory: {}", config.install_dir.display());

    // provisioning blocks on child processes and settle delays
    tokio::task::spawn_blocking(move || run(&config, &args.sub))
        .await
        .context("Setup task panicked")?
}

fn run(config: &SetupConfig, cmd: &cli::Cmd) -> Result<i32> {
    match cmd {
        cli::Cmd::Install { no_shortcuts } => {
            let options = InstallOptions {
                shortcuts: !no_shortcuts,
            };
            install::run_install(config, &options)?;
            Ok(0)
        }
        cli::Cmd::Uninstall { .. } => {
            match install::relaunch_outside_install_dir(config) {
                Ok(true) => return Ok(0),
                Ok(false) => {}
                Err(e) => warn!("Uninstalling in place, the setup executable may be left behind: {e}"),
            }
            install::run_uninstall(config, cmd.service_answer());
            Ok(0)
        }
        cli::Cmd::Status => Ok(if install::run_status(config) { 0 } else { 1 }),
    }
}
