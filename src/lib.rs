//! TempMon setup library
//!
//! Provisions the two system dependencies TempMon reads sensors through (the
//! PawnIO kernel driver and the LibreHardwareMonitor service), deploys the
//! application, and removes it again.

pub mod config;
pub mod error;
pub mod install;
pub mod privilege;
pub mod provision;
pub mod system;

pub use config::SetupConfig;
pub use error::{Result, SetupError};
