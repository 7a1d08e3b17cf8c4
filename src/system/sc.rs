//! Service-control command lines (`sc.exe`).
//!
//! `sc` takes `option= value` pairs as two separate arguments; the space after
//! the equals sign is part of its syntax.

use std::path::Path;

use super::runner::Invocation;
use crate::provision::ServiceSpec;

pub const SC: &str = "sc";

pub fn query(name: &str) -> Invocation {
    Invocation::new(SC).args(["query", name])
}

pub fn create(spec: &ServiceSpec) -> Invocation {
    Invocation::new(SC).args([
        "create".to_string(),
        spec.name.clone(),
        "binPath=".to_string(),
        quote_if_spaced(&spec.binary_path),
        "start=".to_string(),
        spec.start_mode.as_sc_arg().to_string(),
        "DisplayName=".to_string(),
        spec.display_name.clone(),
        "type=".to_string(),
        spec.service_type.as_sc_arg().to_string(),
    ])
}

pub fn start(name: &str) -> Invocation {
    Invocation::new(SC).args(["start", name])
}

pub fn stop(name: &str) -> Invocation {
    Invocation::new(SC).args(["stop", name])
}

pub fn delete(name: &str) -> Invocation {
    Invocation::new(SC).args(["delete", name])
}

/// Wrap a path in literal quotes when it contains spaces.
///
/// The service manager splits an unquoted image path at the first space, so
/// `C:\Program Files\...` must reach it with the quotes intact.
pub fn quote_if_spaced(path: &Path) -> String {
    let raw = path.to_string_lossy();
    if raw.contains(' ') && !raw.starts_with('"') {
        format!("\"{raw}\"")
    } else {
        raw.into_owned()
    }
}
