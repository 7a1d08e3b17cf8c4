//! Elevation check.
//!
//! Creating services and installing a kernel driver need an elevated token on
//! Windows (root elsewhere). The installer does not refuse to run without it;
//! the console layer warns and every later failure is reported per step.

use crate::error::{Result, SetupError};

/// Check if we have sufficient privileges for service and driver operations
#[cfg(target_os = "windows")]
pub fn check_privileges() -> Result<()> {
    use std::mem;

    use windows::Win32::Foundation::{CloseHandle, HANDLE};
    use windows::Win32::Security::{
        GetTokenInformation, TOKEN_ELEVATION, TOKEN_QUERY, TokenElevation,
    };
    use windows::Win32::System::Threading::{GetCurrentProcess, OpenProcessToken};

    let mut token_handle = HANDLE::default();

    unsafe {
        OpenProcessToken(GetCurrentProcess(), TOKEN_QUERY, &mut token_handle)
            .map_err(|_| SetupError::PermissionDenied)?;

        let mut elevation: TOKEN_ELEVATION = mem::zeroed();
        let mut return_length: u32 = 0;

        let queried = GetTokenInformation(
            token_handle,
            TokenElevation,
            Some(&mut elevation as *mut _ as *mut std::ffi::c_void),
            mem::size_of::<TOKEN_ELEVATION>() as u32,
            &mut return_length,
        );
        let _ = CloseHandle(token_handle);
        queried.map_err(|_| SetupError::PermissionDenied)?;

        if elevation.TokenIsElevated == 0 {
            return Err(SetupError::PermissionDenied);
        }
    }

    Ok(())
}

/// Check if we have sufficient privileges for service and driver operations
#[cfg(not(target_os = "windows"))]
pub fn check_privileges() -> Result<()> {
    let uid = unsafe { libc::geteuid() };
    if uid != 0 {
        return Err(SetupError::PermissionDenied);
    }
    Ok(())
}
