//! Environment facts consumed during configuration resolution.

use std::env;
use std::path::Path;

/// Fallback reported when the executable path cannot be interpreted.
pub(crate) const UNKNOWN: &str = "unknown";

/// Read-only process and machine facts used to build the identification map.
///
/// Resolution reads everything it advertises to the broker through this
/// trait, which keeps [`resolve`](crate::resolve) deterministic under test.
/// Implementations must be cheap in-memory reads; no network or disk access
/// beyond a single path lookup.
pub trait EnvironmentInfo {
    /// Version of this library
    fn library_version(&self) -> String;

    /// Version of the language toolchain the client was built with
    fn runtime_version(&self) -> String;

    /// Full path of the invoking executable, empty when unavailable
    fn executable_path(&self) -> String;

    /// Host name of the machine running the client
    fn machine_name(&self) -> String;
}

/// Environment facts sourced from the running process.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnvironment;

impl EnvironmentInfo for ProcessEnvironment {
    fn library_version(&self) -> String {
        crate::VERSION.to_string()
    }

    fn runtime_version(&self) -> String {
        option_env!("CARGO_PKG_RUST_VERSION")
            .unwrap_or(UNKNOWN)
            .to_string()
    }

    fn executable_path(&self) -> String {
        env::current_exe()
            .map(|path| path.display().to_string())
            .unwrap_or_default()
    }

    fn machine_name(&self) -> String {
        whoami::fallible::hostname().unwrap_or_else(|_| UNKNOWN.to_string())
    }
}

/// Split an executable path into its file name and directory.
///
/// Returns `None` when the path cannot be interpreted; callers substitute a
/// fixed fallback for both components, and the failure is never surfaced.
pub(crate) fn split_executable_path(raw: &str) -> Option<(String, String)> {
    if raw.trim().is_empty() {
        return None;
    }

    let path = Path::new(raw);
    let application = path.file_name()?.to_str()?.to_string();
    let location = path
        .parent()
        .map(|dir| dir.display().to_string())
        .unwrap_or_default();

    Some((application, location))
}
