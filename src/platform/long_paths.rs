//! Windows long path support check.
//!
//! Conan package folders nest deeply, and builds fail in confusing ways when
//! `LongPathsEnabled` is off. The check only reads the registry.

use crate::error::Result;

/// Registry file shipped next to the tasks that turns long paths on.
pub const LONG_PATHS_REG_FILE: &str = "LongPathsEnabled.reg";

/// Returns whether long paths are enabled.
///
/// A missing registry value means the feature is disabled. Non-Windows hosts
/// always report `true`.
#[cfg(windows)]
pub fn long_paths_enabled() -> Result<bool> {
    use winreg::RegKey;
    use winreg::enums::{HKEY_LOCAL_MACHINE, KEY_READ};

    let key = RegKey::predef(HKEY_LOCAL_MACHINE)
        .open_subkey_with_flags(FILE_SYSTEM_KEY, KEY_READ)?;
    value_enabled(key.get_value::<u32, _>("LongPathsEnabled"))
}

#[cfg(windows)]
const FILE_SYSTEM_KEY: &str = "SYSTEM\\CurrentControlSet\\Control\\FileSystem";

/// Interprets a `LongPathsEnabled` lookup on an open key.
#[cfg(any(windows, test))]
fn value_enabled(value: std::io::Result<u32>) -> Result<bool> {
    match value {
        Ok(value) => Ok(value != 0),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("LongPathsEnabled is not set");
            Ok(false)
        }
        Err(e) => Err(e.into()),
    }
}

/// Returns whether long paths are enabled.
///
/// A missing registry value means the feature is disabled. Non-Windows hosts
/// always report `true`.
#[cfg(not(windows))]
pub fn long_paths_enabled() -> Result<bool> {
    Ok(true)
}
