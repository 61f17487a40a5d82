//! Host platform detection and platform-specific checks.

mod long_paths;

pub use long_paths::{LONG_PATHS_REG_FILE, long_paths_enabled};

/// Operating system family the tasks run on.
///
/// Decides the install profile, the compiler used by the packaging matrix,
/// and whether installs default to multi-configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HostPlatform {
    /// Linux (gcc, devtoolset profile)
    Linux,
    /// macOS (apple-clang)
    MacOs,
    /// Windows (Visual Studio)
    Windows,
    /// Anything else; no compiler in the matrix
    Other,
}

impl HostPlatform {
    /// The platform this binary was compiled for.
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Self::Linux
        } else if cfg!(target_os = "macos") {
            Self::MacOs
        } else if cfg!(target_os = "windows") {
            Self::Windows
        } else {
            Self::Other
        }
    }

    /// Visual Studio generators are multi-config, so Windows installs both
    /// Release and Debug by default.
    pub fn multi_config_default(self) -> bool {
        self == Self::Windows
    }
}
