//! Task procedures.
//!
//! Each public task runs its prerequisites, then a short ordered sequence of
//! package manager and build tool calls. The `*_with` variants skip the
//! prerequisites and take the package manager as a [`ConanClient`], so the
//! logic can run against an in-memory client.
//!
//! [`ConanClient`]: crate::conan::ConanClient

mod dependencies;
mod install;
mod login;
mod native;
mod package;
mod remotes;

pub use dependencies::{
    copy_dependencies, install_all_configurations, promote_dependencies, upload_dependencies,
    with_redirect_removed,
};
pub use install::{InstallOptions, install, install_with};
pub use login::{CredentialSource, Credentials, login, login_with};
pub use native::{
    BuildOptions, CmakeOptions, build, clean, cmake, distclean, is_multi_config, read_cached_generator,
    test,
};
pub use package::{PackageOptions, package, package_with, tools_deps_env_info};
pub use remotes::setup_remotes;

use crate::cli::OutputManager;
use crate::conan::ConanCli;
use crate::error::Result;
use crate::settings::Settings;

/// Settings and terminal output shared by all tasks.
#[derive(Clone, Debug)]
pub struct TaskContext {
    settings: Settings,
    output: OutputManager,
}

impl TaskContext {
    /// Creates a context.
    pub fn new(settings: Settings, output: OutputManager) -> Self {
        Self { settings, output }
    }

    /// Task settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Terminal output.
    pub fn output(&self) -> &OutputManager {
        &self.output
    }

    /// A `conan` client for the project directory.
    pub fn conan(&self) -> Result<ConanCli> {
        ConanCli::new(self.settings.project_dir(), self.output.clone())
    }
}
