//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Conan and CMake tasks for Datalogics projects
#[derive(Parser, Debug)]
#[command(
    name = "dl_conan_tasks",
    version,
    about = "Conan and CMake tasks for Datalogics projects",
    long_about = "Sets up the Datalogics Conan remotes, logs in to Artifactory, installs
requirements, builds and publishes packages, and promotes third-party
dependencies to the company repositories.

Usage:
  dl_conan_tasks setup-remotes
  dl_conan_tasks install --multi
  dl_conan_tasks package --force-upload
  dl_conan_tasks --project-dir ../pdfl build --config Release --parallel"
)]
pub struct Args {
    /// Directory holding the project's conanfile.py
    #[arg(long, value_name = "PATH", default_value = ".", global = true)]
    pub project_dir: PathBuf,

    /// Task configuration file
    ///
    /// Defaults to dl-tasks.toml in the project directory, when present.
    #[arg(long, value_name = "PATH", global = true)]
    pub tasks_config: Option<PathBuf>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Task to run
    #[command(subcommand)]
    pub command: Command,
}

/// Tasks.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Configure the standard Conan remotes in priority order
    SetupRemotes,

    /// Log in to every Artifactory remote that has no cached token
    Login {
        /// Artifactory username; prompted for when absent
        #[arg(long, env = "CONAN_USERNAME")]
        username: Option<String>,
    },

    /// Install the project's requirements into build/
    Install {
        /// Install Release and Debug for a multi-configuration generator
        #[arg(long, conflicts_with = "single")]
        multi: bool,

        /// Install one build type
        #[arg(long)]
        single: bool,

        /// Build type of a single-configuration install
        #[arg(long, value_name = "TYPE", default_value = "Debug")]
        build_type: String,
    },

    /// Build the package in every configuration and publish it from stable branches
    Package {
        /// Package username; chosen from the branch when absent
        #[arg(long, env = "CONAN_USERNAME")]
        username: Option<String>,

        /// Upload even when not on a stable branch
        #[arg(long)]
        force_upload: bool,
    },

    /// Copy the project's third-party dependencies to Artifactory
    UploadDependencies,

    /// Resolve all dependencies in a clean Conan home and copy them to Artifactory
    CopyDependencies,

    /// Configure the CMake build tree
    Cmake {
        /// CMake generator
        #[arg(short = 'G', long)]
        generator: Option<String>,

        /// CMAKE_BUILD_TYPE for single-configuration generators
        #[arg(long, value_name = "TYPE", default_value = "Debug")]
        build_type: String,
    },

    /// Build one configuration
    Build {
        /// Configuration to build
        #[arg(long = "config", id = "build_config", default_value = "Debug")]
        config: String,

        /// Build with one job per CPU
        #[arg(long)]
        parallel: bool,
    },

    /// Build and run the tests of one configuration
    Test {
        /// Configuration to test
        #[arg(long = "config", id = "build_config", default_value = "Debug")]
        config: String,
    },

    /// Remove build products
    Clean,

    /// Remove the build tree and the installed build tools
    Distclean,
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        if !self.project_dir.is_dir() {
            return Err(format!(
                "Project directory does not exist: {}",
                self.project_dir.display()
            ));
        }

        if let Some(config) = &self.tasks_config {
            if !config.is_file() {
                return Err(format!("Config file does not exist: {}", config.display()));
            }
        }

        let build_type = match &self.command {
            Command::Install { build_type, .. } | Command::Cmake { build_type, .. } => {
                Some(build_type)
            }
            Command::Build { config, .. } | Command::Test { config } => Some(config),
            _ => None,
        };
        if build_type.is_some_and(|value| value.trim().is_empty()) {
            return Err("Build type cannot be empty".to_string());
        }

        Ok(())
    }
}

/// Configuration derived from command line arguments
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Output manager for colored terminal output
    output: super::OutputManager,
}

impl From<&Args> for RuntimeConfig {
    fn from(args: &Args) -> Self {
        let output = super::OutputManager::new(!args.quiet, args.quiet);
        Self { output }
    }
}

impl RuntimeConfig {
    /// Get a reference to the output manager
    pub fn output(&self) -> &super::OutputManager {
        &self.output
    }

    /// Print verbose message if in verbose mode
    pub fn verbose_println(&self, message: &str) -> std::io::Result<()> {
        self.output.verbose(message)
    }
}
