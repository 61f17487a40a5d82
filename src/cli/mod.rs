//! Command line interface for the build tasks.
//!
//! Parses arguments, loads settings, and runs one task.

mod args;
mod output;

pub use args::{Args, Command, RuntimeConfig};
pub use output::OutputManager;

use crate::artifactory::InteractiveCredentials;
use crate::error::{CliError, Result};
use crate::settings::{Settings, SettingsBuilder};
use crate::tasks::{self, BuildOptions, CmakeOptions, InstallOptions, PackageOptions, TaskContext};

/// Main CLI entry point
pub async fn run() -> Result<i32> {
    let args = Args::parse_args();
    args.validate()
        .map_err(|reason| CliError::InvalidArguments { reason })?;

    let config = RuntimeConfig::from(&args);
    let settings = load_settings(&args)?;
    config.verbose_println(&format!(
        "Project directory: {}",
        settings.project_dir().display()
    ))?;

    let ctx = TaskContext::new(settings, config.output().clone());
    execute(&ctx, &args.command).await?;
    Ok(0)
}

/// Settings for the project named on the command line.
pub fn load_settings(args: &Args) -> Result<Settings> {
    let builder = SettingsBuilder::new().project_dir(&args.project_dir);
    let builder = match &args.tasks_config {
        Some(path) => builder.load_file(path)?,
        None => builder.discover_file()?,
    };
    builder.build()
}

/// Runs one task.
pub async fn execute(ctx: &TaskContext, command: &Command) -> Result<()> {
    match command {
        Command::SetupRemotes => tasks::setup_remotes(ctx, &ctx.conan()?).await,
        Command::Login { username } => {
            let mut source = InteractiveCredentials::new();
            tasks::login(ctx, &ctx.conan()?, &mut source, username.as_deref()).await
        }
        Command::Install {
            multi,
            single,
            build_type,
        } => {
            let mut options = InstallOptions::for_platform(ctx.settings().platform());
            if *multi {
                options.multi = true;
            } else if *single {
                options.multi = false;
            }
            options.build_type = build_type.clone();
            tasks::install(ctx, &ctx.conan()?, &options).await
        }
        Command::Package {
            username,
            force_upload,
        } => {
            let options = PackageOptions {
                username: username.clone(),
                force_upload: *force_upload,
            };
            tasks::package(ctx, &ctx.conan()?, &options).await
        }
        Command::UploadDependencies => {
            let mut source = InteractiveCredentials::new();
            tasks::upload_dependencies(ctx, &ctx.conan()?, &mut source).await
        }
        Command::CopyDependencies => {
            let mut source = InteractiveCredentials::new();
            tasks::copy_dependencies(ctx, &ctx.conan()?, &mut source).await
        }
        Command::Cmake {
            generator,
            build_type,
        } => {
            let options = CmakeOptions {
                generator: generator.clone(),
                build_type: build_type.clone(),
            };
            tasks::cmake(ctx, &options).await
        }
        Command::Build { config, parallel } => {
            let options = BuildOptions {
                config: config.clone(),
                parallel: *parallel,
            };
            tasks::build(ctx, &options).await
        }
        Command::Test { config } => {
            let options = BuildOptions {
                config: config.clone(),
                parallel: false,
            };
            tasks::test(ctx, &options).await
        }
        Command::Clean => tasks::clean(ctx).await,
        Command::Distclean => tasks::distclean(ctx).await,
    }
}
