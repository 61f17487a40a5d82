//! Installing the project's requirements.

use super::TaskContext;
use crate::conan::{ConanClient, ConanCli, InstallRequest};
use crate::error::Result;
use crate::platform::HostPlatform;
use crate::process::ExecEnv;

/// Options of the `install` task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallOptions {
    /// Install Release and Debug for a multi-configuration generator
    pub multi: bool,
    /// Build type of a single-configuration install
    pub build_type: String,
}

impl InstallOptions {
    /// Platform defaults: multi-configuration on Windows, Debug elsewhere.
    pub fn for_platform(platform: HostPlatform) -> Self {
        Self {
            multi: platform.multi_config_default(),
            build_type: "Debug".to_string(),
        }
    }
}

/// Marks installs whose generated CMake files serve several configurations.
const CMAKE_MULTI_ENV: &str = "DL_CONAN_GENERATE_CMAKE_MULTI";

fn base_request(ctx: &TaskContext, build_type: &str) -> InstallRequest {
    let settings = ctx.settings();
    let mut request = InstallRequest::path(".")
        .install_folder("build")
        .setting("build_type", build_type)
        .build("missing");
    if settings.platform() == HostPlatform::Linux {
        request = request
            .profile(settings.base_profile())
            .build("boost_build");
    }
    request
}

/// Installs requirements into `build`, downloading from the remotes and
/// building what is missing.
pub async fn install(ctx: &TaskContext, conan: &ConanCli, options: &InstallOptions) -> Result<()> {
    if options.multi {
        let conan = conan.with_env(&ExecEnv::new().with(CMAKE_MULTI_ENV, "True"));
        install_with(ctx, &conan, options).await
    } else {
        install_with(ctx, conan, options).await
    }
}

/// Install steps against any client; the caller sets up the multi-config
/// environment.
pub async fn install_with<C: ConanClient>(
    ctx: &TaskContext,
    conan: &C,
    options: &InstallOptions,
) -> Result<()> {
    ctx.output().section("Installing requirements")?;

    if options.multi {
        for build_type in ["Release", "Debug"] {
            conan.install(&base_request(ctx, build_type)).await?;
        }
    } else {
        conan
            .install(&base_request(ctx, &options.build_type))
            .await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputManager;
    use crate::conan::fake::FakeConan;
    use crate::settings::SettingsBuilder;

    fn ctx(platform: HostPlatform) -> TaskContext {
        TaskContext::new(
            SettingsBuilder::new().platform(platform).build().unwrap(),
            OutputManager::new(false, true),
        )
    }

    #[tokio::test]
    async fn multi_installs_release_then_debug() {
        let conan = FakeConan::default();
        let options = InstallOptions {
            multi: true,
            build_type: "Debug".into(),
        };
        install_with(&ctx(HostPlatform::Windows), &conan, &options)
            .await
            .unwrap();
        assert_eq!(
            conan.calls(),
            vec![
                "install . build_type=Release build=missing".to_string(),
                "install . build_type=Debug build=missing".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn linux_adds_profile_and_boost_build() {
        let conan = FakeConan::default();
        let options = InstallOptions {
            multi: false,
            build_type: "RelWithDebInfo".into(),
        };
        install_with(&ctx(HostPlatform::Linux), &conan, &options)
            .await
            .unwrap();
        assert_eq!(
            conan.calls(),
            vec!["install . build_type=RelWithDebInfo build=missing,boost_build".to_string()]
        );
    }

    #[test]
    fn request_profile_on_linux() {
        let request = base_request(&ctx(HostPlatform::Linux), "Debug");
        assert_eq!(request.profile.as_deref(), Some("devtoolset-7"));
        assert_eq!(request.install_folder.as_deref(), Some(std::path::Path::new("build")));
    }

    #[test]
    fn platform_defaults() {
        assert!(InstallOptions::for_platform(HostPlatform::Windows).multi);
        assert!(!InstallOptions::for_platform(HostPlatform::Linux).multi);
    }
}
