//! Building and publishing the project's packages.

use super::TaskContext;
use crate::ci::{current_branch, package_username, select_channel};
use crate::conan::{
    ConanCli, ConanClient, CreateRequest, DepsEnvInfo, InstallRequest, PackageReference,
    UploadRequest,
};
use crate::error::{Result, TasksError};
use crate::matrix::{BuildItem, MatrixParams, common_builds};
use crate::process::ExecEnv;
use std::collections::BTreeSet;

/// Options of the `package` task.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageOptions {
    /// Package username; chosen from the branch when absent
    pub username: Option<String>,
    /// Upload even when not on a stable branch
    pub force_upload: bool,
}

/// Installs the `build_tools` recipe and returns the environment its
/// dependencies export.
pub async fn tools_deps_env_info<C: ConanClient>(ctx: &TaskContext, conan: &C) -> Result<DepsEnvInfo> {
    let settings = ctx.settings();
    let install_dir = settings.build_tools_install_dir();
    ctx.output().progress("Installing build tools")?;

    conan
        .install(
            &InstallRequest::path(settings.build_tools_dir())
                .install_folder(&install_dir)
                .generator("json"),
        )
        .await?;

    DepsEnvInfo::load(&install_dir.join("conanbuildinfo.json"))
}

/// Reference of the recipe in the project directory under `user/channel`.
pub(super) async fn recipe_reference<C: ConanClient>(
    conan: &C,
    user: &str,
    channel: &str,
) -> Result<(PackageReference, bool)> {
    let recipe = conan.inspect(".").await?;
    let shared = recipe.has_option("shared");
    match (recipe.name, recipe.version) {
        (Some(name), Some(version)) => {
            Ok((PackageReference::new(name, version, user, channel), shared))
        }
        _ => Err(TasksError::InvalidReference {
            reference: ".".into(),
            reason: "recipe does not declare both name and version".into(),
        }),
    }
}

/// Packaging matrix of the recipe in the project directory.
pub(super) async fn recipe_builds<C: ConanClient>(
    ctx: &TaskContext,
    conan: &C,
    user: &str,
    channel: &str,
) -> Result<Vec<BuildItem>> {
    let (reference, shared) = recipe_reference(conan, user, channel).await?;
    let shared_option = shared.then_some(reference.name.as_str());
    Ok(common_builds(
        ctx.settings().platform(),
        &MatrixParams::default(),
        &reference,
        shared_option,
    ))
}

/// Builds the package in every configuration and, on stable branches or
/// when forced, uploads it.
pub async fn package(ctx: &TaskContext, conan: &ConanCli, options: &PackageOptions) -> Result<()> {
    let settings = ctx.settings();
    let conan = conan.with_env(
        &ExecEnv::new()
            .with("CONAN_PIP_USE_SUDO", "False")
            .with("CONAN_NON_INTERACTIVE", "True"),
    );

    let tools_env = tools_deps_env_info(ctx, &conan).await?;
    let conan = conan.with_env(&tools_env.apply(conan.env()));

    let username = match &options.username {
        Some(username) => username.clone(),
        None => package_username(settings),
    };
    let branch = current_branch(settings.project_dir());
    let channel = select_channel(settings, branch.as_deref());
    let stable = branch
        .as_deref()
        .is_some_and(|branch| settings.is_stable_branch(branch));

    package_with(ctx, &conan, &username, channel, stable || options.force_upload).await
}

/// Packaging steps for a known user, channel and upload decision.
pub async fn package_with<C: ConanClient>(
    ctx: &TaskContext,
    conan: &C,
    username: &str,
    channel: &str,
    upload: bool,
) -> Result<()> {
    let settings = ctx.settings();
    let output = ctx.output();
    let builds = recipe_builds(ctx, conan, username, channel).await?;
    if builds.is_empty() {
        return Err(TasksError::Config(format!(
            "no packaging configurations for {:?}",
            settings.platform()
        )));
    }

    output.section(&format!(
        "Packaging {} in {} configurations",
        builds[0].reference,
        builds.len()
    ))?;

    for item in &builds {
        for extra in settings.extra_references() {
            let staging = tempfile::Builder::new().prefix("dl-install-").tempdir()?;
            let mut request = InstallRequest::reference(extra.clone())
                .install_folder(staging.path())
                .build(&extra.name)
                .build("missing")
                .profile(settings.base_profile());
            request.settings = item.settings.clone();
            request.options = item.options.clone();
            request.env = item.env_vars.clone();
            conan.install(&request).await?;
        }
    }

    for item in &builds {
        output.progress(&describe(item))?;
        conan
            .create(&CreateRequest {
                path: ".".into(),
                reference: item.reference.clone(),
                settings: item.settings.clone(),
                options: item.options.clone(),
                env: item.env_vars.clone(),
                build: vec!["missing".to_string()],
                profile: settings.base_profile().map(str::to_string),
            })
            .await?;
    }

    if upload {
        let built: BTreeSet<&PackageReference> = builds.iter().map(|item| &item.reference).collect();
        for reference in built {
            output.progress(&format!(
                "uploading {} to {}",
                reference,
                settings.upload_remote()
            ))?;
            conan
                .upload(&UploadRequest::new(reference.clone(), settings.upload_remote()).all_packages())
                .await?;
        }
    } else {
        output.verbose("Not on a stable branch; skipping upload")?;
    }

    output.success("Packaging complete")?;
    Ok(())
}

fn describe(item: &BuildItem) -> String {
    let mut parts: Vec<String> = item
        .settings
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect();
    parts.extend(item.options.iter().map(|(key, value)| format!("{key}={value}")));
    format!("creating {} [{}]", item.reference, parts.join(", "))
}
