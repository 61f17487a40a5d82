//! Promoting third-party dependencies to the company repositories.
//!
//! A promoted dependency is copied under the stable username, uploaded to
//! the dependencies remote, and replaced in the local cache by an alias
//! recipe that is published on the redirect remote. Consumers resolving the
//! original reference through the redirect remote land on the copy.

use super::package::recipe_builds;
use super::{CredentialSource, InstallOptions, TaskContext, install, login};
use crate::ci::{current_branch, local_username, select_channel};
use crate::conan::{
    ConanCli, ConanClient, InstallRequest, PackageReference, TemporaryUserHome, UploadRequest,
    conan_folder,
};
use crate::error::Result;
use crate::matrix::BuildItem;
use crate::platform::{LONG_PATHS_REG_FILE, long_paths_enabled};
use std::collections::HashSet;
use std::future::Future;

/// Logs in, installs the project, then promotes its dependencies.
pub async fn upload_dependencies<S: CredentialSource>(
    ctx: &TaskContext,
    conan: &ConanCli,
    source: &mut S,
) -> Result<()> {
    login(ctx, conan, source, None).await?;
    install(
        ctx,
        conan,
        &InstallOptions::for_platform(ctx.settings().platform()),
    )
    .await?;
    promote_dependencies(ctx, conan).await
}

/// Copies every stable, non-local dependency of the project under the
/// stable username and redirects the original reference to the copy.
pub async fn promote_dependencies<C: ConanClient>(ctx: &TaskContext, conan: &C) -> Result<()> {
    promote(ctx, conan, &local_username()).await
}

fn needs_promotion(reference: &PackageReference, stable_user: &str, local_user: &str) -> bool {
    reference.channel == "stable" && reference.user != stable_user && reference.user != local_user
}

async fn promote<C: ConanClient>(ctx: &TaskContext, conan: &C, local_user: &str) -> Result<()> {
    let settings = ctx.settings();
    let output = ctx.output();
    let stable_user = settings.stable_username();
    let redirect = settings.redirect_remote();
    output.section("Promoting dependencies")?;

    let bound: HashSet<PackageReference> = conan
        .remote_list_ref()
        .await?
        .into_iter()
        .map(|binding| binding.reference)
        .collect();

    for reference in conan.dependencies("default").await? {
        if !needs_promotion(&reference, stable_user, local_user) {
            log::debug!("{} stays as is", reference);
            continue;
        }
        if conan.inspect(&reference.to_string()).await?.is_alias() {
            log::debug!("{} is an alias", reference);
            continue;
        }

        let copy = reference.with_user(stable_user);
        output.progress(&format!("promoting {} to {}", reference, copy))?;

        conan.copy(&reference, &copy.user_channel(), true, true).await?;
        conan
            .upload(
                &UploadRequest::new(copy.clone(), settings.upload_dependencies_remote())
                    .all_packages()
                    .force(),
            )
            .await?;
        if bound.contains(&reference) {
            conan.remote_update_ref(&reference, redirect).await?;
        }
        conan.remove(&reference, true).await?;
        conan.export_alias(&reference, &copy).await?;
        conan
            .upload(&UploadRequest::new(reference.clone(), redirect))
            .await?;
    }

    Ok(())
}

/// Runs `body` with the redirect remote removed, re-adding it afterwards.
///
/// The remote is restored whether or not `body` succeeds; the error of
/// `body` wins over a failure to restore.
pub async fn with_redirect_removed<C, F, Fut, T>(ctx: &TaskContext, conan: &C, body: F) -> Result<T>
where
    C: ConanClient,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let settings = ctx.settings();
    let redirect = settings.redirect_remote();
    let present = conan
        .remote_list()
        .await?
        .iter()
        .any(|remote| remote.name == redirect);

    if present {
        ctx.output()
            .verbose(&format!("Removing {} for the duration", redirect))?;
        conan.remote_remove(redirect).await?;
    }

    let result = body().await;

    if present {
        if let Some(url) = settings.redirect_remote_url() {
            let position = settings
                .remotes()
                .iter()
                .position(|remote| remote.name == redirect);
            let restored = conan.remote_add(redirect, url, position, true).await;
            if let Err(e) = restored {
                return result.and(Err(e));
            }
        }
    }

    result
}

async fn install_items<C: ConanClient>(ctx: &TaskContext, conan: &C, builds: &[BuildItem]) -> Result<()> {
    let profile = ctx.settings().base_profile();
    for item in builds {
        let staging = tempfile::Builder::new().prefix("dl-install-").tempdir()?;
        let mut request = InstallRequest::path(".")
            .install_folder(staging.path())
            .build("missing")
            .profile(profile);
        request.settings = item.settings.clone();
        request.options = item.options.clone();
        request.env = item.env_vars.clone();
        conan.install(&request).await?;
    }
    Ok(())
}

async fn install_configurations<C: ConanClient>(
    ctx: &TaskContext,
    conan: &C,
    username: &str,
    channel: &str,
) -> Result<()> {
    let builds = recipe_builds(ctx, conan, username, channel).await?;
    ctx.output().section(&format!(
        "Installing requirements for {} configurations",
        builds.len()
    ))?;
    with_redirect_removed(ctx, conan, || install_items(ctx, conan, &builds)).await
}

/// Installs the project's requirements for every packaging configuration,
/// resolving only from the non-redirect remotes.
pub async fn install_all_configurations<C: ConanClient>(ctx: &TaskContext, conan: &C) -> Result<()> {
    let branch = current_branch(ctx.settings().project_dir());
    let channel = select_channel(ctx.settings(), branch.as_deref());
    install_configurations(ctx, conan, &local_username(), channel).await
}

fn warn_long_paths(ctx: &TaskContext) -> Result<()> {
    if !long_paths_enabled()? {
        ctx.output().warn(&format!(
            "Long paths are not enabled; dependencies with deep folder structures may fail to build.\n\
             Import {} from the tasks directory into the registry and reboot.",
            LONG_PATHS_REG_FILE
        ))?;
    }
    Ok(())
}

/// Resolves every dependency from scratch in a temporary Conan home and
/// promotes them.
pub async fn copy_dependencies<S: CredentialSource>(
    ctx: &TaskContext,
    conan: &ConanCli,
    source: &mut S,
) -> Result<()> {
    login(ctx, conan, source, None).await?;

    let home = TemporaryUserHome::create(&conan_folder()?).await?;
    let conan = conan.with_env(&home.env());
    ctx.output().section(&format!(
        "Copying dependencies in temporary home {}",
        home.path().display()
    ))?;

    warn_long_paths(ctx)?;
    clear_remote_refs(&conan).await?;
    install_all_configurations(ctx, &conan).await?;
    promote_dependencies(ctx, &conan).await
}

async fn clear_remote_refs<C: ConanClient>(conan: &C) -> Result<()> {
    for binding in conan.remote_list_ref().await? {
        conan.remote_remove_ref(&binding.reference).await?;
    }
    Ok(())
}
