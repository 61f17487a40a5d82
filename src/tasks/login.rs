//! Artifactory login for the Conan remotes.

use super::{TaskContext, setup_remotes};
use crate::conan::ConanClient;
use crate::error::Result;
use std::collections::HashSet;

/// A username and the encrypted-password token for it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Credentials {
    /// Artifactory username
    pub username: String,
    /// Encrypted password, used as the Conan token
    pub token: String,
}

/// Obtains credentials when a remote needs them.
#[allow(async_fn_in_trait)]
pub trait CredentialSource {
    /// Asks for credentials. `username` is used as-is when given.
    async fn credentials(&mut self, ctx: &TaskContext, username: Option<&str>)
    -> Result<Credentials>;
}

/// Sets up the remotes, then logs in to every Artifactory remote.
pub async fn login<C, S>(
    ctx: &TaskContext,
    conan: &C,
    source: &mut S,
    username: Option<&str>,
) -> Result<()>
where
    C: ConanClient,
    S: CredentialSource,
{
    setup_remotes(ctx, conan).await?;
    login_with(ctx, conan, source, username).await
}

/// Logs in to every remote under the Artifactory URL that has no cached
/// token.
///
/// Credentials are requested at most once and reused for all remaining
/// remotes. Remotes on other hosts are left alone.
pub async fn login_with<C, S>(
    ctx: &TaskContext,
    conan: &C,
    source: &mut S,
    username: Option<&str>,
) -> Result<()>
where
    C: ConanClient,
    S: CredentialSource,
{
    ctx.output().section("Logging in to Artifactory")?;

    let logged_in: HashSet<String> = conan
        .users()
        .await?
        .into_iter()
        .filter(|user| user.authenticated)
        .map(|user| user.name)
        .collect();

    let mut credentials: Option<Credentials> = None;

    for remote in conan.remote_list().await? {
        if !ctx.settings().is_artifactory_url(&remote.url) {
            log::debug!("Skipping {}: not an Artifactory remote", remote.name);
            continue;
        }

        if logged_in.contains(&remote.name) {
            ctx.output()
                .verbose(&format!("Already logged in to {}", remote.name))?;
            continue;
        }

        let creds = match credentials.take() {
            Some(creds) => creds,
            None => source.credentials(ctx, username).await?,
        };

        conan
            .authenticate(&creds.username, &creds.token, &remote.name)
            .await?;
        ctx.output()
            .success(&format!("Logged in to {} as {}", remote.name, creds.username))?;
        credentials = Some(creds);
    }

    Ok(())
}
