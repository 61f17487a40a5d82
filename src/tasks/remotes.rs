//! Remote reconciliation.

use super::TaskContext;
use crate::conan::ConanClient;
use crate::error::Result;
use std::collections::HashMap;

/// Ensures the canonical remotes are configured, under their canonical
/// names, in priority order.
///
/// A remote already pointing at a canonical URL is renamed rather than
/// duplicated. Remotes not in the registry stay, after the canonical ones.
/// Running this twice leaves the same remote list as running it once.
pub async fn setup_remotes<C: ConanClient>(ctx: &TaskContext, conan: &C) -> Result<()> {
    let output = ctx.output();
    output.section("Setting up Conan remotes")?;

    let urls: HashMap<String, String> = conan
        .remote_list()
        .await?
        .into_iter()
        .map(|remote| (remote.url, remote.name))
        .collect();

    for (insert_loc, remote) in ctx.settings().remotes().iter().enumerate() {
        if let Some(old_remote) = urls.get(&remote.url) {
            if old_remote != &remote.name {
                output.progress(&format!("renaming {} to {}", old_remote, remote.name))?;
                conan.remote_rename(old_remote, &remote.name).await?;
            }
        }
        output.progress(&format!("adding remote {} as {}", remote.name, remote.url))?;
        conan
            .remote_add(&remote.name, &remote.url, Some(insert_loc), true)
            .await?;
    }

    Ok(())
}
