//! Branch detection and package username selection.
//!
//! CI services expose the branch being built in their own environment
//! variables; outside CI the branch comes from the local git checkout.

use crate::settings::Settings;
use std::path::Path;

/// CI branch variables in lookup order, with the prefix to strip.
const CI_BRANCH_VARIABLES: &[(&str, &str)] = &[
    ("TRAVIS_BRANCH", ""),
    ("APPVEYOR_REPO_BRANCH", ""),
    ("bamboo_planRepository_branch", ""),
    ("CIRCLE_BRANCH", ""),
    ("CI_COMMIT_REF_NAME", ""),
    ("CI_BUILD_REF_NAME", ""),
    ("BRANCH_NAME", ""),
    ("GIT_BRANCH", "origin/"),
    ("BUILD_SOURCEBRANCH", "refs/heads/"),
    ("GITHUB_REF", "refs/heads/"),
];

/// Branch named by the CI environment, looked up through `var`.
pub fn ci_branch(var: impl Fn(&str) -> Option<String>) -> Option<String> {
    CI_BRANCH_VARIABLES.iter().find_map(|(name, prefix)| {
        let value = var(name).filter(|v| !v.is_empty())?;
        let branch = value.strip_prefix(prefix).unwrap_or(&value).to_string();
        log::debug!("Branch {branch} from {name}");
        Some(branch)
    })
}

/// Branch checked out in the git repository containing `dir`.
///
/// `None` outside a repository or on a detached head.
pub fn git_branch(dir: &Path) -> Option<String> {
    let repo = match gix::discover(dir) {
        Ok(repo) => repo,
        Err(e) => {
            log::debug!("No git repository at {}: {}", dir.display(), e);
            return None;
        }
    };
    match repo.head_name() {
        Ok(Some(name)) => Some(name.shorten().to_string()),
        Ok(None) => {
            log::debug!("HEAD is detached");
            None
        }
        Err(e) => {
            log::debug!("Cannot read HEAD: {}", e);
            None
        }
    }
}

/// Branch being built: CI environment first, then the local checkout.
pub fn current_branch(dir: &Path) -> Option<String> {
    ci_branch(|name| std::env::var(name).ok()).or_else(|| git_branch(dir))
}

/// Name of the local OS user.
pub fn local_username() -> String {
    for var in ["LOGNAME", "USER", "LNAME", "USERNAME"] {
        match std::env::var(var) {
            Ok(user) if !user.is_empty() => return user,
            _ => {}
        }
    }
    os_username().unwrap_or_else(|| "unknown".to_string())
}

#[cfg(unix)]
fn os_username() -> Option<String> {
    users::get_current_username().and_then(|name| name.into_string().ok())
}

#[cfg(not(unix))]
fn os_username() -> Option<String> {
    None
}

/// Username for package references built from `branch`.
///
/// The stable identity on stable branches, otherwise `local_user`.
pub fn select_username(settings: &Settings, branch: Option<&str>, local_user: &str) -> String {
    match branch {
        Some(branch) if settings.is_stable_branch(branch) => settings.stable_username().to_string(),
        _ => local_user.to_string(),
    }
}

/// Username for packages built in the project directory.
pub fn package_username(settings: &Settings) -> String {
    let branch = current_branch(settings.project_dir());
    select_username(settings, branch.as_deref(), &local_username())
}

/// Channel for packages built from `branch`.
pub fn select_channel(settings: &Settings, branch: Option<&str>) -> &'static str {
    match branch {
        Some(branch) if settings.is_stable_branch(branch) => "stable",
        _ => "testing",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SettingsBuilder;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn stable_branch_selects_stable_identity() {
        let settings = SettingsBuilder::new().build().unwrap();
        assert_eq!(
            select_username(&settings, Some("dl/stable/1.2"), "alice"),
            "datalogics"
        );
    }

    #[test]
    fn other_branches_select_local_user() {
        let settings = SettingsBuilder::new().build().unwrap();
        for branch in [Some("develop"), Some("feature/dl/stable/x"), None] {
            assert_eq!(select_username(&settings, branch, "alice"), "alice");
        }
    }

    #[test]
    fn channel_follows_branch() {
        let settings = SettingsBuilder::new().build().unwrap();
        assert_eq!(select_channel(&settings, Some("dl/stable/3")), "stable");
        assert_eq!(select_channel(&settings, Some("master")), "testing");
        assert_eq!(select_channel(&settings, None), "testing");
    }

    #[test]
    fn ci_branch_lookup_order_and_prefixes() {
        assert_eq!(
            ci_branch(env(&[("TRAVIS_BRANCH", "dl/stable/1"), ("GITHUB_REF", "refs/heads/x")])),
            Some("dl/stable/1".into())
        );
        assert_eq!(
            ci_branch(env(&[("GITHUB_REF", "refs/heads/dl/stable/2")])),
            Some("dl/stable/2".into())
        );
        assert_eq!(
            ci_branch(env(&[("GIT_BRANCH", "origin/develop")])),
            Some("develop".into())
        );
        assert_eq!(ci_branch(env(&[("TRAVIS_BRANCH", "")])), None);
        assert_eq!(ci_branch(env(&[])), None);
    }

    #[test]
    fn no_git_repository_means_no_branch() {
        let dir = tempfile::tempdir().unwrap();
        // A temp dir may still sit inside a repository on some machines.
        if gix::discover(dir.path()).is_err() {
            assert_eq!(git_branch(dir.path()), None);
        }
    }
}
