//! Core Settings struct and implementations.

use super::RemoteRegistry;
use crate::conan::PackageReference;
use crate::platform::HostPlatform;
use regex::Regex;
use std::path::{Path, PathBuf};

/// Default Artifactory installation.
pub const DL_ARTIFACTORY: &str = "http://artifactory.dlogics.com:8081/artifactory";
/// Remote that packages built here are uploaded to.
pub const UPLOAD_REMOTE: &str = "conan-local";
/// Remote that promoted third-party dependencies are uploaded to.
pub const UPLOAD_DEPENDENCIES_REMOTE: &str = "conan-ext";
/// Remote holding aliases from original references to promoted copies.
pub const REDIRECT_REMOTE: &str = "conan-redirect";
/// Branches matching this pattern publish under the stable identity.
pub const STABLE_BRANCH_PATTERN: &str = "dl/stable/.*";
/// The stable identity.
pub const STABLE_USERNAME: &str = "datalogics";
/// Conan profile used for installs and packaging on Linux.
pub const LINUX_PROFILE: &str = "devtoolset-7";
/// References pre-installed for every packaging configuration.
pub const EXTRA_REFERENCES: &[&str] = &["leptonica/1.76.0@bincrafters/stable"];

/// Settings shared by all tasks.
///
/// Constructed via [`SettingsBuilder`](super::SettingsBuilder), which fills in
/// the built-in defaults and applies the optional `dl-tasks.toml` overrides.
#[derive(Clone, Debug)]
pub struct Settings {
    pub(super) project_dir: PathBuf,
    pub(super) artifactory: String,
    pub(super) remotes: RemoteRegistry,
    pub(super) upload_remote: String,
    pub(super) upload_dependencies_remote: String,
    pub(super) redirect_remote: String,
    /// Anchored at the start, like a Python `re.match`.
    pub(super) stable_branch_pattern: Regex,
    pub(super) stable_username: String,
    pub(super) linux_profile: String,
    pub(super) extra_references: Vec<PackageReference>,
    pub(super) platform: HostPlatform,
}

impl Settings {
    /// Directory holding the project's `conanfile.py` and `CMakeLists.txt`.
    pub fn project_dir(&self) -> &Path {
        &self.project_dir
    }

    /// Native build tree.
    pub fn build_dir(&self) -> PathBuf {
        self.project_dir.join("build")
    }

    /// Recipe providing build tools to packaging.
    pub fn build_tools_dir(&self) -> PathBuf {
        self.project_dir.join("build_tools")
    }

    /// Install folder for the build tools recipe.
    pub fn build_tools_install_dir(&self) -> PathBuf {
        self.build_tools_dir().join("build")
    }

    /// Artifactory base URL, without a trailing slash.
    pub fn artifactory(&self) -> &str {
        &self.artifactory
    }

    /// Page where users copy their encrypted password.
    pub fn profile_url(&self) -> String {
        format!("{}/webapp/#/profile", self.artifactory)
    }

    /// Endpoint exchanging a password for the encrypted password.
    pub fn encrypted_password_url(&self) -> String {
        format!("{}/api/security/encryptedPassword", self.artifactory)
    }

    /// True when the URL belongs to the Artifactory installation.
    pub fn is_artifactory_url(&self, url: &str) -> bool {
        url.starts_with(&self.artifactory)
    }

    /// Canonical remotes in priority order.
    pub fn remotes(&self) -> &RemoteRegistry {
        &self.remotes
    }

    /// Remote packages are uploaded to.
    pub fn upload_remote(&self) -> &str {
        &self.upload_remote
    }

    /// Remote promoted dependencies are uploaded to.
    pub fn upload_dependencies_remote(&self) -> &str {
        &self.upload_dependencies_remote
    }

    /// Remote holding redirect aliases.
    pub fn redirect_remote(&self) -> &str {
        &self.redirect_remote
    }

    /// Canonical URL of the redirect remote, if it is in the registry.
    pub fn redirect_remote_url(&self) -> Option<&str> {
        self.remotes
            .get(&self.redirect_remote)
            .map(|r| r.url.as_str())
    }

    /// Whether the branch name selects the stable identity.
    pub fn is_stable_branch(&self, branch: &str) -> bool {
        self.stable_branch_pattern.is_match(branch)
    }

    /// The stable identity.
    pub fn stable_username(&self) -> &str {
        &self.stable_username
    }

    /// Profile passed to installs and packaging, if the platform needs one.
    pub fn base_profile(&self) -> Option<&str> {
        match self.platform {
            HostPlatform::Linux => Some(&self.linux_profile),
            _ => None,
        }
    }

    /// References pre-installed before packaging each configuration.
    pub fn extra_references(&self) -> &[PackageReference] {
        &self.extra_references
    }

    /// Platform the tasks run on.
    pub fn platform(&self) -> HostPlatform {
        self.platform
    }
}
