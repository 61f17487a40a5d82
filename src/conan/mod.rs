//! The Conan package manager, as seen by the tasks.
//!
//! [`ConanClient`] is the seam between task logic and the package manager.
//! [`ConanCli`] drives the real `conan` executable; tests use an in-memory
//! client.

mod cli;
mod env_info;
mod home;
mod reference;

#[cfg(test)]
pub(crate) mod fake;

pub use cli::ConanCli;
pub use env_info::{DepsEnvInfo, EnvValue, PATH_SEPARATOR};
pub use home::{TemporaryUserHome, conan_folder};
pub use reference::PackageReference;

use crate::error::Result;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A remote as configured in the package manager.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConfiguredRemote {
    /// Remote name
    pub name: String,
    /// Remote URL
    pub url: String,
}

/// Records which remote a reference was fetched from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteBinding {
    /// Bound reference
    pub reference: PackageReference,
    /// Remote it resolves from
    pub remote: String,
}

/// Login state of one remote.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RemoteUser {
    /// Remote name
    pub name: String,
    /// User logged in to the remote, if any
    #[serde(default)]
    pub user_name: Option<String>,
    /// True when a token is cached for the remote
    #[serde(default)]
    pub authenticated: bool,
}

/// Attributes of a recipe reported by `conan inspect`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct RecipeInfo {
    /// Recipe name
    #[serde(default)]
    pub name: Option<String>,
    /// Recipe version
    #[serde(default)]
    pub version: Option<String>,
    /// Declared options and their allowed values
    #[serde(default)]
    pub options: Option<BTreeMap<String, serde_json::Value>>,
    /// Target reference, for alias recipes
    #[serde(default)]
    pub alias: Option<String>,
}

impl RecipeInfo {
    /// True when the recipe declares the option.
    pub fn has_option(&self, option: &str) -> bool {
        self.options
            .as_ref()
            .is_some_and(|options| options.contains_key(option))
    }

    /// True for alias recipes.
    pub fn is_alias(&self) -> bool {
        self.alias.is_some()
    }
}

/// What `conan install` installs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InstallTarget {
    /// A recipe folder (usually `.`)
    Path(PathBuf),
    /// A package from the remotes or the cache
    Reference(PackageReference),
}

/// Arguments of `conan install`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstallRequest {
    /// What to install
    pub target: InstallTarget,
    /// Where generated files go
    pub install_folder: Option<PathBuf>,
    /// `-s` settings
    pub settings: BTreeMap<String, String>,
    /// `-o` options
    pub options: BTreeMap<String, String>,
    /// `-e` environment
    pub env: BTreeMap<String, String>,
    /// `--build` policies, in order
    pub build: Vec<String>,
    /// `--profile`
    pub profile: Option<String>,
    /// `-g` generators added to the recipe's own
    pub generators: Vec<String>,
}

impl InstallRequest {
    /// Installs the recipe in `path`.
    pub fn path(path: impl Into<PathBuf>) -> Self {
        Self::new(InstallTarget::Path(path.into()))
    }

    /// Installs a package reference.
    pub fn reference(reference: PackageReference) -> Self {
        Self::new(InstallTarget::Reference(reference))
    }

    fn new(target: InstallTarget) -> Self {
        Self {
            target,
            install_folder: None,
            settings: BTreeMap::new(),
            options: BTreeMap::new(),
            env: BTreeMap::new(),
            build: Vec::new(),
            profile: None,
            generators: Vec::new(),
        }
    }

    /// Sets the install folder.
    pub fn install_folder(mut self, folder: impl Into<PathBuf>) -> Self {
        self.install_folder = Some(folder.into());
        self
    }

    /// Adds one setting.
    pub fn setting(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.settings.insert(key.into(), value.into());
        self
    }

    /// Adds a build policy.
    pub fn build(mut self, policy: impl Into<String>) -> Self {
        self.build.push(policy.into());
        self
    }

    /// Sets the profile.
    pub fn profile(mut self, profile: Option<&str>) -> Self {
        self.profile = profile.map(str::to_string);
        self
    }

    /// Adds a generator.
    pub fn generator(mut self, generator: impl Into<String>) -> Self {
        self.generators.push(generator.into());
        self
    }
}

/// Arguments of `conan create`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CreateRequest {
    /// Recipe folder
    pub path: PathBuf,
    /// Reference the package is created as
    pub reference: PackageReference,
    /// `-s` settings
    pub settings: BTreeMap<String, String>,
    /// `-o` options
    pub options: BTreeMap<String, String>,
    /// `-e` environment
    pub env: BTreeMap<String, String>,
    /// `--build` policies
    pub build: Vec<String>,
    /// `--profile`
    pub profile: Option<String>,
}

/// Arguments of `conan upload`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UploadRequest {
    /// Reference to upload
    pub reference: PackageReference,
    /// Destination remote
    pub remote: String,
    /// Upload binaries as well as the recipe
    pub all_packages: bool,
    /// Skip the interactive confirmation
    pub confirm: bool,
    /// Overwrite the remote copy
    pub force: bool,
}

impl UploadRequest {
    /// Confirmed upload of the recipe only.
    pub fn new(reference: PackageReference, remote: impl Into<String>) -> Self {
        Self {
            reference,
            remote: remote.into(),
            all_packages: false,
            confirm: true,
            force: false,
        }
    }

    /// Includes all binary packages.
    pub fn all_packages(mut self) -> Self {
        self.all_packages = true;
        self
    }

    /// Overwrites what is on the remote.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }
}

/// Operations the tasks need from the package manager.
///
/// Calls are made one at a time, in the order the task issues them.
#[allow(async_fn_in_trait)]
pub trait ConanClient {
    /// Configured remotes in priority order.
    async fn remote_list(&self) -> Result<Vec<ConfiguredRemote>>;

    /// Renames a remote.
    async fn remote_rename(&self, old: &str, new: &str) -> Result<()>;

    /// Adds a remote at `insert` (or last); `force` replaces a remote with
    /// the same name or URL.
    async fn remote_add(&self, name: &str, url: &str, insert: Option<usize>, force: bool)
    -> Result<()>;

    /// Removes a remote.
    async fn remote_remove(&self, name: &str) -> Result<()>;

    /// Reference-to-remote bindings.
    async fn remote_list_ref(&self) -> Result<Vec<RemoteBinding>>;

    /// Forgets which remote a reference came from.
    async fn remote_remove_ref(&self, reference: &PackageReference) -> Result<()>;

    /// Binds a reference to another remote.
    async fn remote_update_ref(&self, reference: &PackageReference, remote: &str) -> Result<()>;

    /// Login state of every remote.
    async fn users(&self) -> Result<Vec<RemoteUser>>;

    /// Stores credentials for a remote.
    async fn authenticate(&self, username: &str, token: &str, remote: &str) -> Result<()>;

    /// Installs a recipe folder or a reference.
    async fn install(&self, request: &InstallRequest) -> Result<()>;

    /// Dependencies of the recipe in the project directory, root excluded.
    async fn dependencies(&self, profile: &str) -> Result<Vec<PackageReference>>;

    /// Inspects a recipe folder or a cached reference.
    async fn inspect(&self, target: &str) -> Result<RecipeInfo>;

    /// Builds packages of the recipe in the project directory.
    async fn create(&self, request: &CreateRequest) -> Result<()>;

    /// Copies a reference to another `user/channel`.
    async fn copy(
        &self,
        reference: &PackageReference,
        user_channel: &str,
        force: bool,
        packages: bool,
    ) -> Result<()>;

    /// Uploads a reference.
    async fn upload(&self, request: &UploadRequest) -> Result<()>;

    /// Removes a reference from the local cache.
    async fn remove(&self, reference: &PackageReference, force: bool) -> Result<()>;

    /// Exports an alias recipe pointing `alias` at `target`.
    async fn export_alias(&self, alias: &PackageReference, target: &PackageReference) -> Result<()>;
}
