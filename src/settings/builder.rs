//! Builder for constructing Settings.

use super::core::{
    DL_ARTIFACTORY, EXTRA_REFERENCES, LINUX_PROFILE, REDIRECT_REMOTE, STABLE_BRANCH_PATTERN,
    STABLE_USERNAME, UPLOAD_DEPENDENCIES_REMOTE, UPLOAD_REMOTE,
};
use super::{RemoteRegistry, Settings, TasksFile};
use crate::conan::PackageReference;
use crate::error::{Result, TasksError};
use crate::platform::HostPlatform;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};

/// Builder for constructing [`Settings`].
///
/// Starts from the built-in defaults. A [`TasksFile`] overrides any of them.
///
/// # Examples
///
/// ```no_run
/// use dl_conan_build_tools::settings::SettingsBuilder;
///
/// # fn example() -> dl_conan_build_tools::Result<()> {
/// let settings = SettingsBuilder::new()
///     .project_dir(".")
///     .discover_file()?
///     .build()?;
/// assert!(settings.is_stable_branch("dl/stable/2.0"));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct SettingsBuilder {
    project_dir: Option<PathBuf>,
    file: TasksFile,
    platform: Option<HostPlatform>,
}

impl SettingsBuilder {
    /// Creates a new settings builder.
    pub fn new() -> Self {
        Default::default()
    }

    /// Sets the project directory.
    ///
    /// Default: current directory
    pub fn project_dir<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.project_dir = Some(path.as_ref().to_path_buf());
        self
    }

    /// Applies overrides from a parsed configuration file.
    pub fn file(mut self, file: TasksFile) -> Self {
        self.file = file;
        self
    }

    /// Loads overrides from an explicit configuration file path.
    pub fn load_file<P: AsRef<Path>>(self, path: P) -> Result<Self> {
        let file = TasksFile::load(path.as_ref())?;
        Ok(self.file(file))
    }

    /// Loads `dl-tasks.toml` from the project directory when it exists.
    pub fn discover_file(self) -> Result<Self> {
        let dir = self.project_dir.clone().unwrap_or_else(|| PathBuf::from("."));
        match TasksFile::discover(&dir)? {
            Some(file) => Ok(self.file(file)),
            None => Ok(self),
        }
    }

    /// Overrides the host platform.
    ///
    /// Default: [`HostPlatform::current`]
    pub fn platform(mut self, platform: HostPlatform) -> Self {
        self.platform = Some(platform);
        self
    }

    /// Builds the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the stable branch pattern is not a valid regular
    /// expression, an extra reference does not parse, or a named upload or
    /// redirect remote is missing from the registry.
    pub fn build(self) -> Result<Settings> {
        let file = self.file;

        let artifactory = file
            .artifactory
            .unwrap_or_else(|| DL_ARTIFACTORY.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&artifactory)
            .map_err(|e| TasksError::Config(format!("artifactory URL '{artifactory}': {e}")))?;

        let remotes = match file.remotes {
            Some(remotes) => RemoteRegistry::new(remotes),
            None => RemoteRegistry::standard(&artifactory),
        };

        let pattern = file
            .stable_branch_pattern
            .unwrap_or_else(|| STABLE_BRANCH_PATTERN.to_string());
        let stable_branch_pattern = regex::Regex::new(&format!("^(?:{pattern})"))
            .map_err(|e| TasksError::Config(format!("stable_branch_pattern: {e}")))?;

        let extra_references = match file.extra_references {
            Some(refs) => refs
                .iter()
                .map(|r| r.parse())
                .collect::<Result<Vec<PackageReference>>>()?,
            None => EXTRA_REFERENCES
                .iter()
                .map(|r| r.parse())
                .collect::<Result<Vec<PackageReference>>>()?,
        };

        let upload_remote = file.upload_remote.unwrap_or_else(|| UPLOAD_REMOTE.into());
        let upload_dependencies_remote = file
            .upload_dependencies_remote
            .unwrap_or_else(|| UPLOAD_DEPENDENCIES_REMOTE.into());
        let redirect_remote = file
            .redirect_remote
            .unwrap_or_else(|| REDIRECT_REMOTE.into());

        for name in [&upload_remote, &upload_dependencies_remote, &redirect_remote] {
            if remotes.get(name).is_none() {
                return Err(TasksError::Config(format!(
                    "remote '{name}' is not in the remote list"
                )));
            }
        }

        // Tasks run tools from inside the project, so every derived path is absolute.
        let project_dir = self.project_dir.unwrap_or_else(|| PathBuf::from("."));
        let project_dir = project_dir.absolutize()?.into_owned();

        Ok(Settings {
            project_dir,
            artifactory,
            remotes,
            upload_remote,
            upload_dependencies_remote,
            redirect_remote,
            stable_branch_pattern,
            stable_username: file
                .stable_username
                .unwrap_or_else(|| STABLE_USERNAME.into()),
            linux_profile: file.linux_profile.unwrap_or_else(|| LINUX_PROFILE.into()),
            extra_references,
            platform: self.platform.unwrap_or_else(HostPlatform::current),
        })
    }
}
