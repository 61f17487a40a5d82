//! Configuration for the build tasks.
//!
//! Built-in defaults describe the Datalogics Artifactory installation. A
//! project can override them with a `dl-tasks.toml` next to its recipe.

mod builder;
mod core;
mod file;
mod remotes;

pub use builder::SettingsBuilder;
pub use self::core::{
    DL_ARTIFACTORY, REDIRECT_REMOTE, STABLE_BRANCH_PATTERN, STABLE_USERNAME, Settings,
    UPLOAD_DEPENDENCIES_REMOTE, UPLOAD_REMOTE,
};
pub use file::{TASKS_FILE_NAME, TasksFile};
pub use remotes::{Remote, RemoteRegistry};
