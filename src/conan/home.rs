//! Temporary, isolated Conan user homes.
//!
//! A temporary home has the configuration of the user's real home (remotes,
//! profiles, settings, credentials) but an empty package cache, so package
//! resolution starts from scratch. The directory is deleted when the
//! [`TemporaryUserHome`] is dropped.

use crate::error::{FsContext, Result, TasksError};
use crate::process::ExecEnv;
use path_absolutize::Absolutize;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Name of the Conan folder inside a user home.
const CONAN_DIR: &str = ".conan";
/// Package cache inside the Conan folder; never copied.
const DATA_DIR: &str = "data";

/// The current user's Conan folder: `$CONAN_USER_HOME/.conan`, or
/// `~/.conan` when the variable is unset.
pub fn conan_folder() -> Result<PathBuf> {
    let home = match std::env::var_os("CONAN_USER_HOME") {
        Some(home) if !home.is_empty() => PathBuf::from(home),
        _ => dirs::home_dir()
            .ok_or_else(|| TasksError::Config("cannot determine the home directory".into()))?,
    };
    let folder = home.join(CONAN_DIR);
    Ok(folder.absolutize()?.into_owned())
}

/// A copy of a Conan folder in a temporary user home.
#[derive(Debug)]
pub struct TemporaryUserHome {
    dir: TempDir,
    conan_folder: PathBuf,
}

impl TemporaryUserHome {
    /// Copies `original` (a `.conan` folder) into a new temporary home,
    /// leaving out every `data` directory.
    pub async fn create(original: &Path) -> Result<Self> {
        if !original.is_dir() {
            return Err(TasksError::Config(format!(
                "Conan folder {} does not exist; run conan once to create it",
                original.display()
            )));
        }

        let dir = tempfile::Builder::new().prefix("conan-home-").tempdir()?;
        let conan_folder = dir.path().join(CONAN_DIR);
        log::info!(
            "Copying {} to temporary home {}",
            original.display(),
            dir.path().display()
        );

        let from = original.to_path_buf();
        let to = conan_folder.clone();
        tokio::task::spawn_blocking(move || copy_config(&from, &to))
            .await
            .map_err(|e| TasksError::Anyhow(anyhow::anyhow!("Home copy task panicked: {e}")))??;

        make_world_writable(&conan_folder)?;

        Ok(Self { dir, conan_folder })
    }

    /// The temporary user home (parent of the Conan folder).
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// The copied Conan folder.
    pub fn conan_folder(&self) -> &Path {
        &self.conan_folder
    }

    /// Environment pointing `conan` at this home.
    pub fn env(&self) -> ExecEnv {
        ExecEnv::new()
            .with("CONAN_USER_HOME", self.path().display().to_string())
            .with("CONAN_USER_HOME_SHORT", "None")
    }
}

/// Recursively copies `from` to `to`, skipping directories named `data`.
///
/// Symlinks are recreated, not followed.
fn copy_config(from: &Path, to: &Path) -> Result<()> {
    std::fs::create_dir_all(to).fs_context("creating", to)?;

    let walker = walkdir::WalkDir::new(from)
        .min_depth(1)
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == DATA_DIR));

    for entry in walker {
        let entry = entry.map_err(|e| TasksError::Io(e.into()))?;
        let rel_path = entry
            .path()
            .strip_prefix(from)
            .map_err(|e| TasksError::Anyhow(e.into()))?;
        let dest_path = to.join(rel_path);

        if entry.file_type().is_symlink() {
            let target = std::fs::read_link(entry.path()).fs_context("reading link", entry.path())?;
            symlink(&target, &dest_path, entry.path().is_dir())
                .fs_context("creating link", &dest_path)?;
        } else if entry.file_type().is_dir() {
            std::fs::create_dir_all(&dest_path).fs_context("creating", &dest_path)?;
        } else {
            std::fs::copy(entry.path(), &dest_path).fs_context("copying to", &dest_path)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn symlink(target: &Path, link: &Path, _is_dir: bool) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn symlink(target: &Path, link: &Path, is_dir: bool) -> std::io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(unix)]
fn make_world_writable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o777))
        .fs_context("setting permissions on", path)
}

#[cfg(not(unix))]
fn make_world_writable(path: &Path) -> Result<()> {
    let mut permissions = std::fs::metadata(path)
        .fs_context("reading metadata of", path)?
        .permissions();
    #[allow(clippy::permissions_set_readonly_false)]
    permissions.set_readonly(false);
    std::fs::set_permissions(path, permissions).fs_context("setting permissions on", path)
}
