//! External tool detection.
//!
//! Each tool is looked up in `PATH` once per process.

use crate::error::{Result, TasksError};
use std::path::PathBuf;
use std::sync::LazyLock;

fn locate(tool: &str) -> Option<PathBuf> {
    match which::which(tool) {
        Ok(path) => {
            log::debug!("Found {} at: {}", tool, path.display());
            Some(path)
        }
        Err(e) => {
            log::debug!("{} not found in PATH: {}", tool, e);
            None
        }
    }
}

static CONAN: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("conan"));
static CMAKE: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("cmake"));
static CTEST: LazyLock<Option<PathBuf>> = LazyLock::new(|| locate("ctest"));

fn require(found: &Option<PathBuf>, tool: &str) -> Result<PathBuf> {
    found.clone().ok_or_else(|| TasksError::ToolNotFound {
        tool: tool.to_string(),
    })
}

/// Path to the `conan` executable.
pub fn conan() -> Result<PathBuf> {
    require(&CONAN, "conan")
}

/// Path to the `cmake` executable.
pub fn cmake() -> Result<PathBuf> {
    require(&CMAKE, "cmake")
}

/// Path to the `ctest` executable.
pub fn ctest() -> Result<PathBuf> {
    require(&CTEST, "ctest")
}
