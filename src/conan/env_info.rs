//! `deps_env_info` from a `conanbuildinfo.json`.

use crate::error::{FsContext, Result, TasksError};
use crate::process::ExecEnv;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Separator used when prepending list values to an existing variable.
pub const PATH_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

/// A value in `deps_env_info`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    /// Replaces the variable
    Scalar(String),
    /// Prepended to the variable, path-separated
    List(Vec<String>),
}

/// Environment exported by the build-tools dependencies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct DepsEnvInfo(BTreeMap<String, EnvValue>);

#[derive(Deserialize)]
struct BuildInfo {
    deps_env_info: Option<DepsEnvInfo>,
}

impl DepsEnvInfo {
    /// Reads the `deps_env_info` section of a `conanbuildinfo.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).fs_context("reading", path)?;
        Self::parse(&text).map_err(|e| match e {
            TasksError::Config(reason) => {
                TasksError::Config(format!("{}: {reason}", path.display()))
            }
            other => other,
        })
    }

    /// Parses the `deps_env_info` section of a `conanbuildinfo.json` document.
    pub fn parse(text: &str) -> Result<Self> {
        let info: BuildInfo = serde_json::from_str(text)?;
        let env = info
            .deps_env_info
            .ok_or_else(|| TasksError::Config("no deps_env_info section".into()))?;
        log::debug!("deps_env_info has {} variables", env.0.len());
        Ok(env)
    }

    /// Environment for child processes, starting from `base`.
    ///
    /// Scalars replace; lists are joined and prepended to the value the
    /// child would otherwise see.
    pub fn apply(&self, base: &ExecEnv) -> ExecEnv {
        self.apply_with(base, |key| base.resolve(key))
    }

    fn apply_with(&self, base: &ExecEnv, current: impl Fn(&str) -> Option<String>) -> ExecEnv {
        let mut env = base.clone();
        for (key, value) in &self.0 {
            let value = match value {
                EnvValue::Scalar(v) => v.clone(),
                EnvValue::List(items) => {
                    let mut joined = items.join(PATH_SEPARATOR);
                    if let Some(existing) = current(key).filter(|v| !v.is_empty()) {
                        joined.push_str(PATH_SEPARATOR);
                        joined.push_str(&existing);
                    }
                    joined
                }
            };
            env.set(key.clone(), value);
        }
        env
    }

    /// True when no variables are exported.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUILD_INFO: &str = r#"{
        "deps_env_info": {
            "PATH": ["/tools/cmake/bin", "/tools/ninja/bin"],
            "NASM": "/tools/nasm/bin/nasm"
        },
        "dependencies": []
    }"#;

    #[test]
    fn parses_scalars_and_lists() {
        let info = DepsEnvInfo::parse(BUILD_INFO).unwrap();
        assert!(!info.is_empty());
        assert_eq!(
            info.0.get("NASM"),
            Some(&EnvValue::Scalar("/tools/nasm/bin/nasm".into()))
        );
    }

    #[test]
    fn lists_prepend_to_existing_value() {
        let info = DepsEnvInfo::parse(BUILD_INFO).unwrap();
        let env = info.apply_with(&ExecEnv::new(), |key| {
            (key == "PATH").then(|| "/usr/bin".to_string())
        });
        let sep = PATH_SEPARATOR;
        assert_eq!(
            env.get("PATH"),
            Some(format!("/tools/cmake/bin{sep}/tools/ninja/bin{sep}/usr/bin").as_str())
        );
        assert_eq!(env.get("NASM"), Some("/tools/nasm/bin/nasm"));
    }

    #[test]
    fn missing_section_is_an_error() {
        assert!(DepsEnvInfo::parse("{}").is_err());
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conanbuildinfo.json");
        std::fs::write(&path, BUILD_INFO).unwrap();
        assert_eq!(DepsEnvInfo::load(&path).unwrap(), DepsEnvInfo::parse(BUILD_INFO).unwrap());
    }
}
