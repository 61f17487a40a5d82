//! Canonical remote registry.

use serde::Deserialize;

/// A named, URL-addressed package repository.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct Remote {
    /// Remote name as configured in the package manager
    pub name: String,
    /// Remote URL
    pub url: String,
}

impl Remote {
    /// Creates a remote.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// Ordered list of remotes. Position is priority: the first remote is
/// searched first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteRegistry {
    remotes: Vec<Remote>,
}

impl RemoteRegistry {
    /// Creates a registry from remotes in priority order.
    pub fn new(remotes: Vec<Remote>) -> Self {
        Self { remotes }
    }

    /// The standard registry for an Artifactory installation: redirect,
    /// external and local Artifactory repositories, then the public ones.
    pub fn standard(artifactory: &str) -> Self {
        let conan_api = |repo: &str| format!("{artifactory}/api/conan/{repo}");
        Self::new(vec![
            Remote::new("conan-redirect", conan_api("conan-redirect")),
            Remote::new("conan-ext", conan_api("conan-ext")),
            Remote::new("conan-local", conan_api("conan-local")),
            Remote::new("conan-center", "https://conan.bintray.com"),
            Remote::new(
                "bincrafters",
                "https://api.bintray.com/conan/bincrafters/public-conan",
            ),
        ])
    }

    /// Iterates remotes in priority order.
    pub fn iter(&self) -> impl Iterator<Item = &Remote> {
        self.remotes.iter()
    }

    /// Looks up a remote by name.
    pub fn get(&self, name: &str) -> Option<&Remote> {
        self.remotes.iter().find(|r| r.name == name)
    }

    /// Number of remotes.
    pub fn len(&self) -> usize {
        self.remotes.len()
    }

    /// True when there are no remotes.
    pub fn is_empty(&self) -> bool {
        self.remotes.is_empty()
    }
}
