//! Package references of the form `name/version@user/channel`.

use crate::error::{Result, TasksError};
use std::fmt;
use std::str::FromStr;

/// A fully qualified Conan package reference.
///
/// # Examples
///
/// ```
/// use dl_conan_build_tools::conan::PackageReference;
///
/// let r: PackageReference = "leptonica/1.76.0@bincrafters/stable".parse().unwrap();
/// assert_eq!(r.name, "leptonica");
/// assert_eq!(r.with_user("datalogics").to_string(), "leptonica/1.76.0@datalogics/stable");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageReference {
    /// Package name
    pub name: String,
    /// Package version
    pub version: String,
    /// Maintainer namespace
    pub user: String,
    /// Stability track
    pub channel: String,
}

impl PackageReference {
    /// Creates a reference from its four components.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        user: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
            user: user.into(),
            channel: channel.into(),
        }
    }

    /// Same package and channel, owned by another user.
    pub fn with_user(&self, user: &str) -> Self {
        Self {
            user: user.to_string(),
            ..self.clone()
        }
    }

    /// The `user/channel` part, as accepted by `conan copy` and `conan create`.
    pub fn user_channel(&self) -> String {
        format!("{}/{}", self.user, self.channel)
    }
}

impl fmt::Display for PackageReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}@{}/{}",
            self.name, self.version, self.user, self.channel
        )
    }
}

impl FromStr for PackageReference {
    type Err = TasksError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| TasksError::InvalidReference {
            reference: s.to_string(),
            reason: reason.to_string(),
        };

        let s = s.trim();
        let (name_version, user_channel) = s
            .split_once('@')
            .ok_or_else(|| invalid("expected name/version@user/channel"))?;
        let (name, version) = name_version
            .split_once('/')
            .ok_or_else(|| invalid("missing version"))?;
        let (user, channel) = user_channel
            .split_once('/')
            .ok_or_else(|| invalid("missing channel"))?;

        for (part, label) in [
            (name, "name"),
            (version, "version"),
            (user, "user"),
            (channel, "channel"),
        ] {
            if part.is_empty() {
                return Err(invalid(&format!("empty {label}")));
            }
            if part.contains(['/', '@', ' ']) {
                return Err(invalid(&format!("unexpected separator in {label}")));
            }
        }

        Ok(Self::new(name, version, user, channel))
    }
}
