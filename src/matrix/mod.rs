//! The packaging matrix: every configuration a package is built in.
//!
//! The matrix is fixed per host platform. Linux builds with gcc, macOS with
//! apple-clang and Windows with Visual Studio, each in Release and Debug for
//! every configured architecture. Recipes with a `shared` option are built
//! both shared and static.

use crate::conan::PackageReference;
use crate::platform::HostPlatform;
use std::collections::BTreeMap;

/// One configuration of the packaging matrix.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildItem {
    /// Conan settings (`-s`)
    pub settings: BTreeMap<String, String>,
    /// Conan options (`-o`)
    pub options: BTreeMap<String, String>,
    /// Environment variables (`-e`)
    pub env_vars: BTreeMap<String, String>,
    /// Build requirements
    pub build_requires: Vec<String>,
    /// Reference the configuration is built as
    pub reference: PackageReference,
}

/// Compiler versions and architectures the matrix covers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatrixParams {
    /// Conan `arch` values
    pub archs: Vec<String>,
    /// gcc versions (Linux)
    pub gcc_versions: Vec<String>,
    /// apple-clang versions (macOS)
    pub apple_clang_versions: Vec<String>,
    /// Visual Studio versions (Windows)
    pub visual_versions: Vec<String>,
}

impl Default for MatrixParams {
    fn default() -> Self {
        Self {
            archs: vec!["x86_64".into()],
            gcc_versions: vec!["7".into()],
            apple_clang_versions: vec!["9.1".into()],
            visual_versions: vec!["12".into()],
        }
    }
}

const BUILD_TYPES: [&str; 2] = ["Release", "Debug"];

/// Compiler settings without arch or build type.
type CompilerSettings = Vec<(&'static str, String)>;

fn compiler_configurations(
    platform: HostPlatform,
    params: &MatrixParams,
    build_type: &str,
) -> Vec<CompilerSettings> {
    match platform {
        HostPlatform::Linux => params
            .gcc_versions
            .iter()
            .flat_map(|version| {
                ["libstdc++", "libstdc++11"].into_iter().map(move |libcxx| {
                    vec![
                        ("compiler", "gcc".to_string()),
                        ("compiler.version", version.clone()),
                        ("compiler.libcxx", libcxx.to_string()),
                    ]
                })
            })
            .collect(),
        HostPlatform::MacOs => params
            .apple_clang_versions
            .iter()
            .map(|version| {
                vec![
                    ("compiler", "apple-clang".to_string()),
                    ("compiler.version", version.clone()),
                    ("compiler.libcxx", "libc++".to_string()),
                ]
            })
            .collect(),
        HostPlatform::Windows => {
            let runtimes: &[&str] = if build_type == "Debug" {
                &["MTd", "MDd"]
            } else {
                &["MT", "MD"]
            };
            params
                .visual_versions
                .iter()
                .flat_map(|version| {
                    runtimes.iter().map(move |runtime| {
                        vec![
                            ("compiler", "Visual Studio".to_string()),
                            ("compiler.version", version.clone()),
                            ("compiler.runtime", runtime.to_string()),
                        ]
                    })
                })
                .collect()
        }
        HostPlatform::Other => Vec::new(),
    }
}

/// The packaging matrix for `reference` on `platform`.
///
/// `shared_option` is the recipe name when the recipe declares a `shared`
/// option; each configuration is then produced shared and static.
pub fn common_builds(
    platform: HostPlatform,
    params: &MatrixParams,
    reference: &PackageReference,
    shared_option: Option<&str>,
) -> Vec<BuildItem> {
    let shared_values: Vec<Option<&str>> = match shared_option {
        Some(_) => vec![Some("True"), Some("False")],
        None => vec![None],
    };

    let mut items = Vec::new();
    for arch in &params.archs {
        for build_type in BUILD_TYPES {
            for compiler in compiler_configurations(platform, params, build_type) {
                for shared in &shared_values {
                    let mut settings = BTreeMap::new();
                    settings.insert("arch".to_string(), arch.clone());
                    settings.insert("build_type".to_string(), build_type.to_string());
                    for (key, value) in &compiler {
                        settings.insert(key.to_string(), value.clone());
                    }

                    let mut options = BTreeMap::new();
                    if let (Some(name), Some(value)) = (shared_option, shared) {
                        options.insert(format!("{name}:shared"), value.to_string());
                    }

                    items.push(BuildItem {
                        settings,
                        options,
                        env_vars: BTreeMap::new(),
                        build_requires: Vec::new(),
                        reference: reference.clone(),
                    });
                }
            }
        }
    }

    log::debug!(
        "Packaging matrix for {} on {:?}: {} configurations",
        reference,
        platform,
        items.len()
    );
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference() -> PackageReference {
        "tesseract/4.0.0@alice/testing".parse().unwrap()
    }

    #[test]
    fn linux_matrix_without_shared_option() {
        let items = common_builds(HostPlatform::Linux, &MatrixParams::default(), &reference(), None);
        // 2 build types x 2 libcxx
        assert_eq!(items.len(), 4);
        assert!(items.iter().all(|i| i.settings["compiler"] == "gcc"));
        assert!(items.iter().all(|i| i.settings["compiler.version"] == "7"));
        assert!(items.iter().all(|i| i.settings["arch"] == "x86_64"));
        assert!(items.iter().all(|i| i.options.is_empty()));
        assert_eq!(items[0].settings["build_type"], "Release");
        assert_eq!(items[0].settings["compiler.libcxx"], "libstdc++");
    }

    #[test]
    fn windows_runtimes_follow_build_type() {
        let items = common_builds(
            HostPlatform::Windows,
            &MatrixParams::default(),
            &reference(),
            Some("tesseract"),
        );
        // 2 build types x 2 runtimes x shared/static
        assert_eq!(items.len(), 8);
        for item in &items {
            let runtime = &item.settings["compiler.runtime"];
            assert_eq!(item.settings["build_type"] == "Debug", runtime.ends_with('d'));
            assert!(item.options.contains_key("tesseract:shared"));
        }
    }

    #[test]
    fn macos_uses_apple_clang() {
        let items = common_builds(HostPlatform::MacOs, &MatrixParams::default(), &reference(), None);
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].settings["compiler"], "apple-clang");
        assert_eq!(items[1].settings["compiler.version"], "9.1");
        assert_eq!(items[1].settings["compiler.libcxx"], "libc++");
        assert_eq!(items[1].reference, reference());
    }

    #[test]
    fn unknown_platform_has_empty_matrix() {
        assert!(common_builds(HostPlatform::Other, &MatrixParams::default(), &reference(), None).is_empty());
    }
}
