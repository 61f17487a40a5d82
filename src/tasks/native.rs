//! Configuring, building and testing the project with CMake.

use super::{InstallOptions, TaskContext, install};
use crate::error::{FsContext, Result, TasksError};
use crate::process::Invocation;
use crate::tools;
use std::path::Path;

const CMAKE_CACHE: &str = "CMakeCache.txt";
const GENERATOR_ENTRY: &str = "CMAKE_GENERATOR:INTERNAL=";

/// Options of the `cmake` task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CmakeOptions {
    /// CMake generator; the cached one (or CMake's default) when absent
    pub generator: Option<String>,
    /// `CMAKE_BUILD_TYPE` for single-configuration generators
    pub build_type: String,
}

impl Default for CmakeOptions {
    fn default() -> Self {
        Self {
            generator: None,
            build_type: "Debug".to_string(),
        }
    }
}

/// Options of the `build` and `test` tasks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BuildOptions {
    /// Configuration to build
    pub config: String,
    /// Build with one job per CPU
    pub parallel: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            config: "Debug".to_string(),
            parallel: false,
        }
    }
}

/// True for generators that put several configurations in one build tree.
pub fn is_multi_config(generator: &str) -> bool {
    ["Visual Studio", "Xcode", "Ninja Multi-Config"]
        .iter()
        .any(|prefix| generator.starts_with(prefix))
}

fn parse_cached_generator(cache: &str) -> Option<String> {
    cache
        .lines()
        .find_map(|line| line.trim().strip_prefix(GENERATOR_ENTRY))
        .map(|generator| generator.trim().to_string())
        .filter(|generator| !generator.is_empty())
}

/// Generator recorded in `build_dir`'s CMake cache, or `None` when the tree
/// is not configured.
pub fn read_cached_generator(build_dir: &Path) -> Result<Option<String>> {
    let cache = build_dir.join(CMAKE_CACHE);
    if !cache.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(&cache).fs_context("reading", &cache)?;
    Ok(parse_cached_generator(&text))
}

fn is_configured(ctx: &TaskContext) -> bool {
    ctx.settings().build_dir().join(CMAKE_CACHE).is_file()
}

fn choose_generator(requested: Option<&str>, cached: Option<&str>) -> Result<Option<String>> {
    match (requested, cached) {
        (Some(requested), Some(cached)) if requested != cached => Err(TasksError::Config(format!(
            "build was configured with \"{cached}\", not \"{requested}\"; run distclean first"
        ))),
        (Some(generator), _) | (None, Some(generator)) => Ok(Some(generator.to_string())),
        (None, None) => Ok(None),
    }
}

fn cmake_command(ctx: &TaskContext) -> Result<Invocation> {
    Ok(Invocation::new(tools::cmake()?).current_dir(ctx.settings().project_dir()))
}

/// Configures the build tree, installing requirements first when it has
/// never been configured.
pub async fn cmake(ctx: &TaskContext, options: &CmakeOptions) -> Result<()> {
    let settings = ctx.settings();
    let cached = read_cached_generator(&settings.build_dir())?;
    let generator = choose_generator(options.generator.as_deref(), cached.as_deref())?;
    let multi = match &generator {
        Some(generator) => is_multi_config(generator),
        None => settings.platform().multi_config_default(),
    };

    if !is_configured(ctx) {
        let conan = ctx.conan()?;
        install(
            ctx,
            &conan,
            &InstallOptions {
                multi,
                build_type: options.build_type.clone(),
            },
        )
        .await?;
    }

    ctx.output().section("Configuring")?;
    let mut command = cmake_command(ctx)?.args(["-S", ".", "-B", "build"]);
    if let Some(generator) = &generator {
        command = command.arg("-G").arg(generator);
    }
    if !multi {
        command = command.arg(format!("-DCMAKE_BUILD_TYPE={}", options.build_type));
    }
    command.run(ctx.output()).await
}

/// Configures a fresh tree, then builds one configuration.
pub async fn build(ctx: &TaskContext, options: &BuildOptions) -> Result<()> {
    if !is_configured(ctx) {
        cmake(
            ctx,
            &CmakeOptions {
                generator: None,
                build_type: options.config.clone(),
            },
        )
        .await?;
    }

    ctx.output().section(&format!("Building {}", options.config))?;
    let mut command =
        cmake_command(ctx)?.args(["--build", "build", "--config", options.config.as_str()]);
    if options.parallel {
        command = command
            .arg("--parallel")
            .arg(num_cpus::get().to_string());
    }
    command.run(ctx.output()).await
}

/// Builds, then runs the tests of one configuration.
pub async fn test(ctx: &TaskContext, options: &BuildOptions) -> Result<()> {
    build(ctx, options).await?;

    ctx.output().section(&format!("Testing {}", options.config))?;
    Invocation::new(tools::ctest()?)
        .args(["-C", options.config.as_str(), "--output-on-failure"])
        .current_dir(ctx.settings().build_dir())
        .run(ctx.output())
        .await
}

/// Removes build products, keeping the configuration.
pub async fn clean(ctx: &TaskContext) -> Result<()> {
    if !is_configured(ctx) {
        ctx.output().verbose("Nothing to clean")?;
        return Ok(());
    }
    cmake_command(ctx)?
        .args(["--build", "build", "--target", "clean"])
        .run(ctx.output())
        .await
}

async fn remove_tree(path: &Path) -> Result<bool> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(TasksError::Fs {
            action: "removing",
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Removes the build tree and the build tools install folder.
pub async fn distclean(ctx: &TaskContext) -> Result<()> {
    let settings = ctx.settings();
    for dir in [settings.build_dir(), settings.build_tools_install_dir()] {
        if remove_tree(&dir).await? {
            ctx.output()
                .progress(&format!("removed {}", dir.display()))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputManager;
    use crate::settings::SettingsBuilder;

    const CACHE: &str = "\
# This is the CMakeCache file.
CMAKE_BUILD_TYPE:STRING=Debug
//Name of generator.
CMAKE_GENERATOR:INTERNAL=Unix Makefiles
CMAKE_GENERATOR_PLATFORM:INTERNAL=
";

    fn ctx(project: &Path) -> TaskContext {
        TaskContext::new(
            SettingsBuilder::new().project_dir(project).build().unwrap(),
            OutputManager::new(false, true),
        )
    }

    #[test]
    fn parses_generator_from_cache() {
        assert_eq!(parse_cached_generator(CACHE).as_deref(), Some("Unix Makefiles"));
        assert_eq!(parse_cached_generator("CMAKE_GENERATOR:INTERNAL=\n"), None);
        assert_eq!(parse_cached_generator(""), None);
    }

    #[test]
    fn multi_config_generators() {
        assert!(is_multi_config("Visual Studio 12 2013 Win64"));
        assert!(is_multi_config("Xcode"));
        assert!(is_multi_config("Ninja Multi-Config"));
        assert!(!is_multi_config("Ninja"));
        assert!(!is_multi_config("Unix Makefiles"));
    }

    #[test]
    fn generator_mismatch_requires_distclean() {
        let err = choose_generator(Some("Ninja"), Some("Unix Makefiles")).unwrap_err();
        assert!(err.to_string().contains("distclean"));
        assert_eq!(
            choose_generator(None, Some("Ninja")).unwrap().as_deref(),
            Some("Ninja")
        );
        assert_eq!(
            choose_generator(Some("Ninja"), Some("Ninja")).unwrap().as_deref(),
            Some("Ninja")
        );
        assert_eq!(choose_generator(None, None).unwrap(), None);
    }

    #[test]
    fn reads_cache_from_build_dir() {
        let project = tempfile::tempdir().unwrap();
        let build = project.path().join("build");
        assert_eq!(read_cached_generator(&build).unwrap(), None);

        std::fs::create_dir_all(&build).unwrap();
        std::fs::write(build.join(CMAKE_CACHE), CACHE).unwrap();
        assert_eq!(
            read_cached_generator(&build).unwrap().as_deref(),
            Some("Unix Makefiles")
        );
        assert!(is_configured(&ctx(project.path())));
    }

    #[tokio::test]
    async fn distclean_removes_build_trees() {
        let project = tempfile::tempdir().unwrap();
        let build = project.path().join("build");
        let tools_build = project.path().join("build_tools").join("build");
        std::fs::create_dir_all(build.join("sub")).unwrap();
        std::fs::create_dir_all(&tools_build).unwrap();
        std::fs::write(project.path().join("build_tools").join("conanfile.py"), "").unwrap();

        distclean(&ctx(project.path())).await.unwrap();

        assert!(!build.exists());
        assert!(!tools_build.exists());
        assert!(project.path().join("build_tools").join("conanfile.py").exists());

        // A second run finds nothing to remove.
        distclean(&ctx(project.path())).await.unwrap();
    }

    #[tokio::test]
    async fn build_on_configured_tree_goes_straight_to_build() {
        let project = tempfile::tempdir().unwrap();
        let build_dir = project.path().join("build");
        std::fs::create_dir_all(&build_dir).unwrap();
        std::fs::write(build_dir.join(CMAKE_CACHE), CACHE).unwrap();

        // Whatever `cmake --build` does with this tree, neither the install
        // nor the configure step runs first.
        if let Err(err) = build(&ctx(project.path()), &BuildOptions::default()).await {
            let message = err.to_string();
            assert!(!message.contains("conan"), "{message}");
            assert!(!message.contains("-S ."), "{message}");
        }
    }

    #[tokio::test]
    async fn clean_without_cache_is_noop() {
        let project = tempfile::tempdir().unwrap();
        clean(&ctx(project.path())).await.unwrap();
    }
}
