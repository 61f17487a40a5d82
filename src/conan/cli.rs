//! [`ConanClient`] backed by the `conan` executable.

use super::{
    ConanClient, ConfiguredRemote, CreateRequest, InstallRequest, InstallTarget, PackageReference,
    RecipeInfo, RemoteBinding, RemoteUser, UploadRequest,
};
use crate::cli::OutputManager;
use crate::error::{CliError, FsContext, Result, TasksError};
use crate::process::{ExecEnv, Invocation};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Variable `conan user -p` reads the password from.
const PASSWORD_VAR: &str = "CONAN_PASSWORD";

/// Runs `conan` commands in the project directory.
#[derive(Clone, Debug)]
pub struct ConanCli {
    program: PathBuf,
    project_dir: PathBuf,
    env: ExecEnv,
    output: OutputManager,
}

impl ConanCli {
    /// Uses the `conan` found in `PATH`.
    pub fn new(project_dir: impl Into<PathBuf>, output: OutputManager) -> Result<Self> {
        Ok(Self::with_program(crate::tools::conan()?, project_dir, output))
    }

    /// Uses an explicit `conan` executable.
    pub fn with_program(
        program: impl Into<PathBuf>,
        project_dir: impl Into<PathBuf>,
        output: OutputManager,
    ) -> Self {
        Self {
            program: program.into(),
            project_dir: project_dir.into(),
            env: ExecEnv::new(),
            output,
        }
    }

    /// Same client with extra environment for every `conan` call.
    pub fn with_env(&self, env: &ExecEnv) -> Self {
        let mut client = self.clone();
        client.env.extend(env);
        client
    }

    /// Environment added to every call.
    pub fn env(&self) -> &ExecEnv {
        &self.env
    }

    fn invocation(&self) -> Invocation {
        Invocation::new(&self.program)
            .env(&self.env)
            .current_dir(&self.project_dir)
    }

    async fn run<I, S>(&self, args: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.invocation().args(args).run(&self.output).await
    }

    async fn capture<I, S>(&self, args: I) -> Result<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        self.invocation().args(args).capture(&self.output).await
    }

    /// Runs a command that writes `--json <file>` and parses the file.
    async fn json<T: DeserializeOwned>(&self, args: Vec<String>) -> Result<T> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("conan.json");
        self.invocation()
            .args(args)
            .arg("--json")
            .arg(&path)
            .run(&self.output)
            .await?;
        read_json(&path)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = std::fs::read_to_string(path).fs_context("reading", path)?;
    Ok(serde_json::from_str(&text)?)
}

fn key_values(flag: &str, values: &BTreeMap<String, String>) -> Vec<String> {
    values
        .iter()
        .flat_map(|(k, v)| [flag.to_string(), format!("{k}={v}")])
        .collect()
}

/// Arguments shared by `install` and `create`.
fn configuration_args(
    settings: &BTreeMap<String, String>,
    options: &BTreeMap<String, String>,
    env: &BTreeMap<String, String>,
    build: &[String],
    profile: Option<&str>,
) -> Vec<String> {
    let mut args = key_values("-s", settings);
    args.extend(key_values("-o", options));
    args.extend(key_values("-e", env));
    for policy in build {
        args.push(format!("--build={policy}"));
    }
    if let Some(profile) = profile {
        args.push("--profile".into());
        args.push(profile.into());
    }
    args
}

/// Builds the `conan install` argument list.
pub(crate) fn install_args(request: &InstallRequest) -> Vec<String> {
    let mut args = vec!["install".to_string()];
    match &request.target {
        InstallTarget::Path(path) => args.push(path.display().to_string()),
        InstallTarget::Reference(reference) => args.push(reference.to_string()),
    }
    if let Some(folder) = &request.install_folder {
        args.push("--install-folder".into());
        args.push(folder.display().to_string());
    }
    args.extend(configuration_args(
        &request.settings,
        &request.options,
        &request.env,
        &request.build,
        request.profile.as_deref(),
    ));
    for generator in &request.generators {
        args.push("-g".into());
        args.push(generator.clone());
    }
    args
}

pub(crate) fn remote_add_args(
    name: &str,
    url: &str,
    insert: Option<usize>,
    force: bool,
) -> Vec<String> {
    let mut args = vec!["remote".to_string(), "add".into(), name.into(), url.into()];
    if let Some(position) = insert {
        args.push("--insert".into());
        args.push(position.to_string());
    }
    if force {
        args.push("--force".into());
    }
    args
}

/// `conan user` without the password; `-p` alone makes conan read
/// `CONAN_PASSWORD`.
pub(crate) fn authenticate_args(username: &str, remote: &str) -> Vec<String> {
    ["user", "-r", remote, username, "-p"]
        .into_iter()
        .map(String::from)
        .collect()
}

pub(crate) fn create_args(request: &CreateRequest) -> Vec<String> {
    let mut args = vec![
        "create".to_string(),
        request.path.display().to_string(),
        request.reference.user_channel(),
    ];
    args.extend(configuration_args(
        &request.settings,
        &request.options,
        &request.env,
        &request.build,
        request.profile.as_deref(),
    ));
    args
}

pub(crate) fn copy_args(
    reference: &PackageReference,
    user_channel: &str,
    force: bool,
    packages: bool,
) -> Vec<String> {
    let mut args = vec![
        "copy".to_string(),
        reference.to_string(),
        user_channel.to_string(),
    ];
    if packages {
        args.push("--all".into());
    }
    if force {
        args.push("--force".into());
    }
    args
}

pub(crate) fn upload_args(request: &UploadRequest) -> Vec<String> {
    let mut args = vec![
        "upload".to_string(),
        request.reference.to_string(),
        "--remote".into(),
        request.remote.clone(),
    ];
    if request.all_packages {
        args.push("--all".into());
    }
    if request.confirm {
        args.push("--confirm".into());
    }
    if request.force {
        args.push("--force".into());
    }
    args
}

pub(crate) fn remove_args(reference: &PackageReference, force: bool) -> Vec<String> {
    let mut args = vec!["remove".to_string(), reference.to_string()];
    if force {
        args.push("--force".into());
    }
    args
}

pub(crate) fn alias_args(alias: &PackageReference, target: &PackageReference) -> Vec<String> {
    vec!["alias".to_string(), alias.to_string(), target.to_string()]
}

/// Parses `conan remote list --raw`: one `name url verify_ssl` line per remote.
pub(crate) fn parse_remote_list(text: &str) -> Vec<ConfiguredRemote> {
    text.lines()
        .filter_map(|line| {
            let mut parts = line.split_whitespace();
            let name = parts.next()?;
            let url = parts.next()?;
            Some(ConfiguredRemote {
                name: name.to_string(),
                url: url.to_string(),
            })
        })
        .collect()
}

/// Parses `conan remote list_ref`: one `reference: remote` line per binding.
pub(crate) fn parse_remote_refs(text: &str) -> Result<Vec<RemoteBinding>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let (reference, remote) = line.rsplit_once(':').ok_or_else(|| {
                TasksError::Cli(CliError::ExecutionFailed {
                    command: "conan remote list_ref".into(),
                    reason: format!("unexpected output line: {line}"),
                })
            })?;
            Ok(RemoteBinding {
                reference: reference.trim().parse()?,
                remote: remote.trim().to_string(),
            })
        })
        .collect()
}

#[derive(Deserialize)]
struct UserOutput {
    #[serde(default)]
    remotes: Vec<RemoteUser>,
}

/// Remotes of `conan user --json`.
pub(crate) fn parse_users(text: &str) -> Result<Vec<RemoteUser>> {
    let output: UserOutput = serde_json::from_str(text)?;
    Ok(output.remotes)
}

/// One node of `conan info --json`.
#[derive(Deserialize)]
struct InfoNode {
    reference: String,
    #[serde(default)]
    is_ref: bool,
}

/// References of `conan info --json`, root excluded.
pub(crate) fn parse_info(text: &str) -> Result<Vec<PackageReference>> {
    let nodes: Vec<InfoNode> = serde_json::from_str(text)?;
    nodes
        .into_iter()
        .filter(|node| node.is_ref)
        .map(|node| node.reference.parse())
        .collect()
}

impl ConanClient for ConanCli {
    async fn remote_list(&self) -> Result<Vec<ConfiguredRemote>> {
        let text = self.capture(["remote", "list", "--raw"]).await?;
        Ok(parse_remote_list(&text))
    }

    async fn remote_rename(&self, old: &str, new: &str) -> Result<()> {
        self.run(["remote", "rename", old, new]).await
    }

    async fn remote_add(
        &self,
        name: &str,
        url: &str,
        insert: Option<usize>,
        force: bool,
    ) -> Result<()> {
        self.run(remote_add_args(name, url, insert, force)).await
    }

    async fn remote_remove(&self, name: &str) -> Result<()> {
        self.run(["remote", "remove", name]).await
    }

    async fn remote_list_ref(&self) -> Result<Vec<RemoteBinding>> {
        let text = self.capture(["remote", "list_ref"]).await?;
        parse_remote_refs(&text)
    }

    async fn remote_remove_ref(&self, reference: &PackageReference) -> Result<()> {
        let reference = reference.to_string();
        self.run(["remote", "remove_ref", reference.as_str()]).await
    }

    async fn remote_update_ref(&self, reference: &PackageReference, remote: &str) -> Result<()> {
        let reference = reference.to_string();
        self.run(["remote", "update_ref", reference.as_str(), remote])
            .await
    }

    async fn users(&self) -> Result<Vec<RemoteUser>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("user.json");
        self.invocation()
            .args(["user", "--json"])
            .arg(&path)
            .run(&self.output)
            .await?;
        let text = std::fs::read_to_string(&path).fs_context("reading", &path)?;
        parse_users(&text)
    }

    async fn authenticate(&self, username: &str, token: &str, remote: &str) -> Result<()> {
        // The token travels in the environment, never on the command line.
        self.invocation()
            .args(authenticate_args(username, remote))
            .env(&ExecEnv::new().with(PASSWORD_VAR, token))
            .run(&self.output)
            .await
    }

    async fn install(&self, request: &InstallRequest) -> Result<()> {
        self.run(install_args(request)).await
    }

    async fn dependencies(&self, profile: &str) -> Result<Vec<PackageReference>> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("info.json");
        self.invocation()
            .args(["info", ".", "--profile", profile, "--json"])
            .arg(&path)
            .run(&self.output)
            .await?;
        let text = std::fs::read_to_string(&path).fs_context("reading", &path)?;
        let references = parse_info(&text)?;
        log::debug!("Dependency graph has {} references", references.len());
        Ok(references)
    }

    async fn inspect(&self, target: &str) -> Result<RecipeInfo> {
        self.json(
            ["inspect", target, "-a", "name", "-a", "version", "-a", "options", "-a", "alias"]
                .into_iter()
                .map(String::from)
                .collect(),
        )
        .await
    }

    async fn create(&self, request: &CreateRequest) -> Result<()> {
        self.run(create_args(request)).await
    }

    async fn copy(
        &self,
        reference: &PackageReference,
        user_channel: &str,
        force: bool,
        packages: bool,
    ) -> Result<()> {
        self.run(copy_args(reference, user_channel, force, packages))
            .await
    }

    async fn upload(&self, request: &UploadRequest) -> Result<()> {
        self.run(upload_args(request)).await
    }

    async fn remove(&self, reference: &PackageReference, force: bool) -> Result<()> {
        self.run(remove_args(reference, force)).await
    }

    async fn export_alias(&self, alias: &PackageReference, target: &PackageReference) -> Result<()> {
        self.run(alias_args(alias, target)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_raw_remote_list() {
        let remotes = parse_remote_list(
            "conan-center https://conan.bintray.com True\n\
             local http://af/api/conan/conan-local False [Disabled]\n\n",
        );
        assert_eq!(remotes.len(), 2);
        assert_eq!(remotes[1].name, "local");
        assert_eq!(remotes[1].url, "http://af/api/conan/conan-local");
    }

    #[test]
    fn parses_remote_refs() {
        let refs = parse_remote_refs(
            "zlib/1.2.11@conan/stable: conan-center\nboost/1.67.0@conan/stable: conan-ext\n",
        )
        .unwrap();
        assert_eq!(refs[0].reference.name, "zlib");
        assert_eq!(refs[1].remote, "conan-ext");
    }

    #[test]
    fn info_skips_root_node() {
        let refs = parse_info(
            r#"[
                {"reference": "conanfile.py (tesseract/4.0)", "is_ref": false},
                {"reference": "zlib/1.2.11@conan/stable", "is_ref": true, "id": "abc"}
            ]"#,
        )
        .unwrap();
        assert_eq!(refs, vec!["zlib/1.2.11@conan/stable".parse().unwrap()]);
    }

    #[test]
    fn install_args_order() {
        let request = InstallRequest::path(".")
            .install_folder("build")
            .setting("build_type", "Release")
            .build("missing")
            .build("boost_build")
            .profile(Some("devtoolset-7"));
        assert_eq!(
            install_args(&request),
            [
                "install",
                ".",
                "--install-folder",
                "build",
                "-s",
                "build_type=Release",
                "--build=missing",
                "--build=boost_build",
                "--profile",
                "devtoolset-7"
            ]
        );
    }

    #[test]
    fn recipe_info_options_and_alias() {
        let info: RecipeInfo = serde_json::from_str(
            r#"{"name": "tess", "version": "4.0", "options": {"shared": [true, false]}, "alias": null}"#,
        )
        .unwrap();
        assert!(info.has_option("shared"));
        assert!(!info.is_alias());
    }

    fn reference(text: &str) -> PackageReference {
        text.parse().unwrap()
    }

    #[test]
    fn parses_user_json() {
        let users = parse_users(
            r#"{
                "error": false,
                "remotes": [
                    {"name": "conan-center", "user_name": null, "authenticated": false},
                    {"name": "conan-local", "user_name": "jdoe", "authenticated": true}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(users.len(), 2);
        assert_eq!(users[0].user_name, None);
        assert!(!users[0].authenticated);
        assert_eq!(users[1].user_name.as_deref(), Some("jdoe"));
        assert!(users[1].authenticated);

        assert!(parse_users(r#"{"error": false}"#).unwrap().is_empty());
    }

    #[test]
    fn remote_add_flags() {
        assert_eq!(
            remote_add_args("conan-local", "http://af/conan-local", Some(0), true),
            ["remote", "add", "conan-local", "http://af/conan-local", "--insert", "0", "--force"]
        );
        assert_eq!(
            remote_add_args("bincrafters", "http://bc", None, false),
            ["remote", "add", "bincrafters", "http://bc"]
        );
    }

    #[test]
    fn upload_flags() {
        let zlib = reference("zlib/1.2.11@conan/stable");
        assert_eq!(
            upload_args(&UploadRequest::new(zlib.clone(), "conan-ext")),
            ["upload", "zlib/1.2.11@conan/stable", "--remote", "conan-ext", "--confirm"]
        );
        assert_eq!(
            upload_args(&UploadRequest::new(zlib, "conan-local").all_packages().force()),
            [
                "upload",
                "zlib/1.2.11@conan/stable",
                "--remote",
                "conan-local",
                "--all",
                "--confirm",
                "--force"
            ]
        );
    }

    #[test]
    fn copy_remove_and_alias() {
        let zlib = reference("zlib/1.2.11@conan/stable");
        assert_eq!(
            copy_args(&zlib, "datalogics/stable", true, true),
            ["copy", "zlib/1.2.11@conan/stable", "datalogics/stable", "--all", "--force"]
        );
        assert_eq!(
            copy_args(&zlib, "datalogics/stable", false, false),
            ["copy", "zlib/1.2.11@conan/stable", "datalogics/stable"]
        );
        assert_eq!(
            remove_args(&zlib, true),
            ["remove", "zlib/1.2.11@conan/stable", "--force"]
        );
        assert_eq!(
            alias_args(
                &reference("tess/latest@datalogics/stable"),
                &reference("tess/4.0@datalogics/stable")
            ),
            ["alias", "tess/latest@datalogics/stable", "tess/4.0@datalogics/stable"]
        );
    }

    #[test]
    fn create_uses_user_channel() {
        let request = CreateRequest {
            path: PathBuf::from("."),
            reference: reference("tess/4.0@jdoe/testing"),
            settings: BTreeMap::from([("build_type".to_string(), "Debug".to_string())]),
            options: BTreeMap::from([("shared".to_string(), "True".to_string())]),
            env: BTreeMap::new(),
            build: vec!["outdated".into()],
            profile: None,
        };
        assert_eq!(
            create_args(&request),
            [
                "create",
                ".",
                "jdoe/testing",
                "-s",
                "build_type=Debug",
                "-o",
                "shared=True",
                "--build=outdated"
            ]
        );
    }

    #[test]
    fn authenticate_keeps_token_off_argv() {
        let args = authenticate_args("jdoe", "conan-local");
        assert_eq!(args, ["user", "-r", "conan-local", "jdoe", "-p"]);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn authenticate_passes_token_in_environment() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("conan");
        std::fs::write(
            &script,
            "#!/bin/sh\necho \"$@\" > \"$(dirname \"$0\")/args\"\n\
             printf %s \"$CONAN_PASSWORD\" > \"$(dirname \"$0\")/password\"\n",
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let conan = ConanCli::with_program(&script, dir.path(), OutputManager::new(false, true));
        conan
            .authenticate("jdoe", "tok-123", "conan-local")
            .await
            .unwrap();

        let args = std::fs::read_to_string(dir.path().join("args")).unwrap();
        assert_eq!(args.trim(), "user -r conan-local jdoe -p");
        assert!(!args.contains("tok-123"));
        let password = std::fs::read_to_string(dir.path().join("password")).unwrap();
        assert_eq!(password, "tok-123");
    }
}
