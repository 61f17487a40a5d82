//! In-memory [`ConanClient`] for unit tests.

use super::{
    ConanClient, ConfiguredRemote, CreateRequest, InstallRequest, PackageReference, RecipeInfo,
    RemoteBinding, RemoteUser, UploadRequest,
};
use crate::error::{CliError, Result, TasksError};
use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};

/// State and call log of a fake package manager.
#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub remotes: Vec<ConfiguredRemote>,
    pub bindings: Vec<RemoteBinding>,
    pub tokens: BTreeMap<String, (String, String)>,
    pub dependencies: Vec<PackageReference>,
    pub aliases: BTreeSet<PackageReference>,
    pub recipe: RecipeInfo,
    pub calls: Vec<String>,
}

#[derive(Debug, Default)]
pub(crate) struct FakeConan {
    pub state: RefCell<FakeState>,
}

impl FakeConan {
    pub fn with_remotes(remotes: &[(&str, &str)]) -> Self {
        let fake = Self::default();
        fake.state.borrow_mut().remotes = remotes
            .iter()
            .map(|(name, url)| ConfiguredRemote {
                name: name.to_string(),
                url: url.to_string(),
            })
            .collect();
        fake
    }

    pub fn remote_pairs(&self) -> Vec<(String, String)> {
        self.state
            .borrow()
            .remotes
            .iter()
            .map(|r| (r.name.clone(), r.url.clone()))
            .collect()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.borrow().calls.clone()
    }

    fn log(&self, call: String) {
        self.state.borrow_mut().calls.push(call);
    }
}

fn missing(what: String) -> TasksError {
    TasksError::Cli(CliError::ExecutionFailed {
        command: "conan".into(),
        reason: what,
    })
}

impl ConanClient for FakeConan {
    async fn remote_list(&self) -> Result<Vec<ConfiguredRemote>> {
        Ok(self.state.borrow().remotes.clone())
    }

    async fn remote_rename(&self, old: &str, new: &str) -> Result<()> {
        self.log(format!("remote rename {old} {new}"));
        let mut state = self.state.borrow_mut();
        let remote = state
            .remotes
            .iter_mut()
            .find(|r| r.name == old)
            .ok_or_else(|| missing(format!("no remote {old}")))?;
        remote.name = new.to_string();
        Ok(())
    }

    async fn remote_add(
        &self,
        name: &str,
        url: &str,
        insert: Option<usize>,
        force: bool,
    ) -> Result<()> {
        self.log(format!("remote add {name} {url} {insert:?}"));
        let mut state = self.state.borrow_mut();
        let exists = state.remotes.iter().any(|r| r.name == name || r.url == url);
        if exists && !force {
            return Err(missing(format!("remote {name} already exists")));
        }
        state.remotes.retain(|r| r.name != name && r.url != url);
        let remote = ConfiguredRemote {
            name: name.to_string(),
            url: url.to_string(),
        };
        match insert {
            Some(i) if i < state.remotes.len() => state.remotes.insert(i, remote),
            _ => state.remotes.push(remote),
        }
        Ok(())
    }

    async fn remote_remove(&self, name: &str) -> Result<()> {
        self.log(format!("remote remove {name}"));
        self.state.borrow_mut().remotes.retain(|r| r.name != name);
        Ok(())
    }

    async fn remote_list_ref(&self) -> Result<Vec<RemoteBinding>> {
        Ok(self.state.borrow().bindings.clone())
    }

    async fn remote_remove_ref(&self, reference: &PackageReference) -> Result<()> {
        self.log(format!("remote remove_ref {reference}"));
        self.state
            .borrow_mut()
            .bindings
            .retain(|b| &b.reference != reference);
        Ok(())
    }

    async fn remote_update_ref(&self, reference: &PackageReference, remote: &str) -> Result<()> {
        self.log(format!("remote update_ref {reference} {remote}"));
        let mut state = self.state.borrow_mut();
        for binding in state.bindings.iter_mut().filter(|b| &b.reference == reference) {
            binding.remote = remote.to_string();
        }
        Ok(())
    }

    async fn users(&self) -> Result<Vec<RemoteUser>> {
        let state = self.state.borrow();
        Ok(state
            .remotes
            .iter()
            .map(|r| {
                let login = state.tokens.get(&r.name);
                RemoteUser {
                    name: r.name.clone(),
                    user_name: login.map(|(user, _)| user.clone()),
                    authenticated: login.is_some(),
                }
            })
            .collect())
    }

    async fn authenticate(&self, username: &str, token: &str, remote: &str) -> Result<()> {
        self.log(format!("user {username} -r {remote}"));
        self.state
            .borrow_mut()
            .tokens
            .insert(remote.to_string(), (username.to_string(), token.to_string()));
        Ok(())
    }

    async fn install(&self, request: &InstallRequest) -> Result<()> {
        let target = match &request.target {
            super::InstallTarget::Path(path) => path.display().to_string(),
            super::InstallTarget::Reference(r) => r.to_string(),
        };
        let settings: Vec<_> = request
            .settings
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        self.log(format!(
            "install {target} {} build={}",
            settings.join(","),
            request.build.join(",")
        ));
        Ok(())
    }

    async fn dependencies(&self, profile: &str) -> Result<Vec<PackageReference>> {
        self.log(format!("info . --profile {profile}"));
        Ok(self.state.borrow().dependencies.clone())
    }

    async fn inspect(&self, target: &str) -> Result<RecipeInfo> {
        let state = self.state.borrow();
        if target == "." {
            return Ok(state.recipe.clone());
        }
        let reference: PackageReference = target.parse()?;
        Ok(RecipeInfo {
            name: Some(reference.name.clone()),
            version: Some(reference.version.clone()),
            options: None,
            alias: state
                .aliases
                .contains(&reference)
                .then(|| "target/1.0@x/stable".to_string()),
        })
    }

    async fn create(&self, request: &CreateRequest) -> Result<()> {
        let settings: Vec<_> = request
            .settings
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        self.log(format!("create {} {}", request.reference, settings.join(",")));
        Ok(())
    }

    async fn copy(
        &self,
        reference: &PackageReference,
        user_channel: &str,
        _force: bool,
        _packages: bool,
    ) -> Result<()> {
        self.log(format!("copy {reference} {user_channel}"));
        Ok(())
    }

    async fn upload(&self, request: &UploadRequest) -> Result<()> {
        self.log(format!(
            "upload {} -r {}{}",
            request.reference,
            request.remote,
            if request.all_packages { " --all" } else { "" }
        ));
        Ok(())
    }

    async fn remove(&self, reference: &PackageReference, _force: bool) -> Result<()> {
        self.log(format!("remove {reference}"));
        Ok(())
    }

    async fn export_alias(&self, alias: &PackageReference, target: &PackageReference) -> Result<()> {
        self.log(format!("alias {alias} {target}"));
        Ok(())
    }
}
