//! Artifactory encrypted-password exchange and interactive credentials.

use crate::ci::local_username;
use crate::error::{Result, TasksError};
use crate::tasks::{CredentialSource, Credentials, TaskContext};

/// Exchanges a password for the user's encrypted password.
///
/// Fetching the encrypted password also proves the password is right; any
/// non-success status is an error.
pub async fn encrypted_password(
    client: &reqwest::Client,
    url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    log::info!("Requesting encrypted password for {} from {}", username, url);

    let response = client
        .get(url)
        .basic_auth(username, Some(password))
        .send()
        .await?
        .error_for_status()?;

    Ok(response.text().await?.trim().to_string())
}

fn password_message(ctx: &TaskContext) -> String {
    format!(
        "Your encrypted password is required to log you in to Artifactory.\n\
         \n\
         To get your encrypted password, go to:\n\
         \n\
         {}\n\
         \n\
         Enter your password to unlock the page, then click the copy button next to\n\
         Encrypted Password.",
        ctx.settings().profile_url()
    )
}

/// Prompts on the terminal and fetches the token over HTTP.
#[derive(Debug, Default)]
pub struct InteractiveCredentials {
    client: reqwest::Client,
}

impl InteractiveCredentials {
    /// Creates a credential source with a default HTTP client.
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialSource for InteractiveCredentials {
    async fn credentials(&mut self, ctx: &TaskContext, username: Option<&str>) -> Result<Credentials> {
        ctx.output().highlight(&password_message(ctx))?;

        let given = username.map(str::to_string);
        let artifactory = ctx.settings().artifactory().to_string();
        let (username, password) = tokio::task::spawn_blocking(move || -> Result<(String, String)> {
            let username = match given {
                Some(username) => username,
                None => {
                    let default_username = local_username();
                    inquire::Text::new("Enter your Artifactory username:")
                        .with_default(&default_username)
                        .prompt()?
                }
            };
            let password = inquire::Password::new(&format!(
                "Enter encrypted password for {username} on {artifactory}:"
            ))
            .without_confirmation()
            .prompt()?;
            Ok((username, password))
        })
        .await
        .map_err(|e| TasksError::Prompt(e.to_string()))??;

        let token = encrypted_password(
            &self.client,
            &ctx.settings().encrypted_password_url(),
            &username,
            &password,
        )
        .await?;

        Ok(Credentials { username, token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::OutputManager;
    use crate::settings::SettingsBuilder;

    #[test]
    fn message_points_at_profile_page() {
        let ctx = TaskContext::new(
            SettingsBuilder::new().build().unwrap(),
            OutputManager::default(),
        );
        let message = password_message(&ctx);
        assert!(message.contains("http://artifactory.dlogics.com:8081/artifactory/webapp/#/profile"));
        assert!(message.contains("Encrypted Password."));
    }

    #[tokio::test]
    async fn exchange_reports_connection_errors() {
        let client = reqwest::Client::new();
        // Nothing listens on port 9 (discard) on test machines.
        let result = encrypted_password(&client, "http://127.0.0.1:9/", "u", "p").await;
        assert!(matches!(result, Err(TasksError::Http(_))));
    }
}
