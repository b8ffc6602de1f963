// src/auth.rs
//! Cloud login: stored credentials first, the terminal second, persistence last.

use std::io::{self, BufRead, Write};

use crate::{
    credentials::{Credential, CredentialVault},
    devices::DeviceRecord,
    error::{FanPadError, Result},
    output::Reporter,
};

// --- Collaborators ---

/// An authenticated handle to the cloud account.
pub trait CloudSession {
    fn list_devices(&self) -> Result<Vec<DeviceRecord>>;
}

/// The cloud account service.
pub trait CloudAuth {
    /// Returns [`FanPadError::AccessDenied`] when the service rejects the credentials.
    fn authenticate(&self, username: &str, password: &str) -> Result<Box<dyn CloudSession>>;
}

/// Source of credentials typed in by the user.
pub trait CredentialPrompt {
    fn username(&mut self) -> Result<String>;
    /// Must not echo the input.
    fn password(&mut self) -> Result<String>;
}

/// Reads the username from stdin and the password without echo.
pub struct TerminalPrompt;

impl CredentialPrompt for TerminalPrompt {
    fn username(&mut self) -> Result<String> {
        read_username(&mut io::stdin().lock(), &mut io::stdout())
    }

    fn password(&mut self) -> Result<String> {
        Ok(rpassword::prompt_password("Password: ")?)
    }
}

fn read_username<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "Username: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(FanPadError::InvalidInput(
            "no username entered before end of input".to_string(),
        ));
    }
    Ok(line.trim().to_string())
}

// --- Login ---

pub enum LoginOutcome {
    Authenticated(Box<dyn CloudSession>),
    /// The service refused the credentials; nothing was written.
    Denied,
}

pub struct Authenticator<'a> {
    vault: &'a mut dyn CredentialVault,
    cloud: &'a dyn CloudAuth,
    prompt: &'a mut dyn CredentialPrompt,
    reporter: &'a mut dyn Reporter,
}

impl<'a> Authenticator<'a> {
    pub fn new(
        vault: &'a mut dyn CredentialVault,
        cloud: &'a dyn CloudAuth,
        prompt: &'a mut dyn CredentialPrompt,
        reporter: &'a mut dyn Reporter,
    ) -> Self {
        Self {
            vault,
            cloud,
            prompt,
            reporter,
        }
    }

    /// Logs in, persisting the credential only if it was typed in and the login succeeded.
    pub fn login(&mut self) -> Result<LoginOutcome> {
        let stored = self.vault.load()?;
        if stored.migrated {
            self.reporter
                .notice("Stored password was not encrypted. It has been encrypted in place.");
        }

        let (credential, fresh) = match stored.complete() {
            Some(credential) => (credential, false),
            None => {
                self.reporter.notice(
                    "Username and/or password not found in TOML file. \
                     Please enter your MiCloud credentials.",
                );
                let username = match stored.username {
                    Some(username) => username,
                    None => self.prompt.username()?,
                };
                let password = match stored.password {
                    Some(password) => password,
                    None => self.prompt.password()?,
                };
                (Credential::new(username, password), true)
            }
        };

        let session = match self
            .cloud
            .authenticate(&credential.username, credential.password())
        {
            Ok(session) => session,
            Err(FanPadError::AccessDenied) => {
                tracing::warn!(username = %credential.username, "cloud login denied");
                self.reporter.failure(
                    "Access denied. Did you set the correct username and/or password?",
                );
                return Ok(LoginOutcome::Denied);
            }
            Err(e) => return Err(e),
        };
        tracing::info!(username = %credential.username, "logged in to cloud account");

        if fresh {
            self.vault.save(&credential)?;
        }

        Ok(LoginOutcome::Authenticated(session))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn username_is_trimmed() {
        let mut output = Vec::new();
        let username = read_username(&mut "  alice@example.com \n".as_bytes(), &mut output).unwrap();
        assert_eq!(username, "alice@example.com");
        assert_eq!(output, b"Username: ");
    }

    #[test]
    fn end_of_input_is_not_an_empty_username() {
        let result = read_username(&mut "".as_bytes(), &mut Vec::new());
        assert!(matches!(result, Err(FanPadError::InvalidInput(_))));
    }
}
