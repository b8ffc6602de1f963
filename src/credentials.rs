// src/credentials.rs
//! Cloud account credentials and their encrypted home in the config document.

use std::{fmt, path::PathBuf};

use toml::Value;

use crate::{
    cipher::PasswordCipher,
    config::{CREDENTIALS_SECTION, ConfigDocument},
    error::{FanPadError, Result},
};

const USERNAME_KEY: &str = "username";
const PASSWORD_KEY: &str = "password";

// --- Data Structures ---

#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub username: String,
    password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Whatever the store could recover; either half may be missing.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct StoredCredential {
    pub username: Option<String>,
    pub password: Option<String>,
    /// Set when the stored password was legacy plaintext and has just been re-encrypted.
    pub migrated: bool,
}

impl StoredCredential {
    pub fn is_complete(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }

    /// Both halves as a [`Credential`], if present.
    pub fn complete(&self) -> Option<Credential> {
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => Some(Credential::new(username, password)),
            _ => None,
        }
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoredCredential")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("migrated", &self.migrated)
            .finish()
    }
}

/// Durable storage for the account credential.
pub trait CredentialVault {
    fn load(&mut self) -> Result<StoredCredential>;
    fn save(&mut self, credential: &Credential) -> Result<()>;
}

// --- Store ---

/// Keeps `[credentials]` in the config document, password always encrypted at rest.
pub struct CredentialStore {
    config_path: PathBuf,
    cipher: PasswordCipher,
}

impl CredentialStore {
    pub fn new(config_path: impl Into<PathBuf>, cipher: PasswordCipher) -> Self {
        Self {
            config_path: config_path.into(),
            cipher,
        }
    }

    /// Re-encrypts a password that was found stored as plaintext and persists it.
    fn migrate_legacy_password(&self, mut doc: ConfigDocument, plaintext: &str) -> Result<()> {
        let encrypted = self.cipher.encrypt(plaintext)?;
        doc.set(CREDENTIALS_SECTION, PASSWORD_KEY, Value::String(encrypted));
        doc.save()
    }

    fn read_stored_password(&self) -> Result<Option<String>> {
        let doc = ConfigDocument::load(&self.config_path)?;
        Ok(stored_field(&doc, PASSWORD_KEY))
    }
}

impl CredentialVault for CredentialStore {
    /// Loads and decrypts the stored credential.
    ///
    /// A password that fails to decrypt is taken as legacy plaintext: it is
    /// encrypted, written back, and read once more. If the rewritten value still
    /// does not decrypt the failure is returned; there is no second attempt.
    fn load(&mut self) -> Result<StoredCredential> {
        let doc = ConfigDocument::load(&self.config_path)?;
        let username = stored_field(&doc, USERNAME_KEY);
        let Some(raw_password) = stored_field(&doc, PASSWORD_KEY) else {
            return Ok(StoredCredential {
                username,
                password: None,
                migrated: false,
            });
        };

        match self.cipher.decrypt(&raw_password) {
            Ok(password) => Ok(StoredCredential {
                username,
                password: Some(password),
                migrated: false,
            }),
            Err(FanPadError::Decryption(reason)) => {
                tracing::warn!(
                    path = %self.config_path.display(),
                    %reason,
                    "stored password is not encrypted, re-encrypting it"
                );
                self.migrate_legacy_password(doc, &raw_password)?;

                let rewritten = self.read_stored_password()?.ok_or_else(|| {
                    FanPadError::Decryption("password missing after re-encryption".to_string())
                })?;
                let password = self.cipher.decrypt(&rewritten)?;

                Ok(StoredCredential {
                    username,
                    password: Some(password),
                    migrated: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Read-merge-write: only the two credential keys change, every other section survives.
    fn save(&mut self, credential: &Credential) -> Result<()> {
        let mut doc = ConfigDocument::load(&self.config_path)?;
        let encrypted = self.cipher.encrypt(credential.password())?;

        doc.set(
            CREDENTIALS_SECTION,
            USERNAME_KEY,
            Value::String(credential.username.clone()),
        );
        doc.set(CREDENTIALS_SECTION, PASSWORD_KEY, Value::String(encrypted));
        doc.save()?;

        tracing::info!(
            path = %self.config_path.display(),
            username = %credential.username,
            "saved credentials"
        );
        Ok(())
    }
}

fn stored_field(doc: &ConfigDocument, key: &str) -> Option<String> {
    doc.get_str(CREDENTIALS_SECTION, key)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}
