// src/error.rs
use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures that leave the current operation unable to continue.
///
/// Guard refusals on the fan (power off, bound reached, oscillation conflict)
/// are not errors and never show up here; see [`crate::fan::Outcome`].
#[derive(Debug, Error)]
pub enum FanPadError {
    /// Stored ciphertext could not be decrypted with the current key.
    #[error("failed to decrypt the password: {0}")]
    Decryption(String),
    /// The cloud account service rejected the credentials.
    #[error("access denied")]
    AccessDenied,
    /// The cloud service or the fan could not be reached.
    #[error("transport error: {0}")]
    Transport(String),
    /// The cipher key file exists but is not usable.
    #[error("invalid key file {}: {reason}", path.display())]
    KeyFile { path: PathBuf, reason: String },
    /// The configuration document is structurally wrong.
    #[error("configuration error: {0}")]
    Config(String),
    /// User input could not be interpreted.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// The account has no device reachable on the local network.
    #[error("no online devices found")]
    NoOnlineDevices,
    /// Terminal setup or event read failed.
    #[error("terminal error: {0}")]
    Terminal(String),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    TomlParse(#[from] toml::de::Error),
    #[error(transparent)]
    TomlWrite(#[from] toml::ser::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl FanPadError {
    /// Process exit status for this failure.
    ///
    /// Denied authentication is a normal user outcome and exits cleanly.
    pub fn exit_code(&self) -> u8 {
        match self {
            FanPadError::AccessDenied => 0,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, FanPadError>;
