// src/config.rs
//! The TOML configuration document shared by settings, credentials and the simulator.
//!
//! The document is kept as a raw [`toml::Table`] so that rewriting one section
//! never drops the others.

use std::{
    fs,
    io,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use toml::{Table, Value};

use crate::{error::Result, storage::write_private_atomic};

pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const KEY_FILE_NAME: &str = ".key";
pub const LOG_FILE_NAME: &str = "fanpad.log";

pub const GENERAL_SECTION: &str = "general";
pub const CREDENTIALS_SECTION: &str = "credentials";
pub const SIMULATOR_SECTION: &str = "simulator";

// --- Config Location ---

/// Finds the configuration file: explicit path, then the user config dir, then `./config.toml`.
///
/// Always yields a path. When neither default exists the user config dir is
/// chosen, and the first successful login creates the file there.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> PathBuf {
    let user_config_path = ProjectDirs::from("com", "fanpad", "fanpad")
        .map(|proj_dirs| proj_dirs.config_dir().join(CONFIG_FILE_NAME));
    select_config_path(explicit, user_config_path, PathBuf::from(CONFIG_FILE_NAME))
}

fn select_config_path(
    explicit: Option<PathBuf>,
    user_config_path: Option<PathBuf>,
    current_dir_path: PathBuf,
) -> PathBuf {
    if let Some(path) = explicit {
        return path;
    }

    // Check user config directory
    if let Some(path) = user_config_path.as_ref().filter(|p| p.exists()) {
        return path.clone();
    }

    // Check current directory
    if current_dir_path.exists() {
        return current_dir_path;
    }

    user_config_path.unwrap_or(current_dir_path)
}

/// Cipher key location: next to the configuration file.
pub fn key_path_for(config_path: &Path) -> PathBuf {
    sibling_of(config_path, KEY_FILE_NAME)
}

pub fn log_path_for(config_path: &Path) -> PathBuf {
    sibling_of(config_path, LOG_FILE_NAME)
}

fn sibling_of(config_path: &Path, file_name: &str) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.join(file_name),
        _ => PathBuf::from(file_name),
    }
}

// --- Document ---

#[derive(Debug, Clone)]
pub struct ConfigDocument {
    path: PathBuf,
    table: Table,
}

impl ConfigDocument {
    /// Reads the document at `path`; a missing file is an empty document.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let table = match fs::read_to_string(&path) {
            Ok(contents) => toml::from_str::<Table>(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Table::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, table })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    pub fn section(&self, name: &str) -> Option<&Table> {
        self.table.get(name).and_then(Value::as_table)
    }

    pub fn get_str(&self, section: &str, key: &str) -> Option<&str> {
        self.section(section)?.get(key)?.as_str()
    }

    /// Sets `section.key`, creating the section and replacing a non-table value of the same name.
    pub fn set(&mut self, section: &str, key: &str, value: Value) {
        let entry = self
            .table
            .entry(section.to_string())
            .or_insert(Value::Table(Table::new()));
        if !entry.is_table() {
            *entry = Value::Table(Table::new());
        }
        if let Value::Table(table) = entry {
            table.insert(key.to_string(), value);
        }
    }

    pub fn save(&self) -> Result<()> {
        let contents = toml::to_string_pretty(&self.table)?;
        write_private_atomic(&self.path, contents.as_bytes())?;
        Ok(())
    }
}

// --- General Settings ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneralSettings {
    pub debug: bool,
    pub color: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            debug: false,
            color: true,
        }
    }
}

impl GeneralSettings {
    /// Reads `[general]`, falling back to defaults and collecting a warning for each fallback.
    pub fn from_document(doc: &ConfigDocument) -> (Self, Vec<String>) {
        let mut warnings = Vec::new();
        let mut settings = Self::default();

        if !doc.exists() {
            warnings.push("Configuration file not found. Defaulting to False.".to_string());
            return (settings, warnings);
        }

        let general = doc.section(GENERAL_SECTION);
        match general.and_then(|g| g.get("debug")) {
            None => warnings.push(
                "No value for debug mode setting found in TOML file. Defaulting to False."
                    .to_string(),
            ),
            Some(Value::Boolean(debug)) => settings.debug = *debug,
            Some(_) => warnings
                .push("Invalid value for debug mode setting. Defaulting to False.".to_string()),
        }

        match general.and_then(|g| g.get("color")) {
            None => {}
            Some(Value::Boolean(color)) => settings.color = *color,
            Some(_) => warnings
                .push("Invalid value for color setting. Defaulting to True.".to_string()),
        }

        (settings, warnings)
    }
}
