use std::{fs, path::Path};

use fanpad::{
    FanPadError,
    cipher::{KEY_LEN, PasswordCipher},
    config::{ConfigDocument, CREDENTIALS_SECTION, GENERAL_SECTION},
    credentials::{Credential, CredentialStore, CredentialVault},
};
use toml::Value;

fn store_at(config_path: &Path) -> CredentialStore {
    let key_path = config_path.with_file_name(".key");
    let cipher = PasswordCipher::load_or_generate(key_path).unwrap();
    CredentialStore::new(config_path, cipher)
}

fn stored_password(config_path: &Path) -> String {
    ConfigDocument::load(config_path)
        .unwrap()
        .get_str(CREDENTIALS_SECTION, "password")
        .unwrap()
        .to_string()
}

#[test]
fn missing_config_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    let stored = store_at(&config_path).load().unwrap();

    assert_eq!(stored.username, None);
    assert_eq!(stored.password, None);
    assert!(!stored.migrated);
    assert!(!config_path.exists());
}

#[test]
fn save_then_load_returns_same_credential() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let mut store = store_at(&config_path);

    store.save(&Credential::new("alice@example.com", "correct horse")).unwrap();
    let stored = store.load().unwrap();

    assert_eq!(
        stored.complete(),
        Some(Credential::new("alice@example.com", "correct horse"))
    );
    assert!(!stored.migrated);
}

#[test]
fn saved_password_is_never_plaintext() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");

    store_at(&config_path)
        .save(&Credential::new("alice", "correct horse"))
        .unwrap();

    let raw = fs::read_to_string(&config_path).unwrap();
    assert!(raw.contains("alice"));
    assert!(!raw.contains("correct horse"));
}

#[test]
fn save_preserves_unrelated_sections() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[general]\ndebug = true\n\n[simulator]\nusername = \"alice\"\n",
    )
    .unwrap();

    store_at(&config_path)
        .save(&Credential::new("alice", "pw"))
        .unwrap();

    let doc = ConfigDocument::load(&config_path).unwrap();
    assert_eq!(
        doc.section(GENERAL_SECTION).unwrap().get("debug"),
        Some(&Value::Boolean(true))
    );
    assert_eq!(doc.get_str("simulator", "username"), Some("alice"));
    assert_eq!(doc.get_str(CREDENTIALS_SECTION, "username"), Some("alice"));
}

#[test]
fn legacy_plaintext_password_is_migrated_once() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(
        &config_path,
        "[general]\ndebug = false\n\n[credentials]\nusername = \"alice\"\npassword = \"hunter2\"\n",
    )
    .unwrap();
    let mut store = store_at(&config_path);

    let first = store.load().unwrap();
    assert_eq!(first.password.as_deref(), Some("hunter2"));
    assert!(first.migrated);

    let rewritten = stored_password(&config_path);
    assert_ne!(rewritten, "hunter2");
    let doc = ConfigDocument::load(&config_path).unwrap();
    assert_eq!(
        doc.section(GENERAL_SECTION).unwrap().get("debug"),
        Some(&Value::Boolean(false))
    );

    let second = store.load().unwrap();
    assert_eq!(second.password.as_deref(), Some("hunter2"));
    assert!(!second.migrated);
    assert_eq!(stored_password(&config_path), rewritten);
}

#[test]
fn password_from_lost_key_is_treated_as_legacy_value() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    let foreign = PasswordCipher::from_key([42u8; KEY_LEN])
        .encrypt("pw")
        .unwrap();
    fs::write(
        &config_path,
        format!("[credentials]\nusername = \"alice\"\npassword = \"{}\"\n", foreign),
    )
    .unwrap();

    let stored = store_at(&config_path).load().unwrap();

    // The old ciphertext cannot be recovered; it becomes the (wrong) password and login will fail.
    assert_eq!(stored.password.as_deref(), Some(foreign.as_str()));
    assert!(stored.migrated);
}

#[test]
fn username_without_password_loads_partially() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[credentials]\nusername = \"alice\"\npassword = \"\"\n").unwrap();

    let stored = store_at(&config_path).load().unwrap();

    assert_eq!(stored.username.as_deref(), Some("alice"));
    assert_eq!(stored.password, None);
    assert!(!stored.is_complete());
}

#[test]
fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.toml");
    fs::write(&config_path, "[credentials\nusername = ").unwrap();

    let err = store_at(&config_path).load().unwrap_err();
    assert!(matches!(err, FanPadError::TomlParse(_)));
}
