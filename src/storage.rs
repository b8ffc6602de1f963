// src/storage.rs
use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Unix mode for files holding credentials or key material.
pub const PRIVATE_FILE_MODE: u32 = 0o600;

/// Writes `bytes` to `path` atomically using a temporary file in the same directory.
///
/// The temporary file gets private permissions before it is renamed over the target.
pub fn write_private_atomic(path: &Path, bytes: &[u8]) -> Result<(), io::Error> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    // Write to a temporary file first
    let temp_path = temp_path_for(path)?;
    let file = File::create(&temp_path)?;
    set_private_permissions(&temp_path)?;
    let mut writer = BufWriter::new(file);
    writer.write_all(bytes)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);

    // Atomically rename the temp file to the target file
    fs::rename(&temp_path, path)?;
    Ok(())
}

/// `<file name>.tmp` in the same directory; never equal to `path` itself.
fn temp_path_for(path: &Path) -> Result<PathBuf, io::Error> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("no file name in {}", path.display()),
        )
    })?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    Ok(path.with_file_name(temp_name))
}

fn set_private_permissions(path: &Path) -> Result<(), io::Error> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(PRIVATE_FILE_MODE))?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
