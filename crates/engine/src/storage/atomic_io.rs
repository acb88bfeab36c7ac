use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Writes through a sibling temp file and renames it over `path`, so readers
/// see either the previous contents or the new ones.
pub(crate) fn write_text_atomic(path: &Path, text: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let staging = staging_path_for(path);
    if let Err(error) = fs::write(&staging, text).and_then(|()| swap_into_place(&staging, path)) {
        let _ = fs::remove_file(&staging);
        return Err(error);
    }
    Ok(())
}

fn swap_into_place(staging: &Path, target: &Path) -> io::Result<()> {
    match fs::rename(staging, target) {
        Ok(()) => Ok(()),
        // Some platforms refuse to rename over an existing file.
        Err(_) if cfg!(windows) && target.exists() => {
            fs::remove_file(target)?;
            fs::rename(staging, target)
        }
        Err(error) => Err(error),
    }
}

fn staging_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "entry".to_string());
    path.with_file_name(format!(".{name}.partial"))
}
