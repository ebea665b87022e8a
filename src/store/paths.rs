//! Path resolution and file identity normalization.

use std::path::{Path, PathBuf};

/// Extension recorded for files that carry none.
pub const DEFAULT_FILE_TYPE: &str = ".ini";

/// Returns the registry identity for a file name: directory plus the base
/// name with its last extension removed.
///
/// `app.ini` and `app.cfg` share the identity `app`.
pub fn identity(file_name: &Path) -> String {
    file_name.with_extension("").to_string_lossy().into_owned()
}

/// Returns the last extension of a file name including its leading dot.
pub fn file_type(file_name: &Path) -> String {
    file_name
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_else(|| DEFAULT_FILE_TYPE.to_string())
}

/// Returns the directory containing the running executable.
pub fn executable_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
}

/// Resolves a config file path to a readable file.
///
/// The path is tried as given first. A relative path that does not resolve
/// is retried against `fallback_dir`.
pub fn resolve(path: &Path, fallback_dir: Option<&Path>) -> Option<PathBuf> {
    if path.is_file() {
        return Some(path.to_path_buf());
    }

    if path.is_absolute() {
        return None;
    }

    fallback_dir
        .map(|dir| dir.join(path))
        .filter(|candidate| candidate.is_file())
}
