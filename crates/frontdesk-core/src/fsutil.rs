//! Small filesystem helpers shared by the file-backed stores.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use frontdesk_contracts::{FrontDeskError, FrontDeskResult};

/// Create the parent directory of `path` if it has one and it is missing.
pub fn ensure_parent(path: &Path) -> FrontDeskResult<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| FrontDeskError::io(dir, e))
        }
        _ => Ok(()),
    }
}

/// Replace the contents of `path` with `contents` in one step.
///
/// Writes a sibling temp file, syncs it, then renames it over `path`.
/// Readers see either the old file or the new one, never a mix.
pub fn write_atomic(path: &Path, contents: &str) -> FrontDeskResult<()> {
    ensure_parent(path)?;
    let tmp = temp_sibling(path);

    let mut file = File::create(&tmp).map_err(|e| FrontDeskError::io(&tmp, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| FrontDeskError::io(&tmp, e))?;
    file.sync_all().map_err(|e| FrontDeskError::io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| FrontDeskError::io(path, e))
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
