use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::config::PackagePaths;

/// Temp path next to `path` (same directory, so the final rename stays on one filesystem).
pub fn temp_path_for(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_else(|| PackagePaths::get().cache_filename());
    path.parent()
        .unwrap_or(Path::new("."))
        .join(format!("{name}.tmp"))
}

/// Rename `temp_path` over `final_path`. On failure the temp file is removed and the
/// destination keeps whatever it had before.
pub fn rename_temp_to_final(temp_path: &Path, final_path: &Path) -> Result<()> {
    if let Err(e) = fs::rename(temp_path, final_path) {
        let _ = fs::remove_file(temp_path);
        return Err(e).with_context(|| {
            format!(
                "atomic rename temp cache to final path ({} -> {})",
                temp_path.display(),
                final_path.display()
            )
        });
    }
    Ok(())
}
