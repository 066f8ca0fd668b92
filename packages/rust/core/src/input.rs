//! Input resolution: explicit names, search directories, and most-recent
//! fallbacks for CVs and job descriptions.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, info, warn};

use cvassist_shared::fs::read_text;
use cvassist_shared::{CvAssistError, Result, SourceDocument};

/// Most recently modified regular file in `dir`.
///
/// `extension` filters by case-insensitive suffix, with or without the
/// leading dot. Returns `None` for an empty or missing directory.
pub fn find_latest_file(dir: &Path, extension: Option<&str>) -> Option<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(dir = %dir.display(), error = %e, "directory not found");
            return None;
        }
    };

    let wanted = extension.map(|e| e.trim_start_matches('.').to_lowercase());

    let mut best: Option<(SystemTime, PathBuf)> = None;
    for entry in entries.flatten() {
        let path = entry.path();
        let Ok(meta) = entry.metadata() else { continue };
        if !meta.is_file() {
            continue;
        }
        if let Some(wanted) = &wanted {
            let ext = path
                .extension()
                .map(|e| e.to_string_lossy().to_lowercase())
                .unwrap_or_default();
            if &ext != wanted {
                continue;
            }
        }
        let modified = meta.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        // Strictly newer only, so ties keep enumeration order.
        if best.as_ref().is_none_or(|(t, _)| modified > *t) {
            best = Some((modified, path));
        }
    }

    best.map(|(_, path)| path)
}

/// Locate `name` as given, then by its final component inside each of `dirs`.
pub fn find_file(name: &str, dirs: &[&Path]) -> Option<PathBuf> {
    let direct = PathBuf::from(name);
    if direct.is_file() {
        return Some(direct);
    }

    let file_name = direct.file_name()?;
    dirs.iter()
        .map(|dir| dir.join(file_name))
        .find(|candidate| candidate.is_file())
}

/// Resolve and read one input document.
///
/// `kind` only shapes log and error messages ("CV", "job description").
pub fn resolve(
    kind: &str,
    explicit: Option<&str>,
    search_dir: &Path,
    extension: Option<&str>,
) -> Result<SourceDocument> {
    let path = match explicit {
        Some(name) => {
            let path = find_file(name, &[search_dir])
                .ok_or_else(|| CvAssistError::not_found(format!("{kind} file not found: {name}")))?;
            info!(path = %path.display(), "using {kind} file");
            path
        }
        None => {
            let path = find_latest_file(search_dir, extension).ok_or_else(|| {
                CvAssistError::not_found(format!(
                    "No {kind} files found in {}",
                    search_dir.display()
                ))
            })?;
            info!(path = %path.display(), "using most recent {kind}");
            path
        }
    };

    let text = read_text(&path)?;
    debug!(path = %path.display(), chars = text.chars().count(), "{kind} loaded");
    Ok(SourceDocument { path, text })
}
