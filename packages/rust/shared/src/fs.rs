//! UTF-8 text file helpers shared by the input and output sides.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CvAssistError, Result};

/// Read a UTF-8 text file.
///
/// A missing file is reported as [`CvAssistError::NotFound`]; anything else
/// as [`CvAssistError::Io`].
pub fn read_text(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            CvAssistError::not_found(format!("File not found: {}", path.display()))
        } else {
            CvAssistError::io(path, e)
        }
    })
}

/// Write `content` to `path`, creating parent directories.
///
/// The content goes to a hidden temporary sibling first and is renamed into
/// place, so readers never observe a half-written file.
pub fn write_text(content: &str, path: &Path) -> Result<PathBuf> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir).map_err(|e| CvAssistError::io(dir, e))?;
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| CvAssistError::config(format!("not a file path: {}", path.display())))?;
    let mut temp_name = std::ffi::OsString::from(".");
    temp_name.push(file_name);
    temp_name.push(".tmp");
    let temp = path.with_file_name(temp_name);

    std::fs::write(&temp, content).map_err(|e| CvAssistError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| CvAssistError::io(path, e))?;

    debug!(path = %path.display(), bytes = content.len(), "wrote file");
    Ok(path.to_path_buf())
}

/// Append an extension to a path without touching dots already in the name.
///
/// `with_suffix("out/Jane - cv (Acme Inc.)", "md")` gives
/// `out/Jane - cv (Acme Inc.).md`, where `Path::with_extension` would not.
pub fn with_suffix(base: &Path, extension: &str) -> PathBuf {
    let mut s = base.as_os_str().to_owned();
    s.push(".");
    s.push(extension);
    PathBuf::from(s)
}
