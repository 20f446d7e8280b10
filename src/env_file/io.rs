// envtunnel: Tunnel a local port and patch its public URL into .env
//
// SPDX-FileCopyrightText: 2026 Romeo Ahmed
// SPDX-License-Identifier: GPL-3.0-or-later

//! Loading and atomically saving env files.
//!
//! ```text
//! save(doc, path)
//!   resolve symlinks in path
//!   temp file in the target's directory (0o666 under umask)
//!   write render() + sync
//!   copy permissions of the old file (if any)
//!   persist(target)  --> rename over target
//! ```

use std::io::{ErrorKind, Write as _};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, trace, warn};

use super::EnvDocument;
use crate::error::{EnvFileError, EnvFileResult};

/// Loads the env file at `path`.
///
/// A missing file yields an empty document.
///
/// # Errors
///
/// Returns [`EnvFileError::Read`] if the file exists but cannot be read as
/// UTF-8 text.
pub fn load(path: &Path) -> EnvFileResult<EnvDocument> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let doc = EnvDocument::parse(&content);
            debug!(
                path = %path.display(),
                entries = doc.len(),
                skipped = doc.skipped_lines(),
                "loaded env file"
            );
            Ok(doc)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!(path = %path.display(), "env file not found, starting empty");
            Ok(EnvDocument::new())
        }
        Err(source) => Err(EnvFileError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Replaces the file at `path` with the rendered document.
///
/// The content goes to a temporary file next to `path` that is then renamed
/// over it, so readers see either the old or the new file. A symlinked
/// `path` stays a symlink and its target is replaced. A new file gets the
/// same mode as any file created under the current umask.
///
/// # Errors
///
/// Returns [`EnvFileError::Write`] if the directory is missing or not
/// writable, or if the rename fails.
pub fn save(doc: &EnvDocument, path: &Path) -> EnvFileResult<()> {
    let write_err = |source: std::io::Error| EnvFileError::Write {
        path: path.to_path_buf(),
        source,
    };

    if doc.skipped_lines() > 0 {
        warn!(
            path = %path.display(),
            lines = doc.skipped_lines(),
            "lines that are not KEY=VALUE pairs will not be written back"
        );
    }

    let target = resolve_target(path);
    let parent = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = new_temp_file(parent).map_err(write_err)?;
    tmp.write_all(doc.render().as_bytes()).map_err(write_err)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    if let Ok(meta) = std::fs::metadata(&target) {
        tmp.as_file()
            .set_permissions(meta.permissions())
            .map_err(write_err)?;
    }

    trace!(
        tmp = %tmp.path().display(),
        target = %target.display(),
        "persisting env file"
    );
    tmp.persist(&target).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), entries = doc.len(), "saved env file");
    Ok(())
}

/// Follows symlinks so the link itself is never replaced.
fn resolve_target(path: &Path) -> PathBuf {
    match std::fs::canonicalize(path) {
        Ok(resolved) => {
            if resolved != path {
                trace!(
                    path = %path.display(),
                    resolved = %resolved.display(),
                    "resolved env file path"
                );
            }
            resolved
        }
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(unix)]
fn new_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    use std::os::unix::fs::PermissionsExt as _;

    // The mode is applied at open(2), so the umask still masks it.
    tempfile::Builder::new()
        .permissions(std::fs::Permissions::from_mode(0o666))
        .tempfile_in(dir)
}

#[cfg(not(unix))]
fn new_temp_file(dir: &Path) -> std::io::Result<NamedTempFile> {
    NamedTempFile::new_in(dir)
}
