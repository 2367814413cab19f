//! Directory copy and removal helpers.

use anyhow::Context;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Recursively copy the contents of `src` into `dst`.
///
/// `dst` must already exist. Symlinks in the source are followed so the
/// copy holds real files. Existing files in `dst` are overwritten.
pub fn copy_tree(src: &Path, dst: &Path) -> anyhow::Result<()> {
    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read dir: {}", src.display()))?
    {
        let entry =
            entry.with_context(|| format!("Failed to read dir entry: {}", src.display()))?;
        let from = entry.path();
        let to = dst.join(entry.file_name());
        let meta = fs::metadata(&from)
            .with_context(|| format!("Failed to stat dir entry: {}", from.display()))?;

        if meta.is_dir() {
            fs::create_dir_all(&to)
                .with_context(|| format!("Failed to create directory: {}", to.display()))?;
            copy_tree(&from, &to)?;
        } else if meta.is_file() {
            fs::copy(&from, &to).with_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    from.display(),
                    to.display()
                )
            })?;
        } else {
            anyhow::bail!("Unsupported filesystem entry type at {}", from.display());
        }
    }
    Ok(())
}

/// Remove whatever is at `path` without following symlinks.
pub fn remove_path(path: &Path) -> io::Result<()> {
    let meta = fs::symlink_metadata(path)?;
    if meta.file_type().is_symlink() {
        remove_symlink(path)
    } else if meta.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
}

/// Remove `path` if present. Returns whether anything was removed.
pub fn remove_path_if_exists(path: &Path) -> io::Result<bool> {
    match remove_path(path) {
        Ok(()) => Ok(true),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(err) => Err(err),
    }
}

/// Unlink a symlink. Directory symlinks on Windows need `remove_dir`.
pub fn remove_symlink(path: &Path) -> io::Result<()> {
    #[cfg(windows)]
    {
        fs::remove_file(path).or_else(|_| fs::remove_dir(path))
    }

    #[cfg(not(windows))]
    {
        fs::remove_file(path)
    }
}

/// Whether `path` itself is a symlink (dangling links included).
pub fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false)
}

/// Whether anything, including a dangling symlink, exists at `path`.
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// First ancestor of `path` strictly below `stop_at` that is a symlink.
pub fn symlinked_ancestor(path: &Path, stop_at: &Path) -> Option<PathBuf> {
    path.ancestors()
        .skip(1)
        .take_while(|dir| *dir != stop_at && dir.starts_with(stop_at))
        .find(|dir| is_symlink(dir))
        .map(Path::to_path_buf)
}

/// Whether `path` would end up inside `dir` once links in its parent
/// directories are followed. The final component itself is not resolved,
/// so an existing link at `path` does not count.
pub fn resolves_within(path: &Path, dir: &Path) -> io::Result<bool> {
    let dir = fs::canonicalize(dir)?;
    let Some(name) = path.file_name() else {
        return Ok(false);
    };

    let mut missing = vec![name.to_os_string()];
    let mut existing = path.parent();
    while let Some(current) = existing {
        match fs::canonicalize(current) {
            Ok(resolved) => {
                let location = missing
                    .iter()
                    .rev()
                    .fold(resolved, |acc, part| acc.join(part));
                return Ok(location.starts_with(&dir));
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                match current.file_name() {
                    Some(part) => missing.push(part.to_os_string()),
                    None => return Ok(false),
                }
                existing = current.parent();
            }
            Err(err) => return Err(err),
        }
    }
    Ok(false)
}

/// Pick an unused hidden sibling of `dst` to stage a replacement in.
pub fn unique_temp_path(dst: &Path) -> anyhow::Result<PathBuf> {
    let parent = dst
        .parent()
        .ok_or_else(|| anyhow::anyhow!("Destination path has no parent: {}", dst.display()))?;
    let base = dst
        .file_name()
        .ok_or_else(|| anyhow::anyhow!("Destination path has no filename: {}", dst.display()))?;

    for attempt in 0u32..1000 {
        let name = if attempt == 0 {
            format!(".{}.tmp.{}", base.to_string_lossy(), std::process::id())
        } else {
            format!(
                ".{}.tmp.{}.{}",
                base.to_string_lossy(),
                std::process::id(),
                attempt
            )
        };
        let candidate = parent.join(name);
        if !entry_exists(&candidate) {
            return Ok(candidate);
        }
    }

    anyhow::bail!("Failed to allocate a unique temp path for {}", dst.display());
}

/// Move a staged artifact at `tmp` over `dst`, removing whatever was there.
pub fn replace_with(dst: &Path, tmp: &Path) -> anyhow::Result<()> {
    remove_path_if_exists(dst)
        .with_context(|| format!("Failed to remove existing target: {}", dst.display()))?;
    fs::rename(tmp, dst).with_context(|| {
        format!(
            "Failed to move temp path {} into {}",
            tmp.display(),
            dst.display()
        )
    })?;
    Ok(())
}
