//! Tidying of the managed resources tree.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::tree::remove_path;

/// Remove empty directories from `path`'s parent upwards, stopping before
/// `stop_at`. Returns the directories removed.
pub fn prune_empty_parents(path: &Path, stop_at: &Path) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    let mut current = path.parent();

    while let Some(dir) = current {
        if dir == stop_at || !dir.starts_with(stop_at) {
            break;
        }
        let mut entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                current = dir.parent();
                continue;
            }
            Err(err) => return Err(err),
        };
        if entries.next().is_some() {
            break;
        }
        fs::remove_dir(dir)?;
        removed.push(dir.to_path_buf());
        current = dir.parent();
    }

    Ok(removed)
}

/// Remove every entry under `root` that is not a claimed path or an ancestor
/// of one. Top-level names in `keep` (support files, the registry manifest)
/// are left alone. Returns the removed paths.
pub fn sweep_unclaimed(
    root: &Path,
    claimed: &BTreeSet<PathBuf>,
    keep: &[OsString],
) -> io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    if !root.is_dir() {
        return Ok(removed);
    }
    sweep_dir(root, root, claimed, keep, &mut removed)?;
    Ok(removed)
}

fn sweep_dir(
    dir: &Path,
    root: &Path,
    claimed: &BTreeSet<PathBuf>,
    keep: &[OsString],
    removed: &mut Vec<PathBuf>,
) -> io::Result<()> {
    let mut entries: Vec<_> = fs::read_dir(dir)?.collect::<Result<Vec<_>, _>>()?;
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if dir == root && keep.iter().any(|name| *name == entry.file_name()) {
            continue;
        }
        if claimed.contains(&path) {
            continue;
        }
        let is_real_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if is_real_dir && claimed.iter().any(|c| c.starts_with(&path)) {
            sweep_dir(&path, root, claimed, keep, removed)?;
            continue;
        }
        remove_path(&path)?;
        removed.push(path);
    }
    Ok(())
}
