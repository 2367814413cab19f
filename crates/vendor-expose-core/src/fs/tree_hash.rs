//! Deterministic tree hashing used to detect unchanged copies.
//!
//! A copied exposure is left alone when its tree hash matches the source,
//! so repeated runs do not rewrite identical files.

use anyhow::Context;
use std::fs;
use std::path::Path;

/// Compute deterministic tree hash of a directory
///
/// # Algorithm
/// - Recursive directory traversal, entries sorted by name
/// - Files: `relative_path || 0x00 || content`
/// - Directories: `relative_path || 0xFF`, then children
/// - Output: blake3 hex string
///
/// Symlinks inside the tree are followed, matching how [`copy_tree`] treats
/// them, so a source containing links hashes the same as its copy.
///
/// [`copy_tree`]: crate::fs::copy_tree
///
/// # Example
/// ```no_run
/// use vendor_expose_core::fs::tree_hash::hash_tree;
/// use std::path::Path;
///
/// let hash = hash_tree(Path::new("/path/to/dir"))?;
/// assert_eq!(hash.len(), 64);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn hash_tree(path: &Path) -> anyhow::Result<String> {
    let mut hasher = blake3::Hasher::new();
    hash_dir_recursive(&mut hasher, path, "")?;
    Ok(hasher.finalize().to_hex().to_string())
}

/// Whether two directory trees have identical names and contents.
///
/// Any error while hashing either side counts as a difference.
pub fn trees_match(a: &Path, b: &Path) -> bool {
    match (hash_tree(a), hash_tree(b)) {
        (Ok(left), Ok(right)) => left == right,
        _ => false,
    }
}

fn hash_dir_recursive(hasher: &mut blake3::Hasher, dir: &Path, base: &str) -> anyhow::Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?;

    let mut sorted_entries: Vec<_> = entries
        .collect::<Result<Vec<_>, _>>()
        .with_context(|| format!("Failed to read directory entries: {}", dir.display()))?;
    sorted_entries.sort_by_key(|e| e.file_name());

    for entry in sorted_entries {
        let name = entry.file_name();
        let name_str = name.to_string_lossy();
        let rel_path = if base.is_empty() {
            name_str.to_string()
        } else {
            format!("{}/{}", base, name_str)
        };

        let path = entry.path();
        let meta = fs::metadata(&path)
            .with_context(|| format!("Failed to stat file: {}", path.display()))?;

        if meta.is_dir() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0xFF]);
            hash_dir_recursive(hasher, &path, &rel_path)?;
        } else if meta.is_file() {
            hasher.update(rel_path.as_bytes());
            hasher.update(&[0x00]);
            let content = fs::read(&path)
                .with_context(|| format!("Failed to read file: {}", path.display()))?;
            hasher.update(&content);
        } else {
            anyhow::bail!("Unsupported filesystem entry type: {}", path.display());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("create_dir_all should succeed in test temp dirs");
        }
        fs::write(path, content).expect("write should succeed in test temp dirs");
    }

    #[test]
    fn test_empty_directory_hash() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let hash = hash_tree(tmp.path()).expect("hash_tree should succeed");
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_deterministic_order() {
        let tmp1 = TempDir::new().expect("tempdir should succeed");
        write_file(&tmp1.path().join("a.css"), "content a");
        write_file(&tmp1.path().join("b.css"), "content b");

        let tmp2 = TempDir::new().expect("tempdir should succeed");
        write_file(&tmp2.path().join("b.css"), "content b");
        write_file(&tmp2.path().join("a.css"), "content a");

        assert!(trees_match(tmp1.path(), tmp2.path()));
    }

    #[test]
    fn test_hash_changes_with_content() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let file = tmp.path().join("app.js");
        write_file(&file, "original");
        let hash1 = hash_tree(tmp.path()).expect("hash_tree should succeed");

        write_file(&file, "modified");
        let hash2 = hash_tree(tmp.path()).expect("hash_tree should succeed");
        assert_ne!(hash1, hash2, "Hash should change when content changes");
    }

    #[test]
    fn test_empty_subdirectory_is_significant() {
        let tmp1 = TempDir::new().expect("tempdir should succeed");
        write_file(&tmp1.path().join("a.txt"), "a");
        fs::create_dir(tmp1.path().join("empty")).expect("create_dir should succeed");

        let tmp2 = TempDir::new().expect("tempdir should succeed");
        write_file(&tmp2.path().join("a.txt"), "a");

        assert!(!trees_match(tmp1.path(), tmp2.path()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_file_hashes_like_its_target() {
        let tmp = TempDir::new().expect("tempdir should succeed");
        let real = tmp.path().join("real");
        write_file(&real.join("logo.svg"), "<svg/>");

        let linked = tmp.path().join("linked");
        fs::create_dir_all(&linked).expect("create_dir_all should succeed");
        std::os::unix::fs::symlink(real.join("logo.svg"), linked.join("logo.svg"))
            .expect("symlink should succeed");

        assert!(trees_match(&real, &linked));
    }

    #[test]
    fn test_nonexistent_path_fails() {
        let result = hash_tree(Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(result.is_err());
        assert!(!trees_match(
            Path::new("/nonexistent/a"),
            Path::new("/nonexistent/a")
        ));
    }
}
