//! Directory symlink creation.

use std::path::{Component, Path, PathBuf};

/// Compute the link text that makes a symlink placed in `link_dir` point at
/// `source`.
///
/// Both paths should be absolute and canonical. A relative path is returned
/// when they share an ancestor below the filesystem root; otherwise `None`,
/// and callers link with the absolute source instead.
pub fn relative_link_target(source: &Path, link_dir: &Path) -> Option<PathBuf> {
    let src: Vec<Component<'_>> = source.components().collect();
    let base: Vec<Component<'_>> = link_dir.components().collect();

    let anchor = src
        .iter()
        .take_while(|c| matches!(c, Component::Prefix(_) | Component::RootDir))
        .count();
    if anchor == 0 {
        return None;
    }

    let common = src
        .iter()
        .zip(base.iter())
        .take_while(|(a, b)| a == b)
        .count();
    if common <= anchor {
        return None;
    }

    let mut rel = PathBuf::new();
    for _ in common..base.len() {
        rel.push("..");
    }
    for component in &src[common..] {
        rel.push(component.as_os_str());
    }
    if rel.as_os_str().is_empty() {
        rel.push(".");
    }
    Some(rel)
}

#[cfg(unix)]
pub fn create_dir_symlink(link_text: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(link_text, link)
}

#[cfg(windows)]
pub fn create_dir_symlink(link_text: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_dir(link_text, link)
}

#[cfg(not(any(unix, windows)))]
pub fn create_dir_symlink(_link_text: &Path, _link: &Path) -> std::io::Result<()> {
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        "Symlinks are not supported on this platform",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(unix)]
    #[test]
    fn relative_target_climbs_to_common_ancestor() {
        let rel = relative_link_target(
            Path::new("/proj/deps/acme/widgets/client"),
            Path::new("/proj/resources/acme/widgets"),
        );
        assert_eq!(
            rel,
            Some(PathBuf::from("../../../deps/acme/widgets/client"))
        );
    }

    #[cfg(unix)]
    #[test]
    fn sibling_directories() {
        let rel = relative_link_target(Path::new("/a/b/src"), Path::new("/a/b"));
        assert_eq!(rel, Some(PathBuf::from("src")));
    }

    #[cfg(unix)]
    #[test]
    fn only_root_in_common_uses_absolute() {
        assert_eq!(
            relative_link_target(Path::new("/opt/lib/client"), Path::new("/srv/web")),
            None
        );
    }

    #[test]
    fn relative_inputs_are_not_linked_relatively() {
        assert_eq!(
            relative_link_target(Path::new("deps/client"), Path::new("resources")),
            None
        );
    }
}
