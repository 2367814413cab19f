//! Safety checks for folder names a module asks to expose.

/// Check that a declared folder is safe to expose.
///
/// Any `.` anywhere in the name is rejected, which also rules out `..`
/// traversal, dotfiles and names like `v1.2`. Names rooted at `/` or `\`
/// are rejected, as is the empty string. Nested relative paths such as
/// `js/dist` are accepted.
pub fn validate_folder(folder: &str) -> bool {
    if folder.is_empty() {
        return false;
    }
    if folder.contains('.') {
        return false;
    }
    if folder.starts_with('/') || folder.starts_with('\\') {
        return false;
    }
    true
}

/// Return the first folder in `folders` that fails [`validate_folder`].
pub fn first_invalid<'a, I>(folders: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a String>,
{
    folders
        .into_iter()
        .map(String::as_str)
        .find(|folder| !validate_folder(folder))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_and_nested_names() {
        for folder in ["client", "js/dist", "images", "a\\b", "css-min", "under_score"] {
            assert!(validate_folder(folder), "{folder} should be accepted");
        }
    }

    #[test]
    fn rejects_any_dot() {
        for folder in ["..", "../etc", "js/../../secret", ".well-known", "v1.2", "."] {
            assert!(!validate_folder(folder), "{folder} should be rejected");
        }
    }

    #[test]
    fn rejects_rooted_paths() {
        assert!(!validate_folder("/etc"));
        assert!(!validate_folder("\\windows"));
        assert!(!validate_folder("/"));
    }

    #[test]
    fn rejects_empty() {
        assert!(!validate_folder(""));
    }

    #[test]
    fn first_invalid_reports_offender() {
        let folders = vec!["client".to_string(), "../x".to_string(), "/abs".to_string()];
        assert_eq!(first_invalid(&folders), Some("../x"));

        let ok = vec!["client".to_string(), "js/dist".to_string()];
        assert_eq!(first_invalid(&ok), None);
    }
}
