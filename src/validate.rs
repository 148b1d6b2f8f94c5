//! Name validation for anything that becomes a path component.
//!
//! Owner and repository names come from the command line or from the API's
//! repository listing; asset names come from release documents. All of them
//! are joined onto the snapshot root, so they must not be able to escape it.

use crate::error::{Error, Result};

/// File names the snapshot layout reserves inside a parent item directory.
const RESERVED_FILE_NAMES: &[&str] = &["item"];

/// Suffix the layout uses for asset metadata sidecars.
const SIDECAR_SUFFIX: &str = ".meta";

/// Validate a GitHub user or organization name.
///
/// GitHub logins are alphanumeric with single hyphens, at most 39 characters.
/// Underscores are accepted as well since enterprise instances allow them.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] naming the offending value.
pub fn validate_owner(owner: &str) -> Result<()> {
    if owner.is_empty() || owner.len() > 39 {
        return Err(Error::InvalidArgument(format!(
            "owner must be 1-39 characters, got '{owner}'"
        )));
    }

    if !owner
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(Error::InvalidArgument(format!(
            "owner may only contain letters, digits, '-' and '_', got '{owner}'"
        )));
    }

    Ok(())
}

/// Validate a repository name.
///
/// # Errors
///
/// Returns [`Error::InvalidArgument`] for empty names, `.`/`..`, names over
/// 100 characters, or characters outside `[A-Za-z0-9._-]`.
pub fn validate_repo_name(repo: &str) -> Result<()> {
    if repo.is_empty() || repo.len() > 100 {
        return Err(Error::InvalidArgument(format!(
            "repository name must be 1-100 characters, got '{repo}'"
        )));
    }

    if repo == "." || repo == ".." {
        return Err(Error::InvalidArgument(format!(
            "'{repo}' is not a valid repository name"
        )));
    }

    if !repo
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(Error::InvalidArgument(format!(
            "repository name may only contain letters, digits, '.', '-' and '_', got '{repo}'"
        )));
    }

    Ok(())
}

/// Turn an upstream file name into one that is safe to write under a
/// release directory.
///
/// The mapping is a reversible percent-escape, so distinct names never land
/// on the same file:
///
/// - `%`, path separators and NUL are escaped as `%XX`
/// - a leading `.` run is escaped so the name is neither `..` nor hidden
/// - a name reserved by the layout has its first character escaped
/// - a `.meta` suffix has its dot escaped, keeping it apart from sidecars
/// - the empty name becomes a lone `%`, which no other name produces
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    if name.is_empty() {
        return "%".to_string();
    }

    let mut safe = String::with_capacity(name.len());
    let mut leading = true;
    for c in name.chars() {
        leading &= c == '.';
        match c {
            '%' => safe.push_str("%25"),
            '/' => safe.push_str("%2F"),
            '\\' => safe.push_str("%5C"),
            '\0' => safe.push_str("%00"),
            '.' if leading => safe.push_str("%2E"),
            c => safe.push(c),
        }
    }

    if RESERVED_FILE_NAMES.contains(&safe.as_str()) {
        let first = safe.remove(0);
        safe.insert_str(0, &format!("%{:02X}", u32::from(first)));
    }

    if safe.ends_with(SIDECAR_SUFFIX) {
        let dot = safe.len() - SIDECAR_SUFFIX.len();
        safe.replace_range(dot..=dot, "%2E");
    }

    safe
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_owner() {
        assert!(validate_owner("rust-lang").is_ok());
        assert!(validate_owner("octo_cat").is_ok());
        assert!(validate_owner("").is_err());
        assert!(validate_owner("../etc").is_err());
        assert!(validate_owner("a/b").is_err());
        assert!(validate_owner(&"x".repeat(40)).is_err());
    }

    #[test]
    fn test_validate_repo_name() {
        assert!(validate_repo_name("github-dl").is_ok());
        assert!(validate_repo_name("dotfiles.old").is_ok());
        assert!(validate_repo_name(".github").is_ok());
        assert!(validate_repo_name("..").is_err());
        assert!(validate_repo_name(".").is_err());
        assert!(validate_repo_name("a/../b").is_err());
        assert!(validate_repo_name("with space").is_err());
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("tool-1.0.tar.gz"), "tool-1.0.tar.gz");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "%2E%2E%2F..%2Fetc%2Fpasswd");
        assert_eq!(sanitize_file_name(".."), "%2E%2E");
        assert_eq!(sanitize_file_name(".hidden"), "%2Ehidden");
        assert_eq!(sanitize_file_name("a\\b"), "a%5Cb");
        assert_eq!(sanitize_file_name("100%"), "100%25");
        assert_eq!(sanitize_file_name(""), "%");
        assert_eq!(sanitize_file_name("item"), "%69tem");
        assert_eq!(sanitize_file_name("item.zip"), "item.zip");
        assert_eq!(sanitize_file_name("foo.meta"), "foo%2Emeta");
    }

    #[test]
    fn test_sanitize_file_name_is_injective() {
        let names = [
            "item", "_item", "%69tem", "foo", "foo.meta", "foo%2Emeta", "a/b", "a_b", "a%2Fb", "",
            "_", "%", ".x", "_x",
        ];
        let mut seen = std::collections::HashSet::new();
        for name in names {
            assert!(seen.insert(sanitize_file_name(name)), "collision for {name:?}");
        }
    }

    #[test]
    fn test_sanitized_name_is_never_reserved_or_sidecar() {
        for name in ["item", "foo.meta", ".meta", "x/item"] {
            let safe = sanitize_file_name(name);
            assert_ne!(safe, "item");
            assert!(!safe.ends_with(".meta"), "{name:?} became {safe:?}");
        }
    }
}
