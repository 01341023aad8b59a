//! Path resolution for the file editor
//!
//! Maps model-supplied paths onto the editor root and refuses anything that
//! would land outside it.

use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::core::{DriverError, Result};

/// Resolves API paths into locations under a single editor root
#[derive(Debug, Clone)]
pub struct PathResolver {
    root: PathBuf,
    sandbox_prefix: String,
}

impl PathResolver {
    /// Create a resolver for `root`, stripping `sandbox_prefix` from incoming paths
    pub fn new(root: impl Into<PathBuf>, sandbox_prefix: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            sandbox_prefix: sandbox_prefix.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve `path` without creating anything.
    ///
    /// The sandbox prefix (or a bare leading `/`) is stripped, the remainder is
    /// joined onto the root, and `.`/`..` are folded lexically. A result outside
    /// the root is a [`DriverError::PathEscape`].
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let prefix = self.sandbox_prefix.trim_end_matches('/');
        let relative = if !prefix.is_empty() && path == prefix {
            ""
        } else if let Some(rest) = path.strip_prefix(self.sandbox_prefix.as_str()) {
            rest
        } else {
            path
        };
        let relative = relative.trim_start_matches('/');

        let mut resolved = PathBuf::new();
        let mut depth = 0usize;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(part) => {
                    resolved.push(part);
                    depth += 1;
                }
                Component::CurDir => {}
                Component::ParentDir => {
                    if depth == 0 {
                        return Err(DriverError::PathEscape(path.to_string()));
                    }
                    resolved.pop();
                    depth -= 1;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(DriverError::PathEscape(path.to_string()));
                }
            }
        }

        let resolved = self.root.join(resolved);
        self.check_contained(&resolved, path)?;
        Ok(resolved)
    }

    /// Reject `resolved` if its nearest present ancestor leads out of the root.
    ///
    /// A symlinked directory inside the root can point anywhere, so the check
    /// runs even when the final component does not exist yet.
    fn check_contained(&self, resolved: &Path, path: &str) -> Result<()> {
        // Nothing below a missing root can be a link
        let Ok(root) = self.root.canonicalize() else {
            return Ok(());
        };
        let Some(present) = resolved
            .ancestors()
            .find(|ancestor| fs::symlink_metadata(ancestor).is_ok())
        else {
            return Ok(());
        };

        // Dangling links fail to canonicalize and are rejected with the rest
        match present.canonicalize() {
            Ok(real) if real.starts_with(&root) => Ok(()),
            _ => Err(DriverError::PathEscape(path.to_string())),
        }
    }

    /// Resolve `path` and create its parent directories
    pub fn resolve_for_write(&self, path: &str) -> Result<PathBuf> {
        let resolved = self.resolve(path)?;
        if let Some(parent) = resolved.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DriverError::with_context(
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }
        self.check_contained(&resolved, path)?;
        Ok(resolved)
    }

    /// Path relative to the root, for display in tool output
    pub fn display_path(&self, resolved: &Path) -> String {
        resolved
            .strip_prefix(&self.root)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|_| resolved.display().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn resolver(root: &Path) -> PathResolver {
        PathResolver::new(root, "/repo/")
    }

    #[test]
    fn test_strips_sandbox_prefix() {
        let r = resolver(Path::new("/srv/editor"));
        assert_eq!(
            r.resolve("/repo/src/main.rs").unwrap(),
            PathBuf::from("/srv/editor/src/main.rs")
        );
    }

    #[test]
    fn test_relative_and_absolute_paths_join_root() {
        let r = resolver(Path::new("/srv/editor"));
        assert_eq!(r.resolve("a/b.txt").unwrap(), PathBuf::from("/srv/editor/a/b.txt"));
        assert_eq!(r.resolve("/a/b.txt").unwrap(), PathBuf::from("/srv/editor/a/b.txt"));
    }

    #[test]
    fn test_prefix_alone_is_root() {
        let r = resolver(Path::new("/srv/editor"));
        assert_eq!(r.resolve("/repo").unwrap(), PathBuf::from("/srv/editor"));
        assert_eq!(r.resolve("/repo/").unwrap(), PathBuf::from("/srv/editor"));
    }

    #[test]
    fn test_parent_dirs_inside_root_are_folded() {
        let r = resolver(Path::new("/srv/editor"));
        assert_eq!(
            r.resolve("/repo/a/../b/./c.txt").unwrap(),
            PathBuf::from("/srv/editor/b/c.txt")
        );
    }

    #[test]
    fn test_escape_is_rejected() {
        let r = resolver(Path::new("/srv/editor"));
        assert!(matches!(
            r.resolve("/repo/../secret"),
            Err(DriverError::PathEscape(_))
        ));
        assert!(matches!(
            r.resolve("a/../../etc/passwd"),
            Err(DriverError::PathEscape(_))
        ));
    }

    #[test]
    fn test_resolve_for_write_creates_parents() {
        let temp = TempDir::new().unwrap();
        let r = resolver(temp.path());
        let path = r.resolve_for_write("/repo/deep/er/file.txt").unwrap();
        assert!(temp.path().join("deep/er").is_dir());
        assert!(!path.exists());
    }

    #[test]
    fn test_resolve_does_not_create() {
        let temp = TempDir::new().unwrap();
        let r = resolver(temp.path());
        r.resolve("/repo/missing/file.txt").unwrap();
        assert!(!temp.path().join("missing").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_out_of_root_is_rejected() {
        let outside = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();
        let r = resolver(temp.path());
        assert!(matches!(
            r.resolve("/repo/link"),
            Err(DriverError::PathEscape(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_new_file_under_symlinked_dir_is_rejected() {
        let outside = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("link")).unwrap();
        let r = resolver(temp.path());

        assert!(matches!(
            r.resolve("/repo/link/pwned.txt"),
            Err(DriverError::PathEscape(_))
        ));
        assert!(matches!(
            r.resolve_for_write("/repo/link/nested/pwned.txt"),
            Err(DriverError::PathEscape(_))
        ));
        assert!(!outside.path().join("nested").exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_dangling_symlink_is_rejected() {
        let outside = TempDir::new().unwrap();
        let temp = TempDir::new().unwrap();
        let target = outside.path().join("not-yet.txt");
        std::os::unix::fs::symlink(&target, temp.path().join("dangling")).unwrap();
        let r = resolver(temp.path());

        assert!(matches!(
            r.resolve_for_write("/repo/dangling"),
            Err(DriverError::PathEscape(_))
        ));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlink_within_root_is_allowed() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("real")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("alias")).unwrap();
        let r = resolver(temp.path());

        assert!(r.resolve_for_write("/repo/alias/new.txt").is_ok());
    }

    #[test]
    fn test_display_path() {
        let r = resolver(Path::new("/srv/editor"));
        let resolved = r.resolve("/repo/x/y.txt").unwrap();
        assert_eq!(r.display_path(&resolved), "x/y.txt");
    }
}
