use std::path::{Path, PathBuf};
use thiserror::Error;

/// Workspace safety checks to prevent editing files outside the target workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceGuard {
    /// Absolute path to workspace root
    workspace_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum SafetyError {
    #[error("path is outside workspace: {path} (workspace: {workspace})")]
    OutsideWorkspace { path: PathBuf, workspace: PathBuf },

    #[error("path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("cannot open {path}: {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl WorkspaceGuard {
    /// Create a guard rooted at `workspace_root`.
    ///
    /// Each entry of `forbidden_dirs` names one directory directly under the
    /// root: `node_modules` forbids `<workspace>/node_modules` only, if it
    /// exists. Nested directories of the same name (`pkg/node_modules`) are
    /// not covered here; the walk selector skips those by name.
    pub fn new<S: AsRef<str>>(
        workspace_root: impl AsRef<Path>,
        forbidden_dirs: &[S],
    ) -> Result<Self, SafetyError> {
        let root = workspace_root.as_ref();
        let workspace_root = root.canonicalize().map_err(|source| SafetyError::Resolve {
            path: root.to_path_buf(),
            source,
        })?;

        let forbidden_paths = forbidden_dirs
            .iter()
            .filter_map(|dir| workspace_root.join(dir.as_ref()).canonicalize().ok())
            .collect();

        Ok(Self {
            workspace_root,
            forbidden_paths,
        })
    }

    /// Check if a path is safe to edit.
    ///
    /// Returns the canonicalized absolute path if safe. A path that does not
    /// exist fails here with [`SafetyError::Resolve`].
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, SafetyError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace_root.join(path)
        };

        let canonical = absolute
            .canonicalize()
            .map_err(|source| SafetyError::Resolve { path: absolute, source })?;

        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    /// Re-validate a previously-validated canonical path right before writing.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, SafetyError> {
        let canonical = path.canonicalize().map_err(|source| SafetyError::Resolve {
            path: path.to_path_buf(),
            source,
        })?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), SafetyError> {
        if !canonical.starts_with(&self.workspace_root) {
            return Err(SafetyError::OutsideWorkspace {
                path: canonical.to_path_buf(),
                workspace: self.workspace_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(SafetyError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Path relative to the workspace root, for display.
    pub fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.workspace_root).unwrap_or(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const NO_DIRS: [&str; 0] = [];

    #[test]
    fn test_validate_path_inside_workspace() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        let guard = WorkspaceGuard::new(workspace, &NO_DIRS).unwrap();

        let file = workspace.join("src/app/api/route.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path(&file).unwrap();
        assert_eq!(
            guard.relative(&result),
            Path::new("src/app/api/route.ts")
        );
    }

    #[test]
    fn test_validate_path_outside_workspace() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();
        let guard = WorkspaceGuard::new(&workspace, &NO_DIRS).unwrap();

        let outside = temp_dir.path().join("outside.ts");
        fs::write(&outside, b"").unwrap();

        let result = guard.validate_path(&outside);
        assert!(matches!(result, Err(SafetyError::OutsideWorkspace { .. })));
    }

    #[test]
    fn test_validate_path_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        let file = workspace.join("node_modules/pkg/index.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let guard = WorkspaceGuard::new(workspace, &["node_modules"]).unwrap();

        let result = guard.validate_path(&file);
        assert!(matches!(result, Err(SafetyError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_forbidden_dirs_are_root_level_only() {
        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path();
        let file = workspace.join("src/app/node_modules/shim.ts");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let guard = WorkspaceGuard::new(workspace, &["node_modules"]).unwrap();

        // Nested copies are left to the walk filter
        assert!(guard.validate_path(&file).is_ok());
    }

    #[test]
    fn test_missing_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = WorkspaceGuard::new(temp_dir.path(), &NO_DIRS).unwrap();

        let result = guard.validate_path("src/missing.ts");
        match result {
            Err(SafetyError::Resolve { path, .. }) => assert!(path.ends_with("src/missing.ts")),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let workspace = temp_dir.path().join("workspace");
        fs::create_dir_all(&workspace).unwrap();

        let outside = temp_dir.path().join("outside.ts");
        fs::write(&outside, b"").unwrap();

        let link = workspace.join("escape.ts");
        symlink(&outside, &link).unwrap();

        let guard = WorkspaceGuard::new(&workspace, &NO_DIRS).unwrap();
        let result = guard.validate_path(&link);

        assert!(matches!(result, Err(SafetyError::OutsideWorkspace { .. })));
    }
}
