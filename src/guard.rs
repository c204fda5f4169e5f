use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Project safety checks to prevent editing files outside the generated
/// project directory.
///
/// The patch targets are all well-known project-relative paths, but the
/// project root itself comes from operator input, so every mutating step
/// resolves its target through the guard first. Package-manager-owned trees
/// (`vendor/`, `node_modules/`, and the user-level composer/npm caches) are
/// off limits even when they sit inside the project.
#[derive(Debug, Clone)]
pub struct ProjectGuard {
    /// Absolute path to the project root
    project_root: PathBuf,
    /// Canonical paths to forbidden directories
    forbidden_paths: Vec<PathBuf>,
}

#[derive(Error, Debug)]
pub enum GuardError {
    #[error("Path is outside project: {path} (project: {project})")]
    OutsideProject { path: PathBuf, project: PathBuf },

    #[error("Path is in forbidden directory: {path} (forbidden: {forbidden})")]
    ForbiddenPath { path: PathBuf, forbidden: PathBuf },

    #[error("Target path must be project-relative without '..': {path}")]
    EscapingTarget { path: PathBuf },

    #[error("Failed to canonicalize path: {0}")]
    Canonicalize(#[from] std::io::Error),
}

impl ProjectGuard {
    /// Create a new guard rooted at an existing project directory.
    ///
    /// The root is canonicalized to handle symlinks correctly.
    pub fn new(project_root: impl AsRef<Path>) -> Result<Self, GuardError> {
        let project_root = project_root.as_ref().canonicalize()?;

        // vendor/ and node_modules/ may not exist yet when the guard is
        // built; the root is already canonical, so joining is enough.
        let mut forbidden_paths = vec![
            project_root.join("vendor"),
            project_root.join("node_modules"),
        ];

        // User-level package-manager caches, in case an operator points the
        // installer at a directory inside one of them.
        if let Some(home) = home::home_dir() {
            for cache in [".composer", ".config/composer", ".npm"] {
                if let Ok(dir) = home.join(cache).canonicalize() {
                    forbidden_paths.push(dir);
                }
            }
        }

        Ok(Self {
            project_root,
            forbidden_paths,
        })
    }

    /// Resolve a project-relative target to an absolute path and check it.
    ///
    /// The target may not exist yet (scaffolded files, bootstrapped route
    /// files): the deepest existing ancestor is canonicalized and checked,
    /// and the not-yet-created suffix is rejoined afterwards.
    pub fn validate_target(&self, relative: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
        let relative = relative.as_ref();

        if relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, Component::ParentDir))
        {
            return Err(GuardError::EscapingTarget {
                path: relative.to_path_buf(),
            });
        }

        let absolute = self.project_root.join(relative);

        let mut existing = absolute.as_path();
        while !existing.exists() {
            existing = existing.parent().ok_or_else(|| GuardError::EscapingTarget {
                path: relative.to_path_buf(),
            })?;
        }

        let canonical_base = existing.canonicalize()?;
        let suffix = absolute
            .strip_prefix(existing)
            .map_err(|_| GuardError::EscapingTarget {
                path: relative.to_path_buf(),
            })?;

        // joining an empty suffix would leave a trailing separator
        let resolved = if suffix.as_os_str().is_empty() {
            canonical_base
        } else {
            canonical_base.join(suffix)
        };

        // checked after rejoining, so a target under a not-yet-created
        // vendor/ or node_modules/ is still refused
        self.check_canonical(&resolved)?;
        Ok(resolved)
    }

    /// Validate an existing path (absolute, or relative to the project root).
    ///
    /// Returns the canonicalized absolute path if safe. Canonicalization
    /// happens at validation time; callers that hold the path across other
    /// work should [`ProjectGuard::revalidate`] right before writing.
    pub fn validate_path(&self, path: impl AsRef<Path>) -> Result<PathBuf, GuardError> {
        let path = path.as_ref();

        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.project_root.join(path)
        };

        // Canonicalize to resolve symlinks and .. components
        let canonical = absolute.canonicalize()?;

        self.check_canonical(&canonical)?;

        Ok(canonical)
    }

    /// Re-validate a previously-validated canonical path.
    ///
    /// Call this immediately before a write to close the window between
    /// validation and use: the path is re-canonicalized and re-checked
    /// against the project and forbidden boundaries.
    pub fn revalidate(&self, path: &Path) -> Result<PathBuf, GuardError> {
        let canonical = path.canonicalize()?;
        self.check_canonical(&canonical)?;
        Ok(canonical)
    }

    fn check_canonical(&self, canonical: &Path) -> Result<(), GuardError> {
        if !canonical.starts_with(&self.project_root) {
            return Err(GuardError::OutsideProject {
                path: canonical.to_path_buf(),
                project: self.project_root.clone(),
            });
        }

        for forbidden in &self.forbidden_paths {
            if canonical.starts_with(forbidden) {
                return Err(GuardError::ForbiddenPath {
                    path: canonical.to_path_buf(),
                    forbidden: forbidden.clone(),
                });
            }
        }

        Ok(())
    }

    /// Get the project root.
    pub fn project_root(&self) -> &Path {
        &self.project_root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_validate_path_inside_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let guard = ProjectGuard::new(project).unwrap();

        let file = project.join("config/app.php");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path(&file);
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_path_outside_project() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("app");
        fs::create_dir_all(&project).unwrap();
        let guard = ProjectGuard::new(&project).unwrap();

        let outside = temp_dir.path().join("outside.php");
        fs::write(&outside, b"").unwrap();

        let result = guard.validate_path(&outside);
        assert!(matches!(result, Err(GuardError::OutsideProject { .. })));
    }

    #[test]
    fn test_vendor_forbidden_even_when_created_after_guard() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let guard = ProjectGuard::new(project).unwrap();

        // composer populates vendor/ mid-flow, after the guard exists
        let file = project.join("vendor/autoload.php");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let result = guard.validate_path(&file);
        assert!(matches!(result, Err(GuardError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_node_modules_forbidden() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let file = project.join("node_modules/.package-lock.json");
        fs::create_dir_all(file.parent().unwrap()).unwrap();
        fs::write(&file, b"").unwrap();

        let guard = ProjectGuard::new(project).unwrap();
        let result = guard.validate_path(&file);
        assert!(matches!(result, Err(GuardError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_validate_target_for_missing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path()).unwrap();

        // scaffold targets do not exist before the step runs
        let result = guard.validate_target("app/Console/Commands/MakeInertiaComponent.php");
        assert!(result.is_ok());
        let resolved = result.unwrap();
        assert!(resolved.starts_with(guard.project_root()));
        assert!(resolved.ends_with("app/Console/Commands/MakeInertiaComponent.php"));
    }

    #[test]
    fn test_validate_target_rejects_uncreated_vendor_path() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path()).unwrap();

        // vendor/ does not exist yet; the rejoined path is still refused
        let result = guard.validate_target("vendor/autoload.php");
        assert!(matches!(result, Err(GuardError::ForbiddenPath { .. })));
    }

    #[test]
    fn test_validate_target_for_existing_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path();
        let guard = ProjectGuard::new(project).unwrap();

        let env = project.join(".env");
        fs::write(&env, b"APP_NAME=Laravel\n").unwrap();

        let resolved = guard.validate_target(".env").unwrap();
        assert_eq!(fs::read(&resolved).unwrap(), b"APP_NAME=Laravel\n");
    }

    #[test]
    fn test_validate_target_rejects_parent_components() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path()).unwrap();

        let result = guard.validate_target("../outside/.env");
        assert!(matches!(result, Err(GuardError::EscapingTarget { .. })));
    }

    #[test]
    fn test_validate_target_rejects_absolute_paths() {
        let temp_dir = tempfile::tempdir().unwrap();
        let guard = ProjectGuard::new(temp_dir.path()).unwrap();

        let result = guard.validate_target("/etc/passwd");
        assert!(matches!(result, Err(GuardError::EscapingTarget { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_symlink_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("app");
        fs::create_dir_all(&project).unwrap();

        let outside = temp_dir.path().join("outside.php");
        fs::write(&outside, b"").unwrap();

        let link = project.join("escape.php");
        symlink(&outside, &link).unwrap();

        let guard = ProjectGuard::new(&project).unwrap();
        let result = guard.validate_path(&link);

        // canonical path lands outside the project
        assert!(matches!(result, Err(GuardError::OutsideProject { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_validate_target_symlinked_ancestor_escape() {
        use std::os::unix::fs::symlink;

        let temp_dir = tempfile::tempdir().unwrap();
        let project = temp_dir.path().join("app");
        fs::create_dir_all(&project).unwrap();
        let elsewhere = temp_dir.path().join("elsewhere");
        fs::create_dir_all(&elsewhere).unwrap();

        symlink(&elsewhere, project.join("routes")).unwrap();

        let guard = ProjectGuard::new(&project).unwrap();
        let result = guard.validate_target("routes/web.php");
        assert!(matches!(result, Err(GuardError::OutsideProject { .. })));
    }
}
