//! Workspace root discovery.
//!
//! A workspace root is the nearest ancestor directory that contains one of
//! the configured marker files (`MODULE.bazel`, `WORKSPACE`, ...).

use std::path::{Component, Path, PathBuf};

use bzlnav_config::WorkspaceConfig;

/// Errors from workspace discovery.
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("{} is not inside a workspace", .0.display())]
    NotInWorkspace(PathBuf),

    #[error("{} is not under workspace root {}", .path.display(), .root.display())]
    OutsideRoot { path: PathBuf, root: PathBuf },

    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[from] std::io::Error),
}

/// Walks parent directories looking for a workspace marker file.
#[derive(Debug, Clone)]
pub struct WorkspaceLocator {
    markers: Vec<String>,
}

impl WorkspaceLocator {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            markers: markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &WorkspaceConfig) -> Self {
        Self::new(config.markers.iter().cloned())
    }

    /// Return the nearest ancestor of `path` holding a marker file.
    ///
    /// `path` itself is only considered when it is a directory.
    pub fn locate(&self, path: &Path) -> Result<PathBuf, WorkspaceError> {
        let path = absolutize(path)?;
        let start = if path.is_dir() {
            Some(path.as_path())
        } else {
            path.parent()
        };

        for dir in start.into_iter().flat_map(Path::ancestors) {
            if let Some(marker) = self.markers.iter().find(|m| dir.join(m).is_file()) {
                tracing::trace!(root = %dir.display(), marker = %marker, "Found workspace root");
                return Ok(dir.to_path_buf());
            }
        }

        Err(WorkspaceError::NotInWorkspace(path))
    }
}

impl Default for WorkspaceLocator {
    fn default() -> Self {
        Self::from_config(&WorkspaceConfig::default())
    }
}

/// The `/`-separated path of `path` relative to `root`.
pub fn relative_path(root: &Path, path: &Path) -> Result<String, WorkspaceError> {
    let path = absolutize(path)?;
    let root = absolutize(root)?;
    let rel = path
        .strip_prefix(&root)
        .map_err(|_| WorkspaceError::OutsideRoot {
            path: path.clone(),
            root: root.clone(),
        })?;

    let parts: Vec<_> = rel
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    Ok(parts.join("/"))
}

/// Make `path` absolute against the current directory and drop `.` / `..`
/// components lexically.
fn absolutize(path: &Path) -> Result<PathBuf, WorkspaceError> {
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut out = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn touch(path: &Path) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, "").unwrap();
    }

    #[test]
    fn test_locate_finds_nearest_marker() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("ws");
        touch(&root.join("WORKSPACE"));
        touch(&root.join("pkg/sub/foo.cc"));

        let locator = WorkspaceLocator::default();
        let found = locator.locate(&root.join("pkg/sub/foo.cc")).unwrap();
        assert_eq!(found, root);
    }

    #[test]
    fn test_locate_prefers_innermost_workspace() {
        let tmp = TempDir::new().unwrap();
        let outer = tmp.path().join("outer");
        let inner = outer.join("third_party/inner");
        touch(&outer.join("MODULE.bazel"));
        touch(&inner.join("WORKSPACE.bazel"));
        touch(&inner.join("lib/a.h"));

        let found = WorkspaceLocator::default()
            .locate(&inner.join("lib/a.h"))
            .unwrap();
        assert_eq!(found, inner);
    }

    #[test]
    fn test_locate_accepts_directory_input() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("ws");
        touch(&root.join("MODULE.bazel"));

        let found = WorkspaceLocator::default().locate(&root).unwrap();
        assert_eq!(found, root);
    }

    #[test]
    fn test_marker_must_be_a_file() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("ws");
        std::fs::create_dir_all(root.join("WORKSPACE")).unwrap();
        touch(&root.join("foo.cc"));

        let locator = WorkspaceLocator::new(["WORKSPACE"]);
        // Keep looking past a directory named like a marker; a temp dir has no
        // marker above it, so this ends at the filesystem root.
        assert!(matches!(
            locator.locate(&root.join("foo.cc")),
            Err(WorkspaceError::NotInWorkspace(_))
        ));
    }

    #[test]
    fn test_not_in_workspace() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("loose/file.cc");
        touch(&file);

        let locator = WorkspaceLocator::new(["bzlnav-test-marker-that-does-not-exist"]);
        let err = locator.locate(&file).unwrap_err();
        assert!(matches!(err, WorkspaceError::NotInWorkspace(ref p) if p == &file));
        assert!(err.to_string().contains("not inside a workspace"));
    }

    #[test]
    fn test_relative_path_uses_forward_slashes() {
        let root = Path::new("/ws");
        assert_eq!(
            relative_path(root, Path::new("/ws/pkg/foo.cc")).unwrap(),
            "pkg/foo.cc"
        );
        assert_eq!(
            relative_path(root, Path::new("/ws/pkg/./sub/../foo.cc")).unwrap(),
            "pkg/foo.cc"
        );
        assert_eq!(relative_path(root, Path::new("/ws")).unwrap(), "");
    }

    #[test]
    fn test_relative_path_outside_root() {
        let err = relative_path(Path::new("/ws"), Path::new("/elsewhere/foo.cc")).unwrap_err();
        assert!(matches!(err, WorkspaceError::OutsideRoot { .. }));
    }
}
