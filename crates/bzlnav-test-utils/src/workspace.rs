//! Throwaway Bazel-style workspaces on disk.

use std::path::{Path, PathBuf};

use bzlnav_core::{BufferSnapshot, Cursor};
use tempfile::TempDir;

/// A workspace root inside a temp directory, deleted on drop.
///
/// # Example
///
/// ```ignore
/// let ws = TestWorkspace::new();
/// ws.write("pkg/BUILD", "cc_library(name = \"foo\")\n");
/// let snapshot = ws.snapshot("pkg/BUILD", 1, 20).await;
/// ```
pub struct TestWorkspace {
    root: PathBuf,
    _temp_dir: TempDir,
}

impl TestWorkspace {
    /// A workspace marked by an empty `MODULE.bazel`.
    pub fn new() -> Self {
        Self::with_marker("MODULE.bazel")
    }

    /// A workspace marked by `marker`.
    pub fn with_marker(marker: &str) -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let root = temp_dir.path().join("ws");
        std::fs::create_dir_all(&root).expect("failed to create workspace root");
        std::fs::write(root.join(marker), "").expect("failed to write workspace marker");
        tracing::debug!(root = %root.display(), marker, "Created test workspace");
        Self {
            root,
            _temp_dir: temp_dir,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Absolute path of a workspace-relative file.
    pub fn path(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    /// Write a workspace-relative file, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) -> PathBuf {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create parent directories");
        }
        std::fs::write(&path, contents).expect("failed to write workspace file");
        path
    }

    /// Snapshot of a workspace file with the cursor at `row` (1-based) and
    /// `col` (0-based).
    pub async fn snapshot(&self, rel: &str, row: usize, col: usize) -> BufferSnapshot {
        BufferSnapshot::read(self.path(rel), Cursor::new(row, col))
            .await
            .expect("failed to read workspace file")
    }

    /// Snapshot with the cursor on the first occurrence of `needle`.
    pub async fn snapshot_at(&self, rel: &str, needle: &str) -> BufferSnapshot {
        let text = tokio::fs::read_to_string(self.path(rel))
            .await
            .expect("failed to read workspace file");
        let (row, col) = text
            .lines()
            .enumerate()
            .find_map(|(idx, line)| line.find(needle).map(|col| (idx + 1, col)))
            .unwrap_or_else(|| panic!("{needle:?} not found in {rel}"));
        BufferSnapshot::from_text(self.path(rel), &text, Cursor::new(row, col))
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}
