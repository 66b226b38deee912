//! Immutable snapshots of an editor buffer taken when a user action fires.

use std::path::{Path, PathBuf};

use serde::Serialize;

/// Cursor position: 1-based row, 0-based byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Cursor {
    pub row: usize,
    pub col: usize,
}

impl Cursor {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// The buffer's file path, its lines, and the cursor at the moment of the action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BufferSnapshot {
    path: PathBuf,
    lines: Vec<String>,
    cursor: Cursor,
}

impl BufferSnapshot {
    pub fn new(path: impl Into<PathBuf>, lines: Vec<String>, cursor: Cursor) -> Self {
        Self {
            path: path.into(),
            lines,
            cursor,
        }
    }

    /// Build a snapshot from the full buffer text.
    pub fn from_text(path: impl Into<PathBuf>, text: &str, cursor: Cursor) -> Self {
        Self::new(path, text.lines().map(str::to_string).collect(), cursor)
    }

    /// Read the buffer from the file on disk.
    pub async fn read(path: impl Into<PathBuf>, cursor: Cursor) -> std::io::Result<Self> {
        let path = path.into();
        let text = tokio::fs::read_to_string(&path).await?;
        Ok(Self::from_text(path, &text, cursor))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// The line under the cursor, if the row is inside the buffer.
    pub fn cursor_line(&self) -> Option<&str> {
        self.cursor
            .row
            .checked_sub(1)
            .and_then(|idx| self.lines.get(idx))
            .map(String::as_str)
    }
}
