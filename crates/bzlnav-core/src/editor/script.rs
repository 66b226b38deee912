//! Editor host that answers with a script of Vim ex commands.
//!
//! The CLI builds an [`ExScriptHost`] from the buffer the editor passed in,
//! runs an action against it, and prints [`ExScriptHost::script`] on stdout
//! for the editor to `:execute` line by line.

use std::path::{Path, PathBuf};

use crate::buffer::{BufferSnapshot, Cursor};

use super::{EditorCommand, EditorHost, HostError};

/// Collects editor commands instead of executing them.
#[derive(Debug, Clone)]
pub struct ExScriptHost {
    path: PathBuf,
    lines: Vec<String>,
    cursor: Cursor,
    commands: Vec<EditorCommand>,
}

impl ExScriptHost {
    pub fn new(snapshot: BufferSnapshot) -> Self {
        Self {
            path: snapshot.path().to_path_buf(),
            lines: snapshot.lines().to_vec(),
            cursor: snapshot.cursor(),
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[EditorCommand] {
        &self.commands
    }

    /// The collected commands, one ex command per line.
    pub fn script(&self) -> String {
        self.commands
            .iter()
            .map(EditorCommand::to_ex)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl EditorHost for ExScriptHost {
    fn buffer_path(&self) -> &Path {
        &self.path
    }

    fn buffer_lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Refuses files the editor could not read, so the failure is reported
    /// here rather than as an error inside the editor. [`EditorHost`] calls
    /// are synchronous, so this is a single blocking `open` on a file the
    /// finder has just located.
    fn open_file(&mut self, path: &Path) -> Result<(), HostError> {
        if let Err(err) = std::fs::File::open(path) {
            return Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: err.to_string(),
            });
        }
        self.path = path.to_path_buf();
        self.commands.push(EditorCommand::Edit(path.to_path_buf()));
        Ok(())
    }

    fn mark_jump(&mut self) -> Result<(), HostError> {
        self.commands.push(EditorCommand::MarkJump);
        Ok(())
    }

    fn set_cursor(&mut self, cursor: Cursor) -> Result<(), HostError> {
        self.cursor = cursor;
        self.commands.push(EditorCommand::SetCursor(cursor));
        Ok(())
    }

    fn message(&mut self, text: &str) {
        self.commands.push(EditorCommand::Echo(text.to_string()));
    }
}
