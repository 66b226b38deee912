//! An [`EditorHost`] that records what the actions asked the editor to do.

use std::path::{Path, PathBuf};

use bzlnav_core::{BufferSnapshot, Cursor, EditorCommand, EditorHost, HostError};

/// Recording editor host with a switch to make file opens fail.
#[derive(Debug, Clone)]
pub struct RecordingHost {
    path: PathBuf,
    lines: Vec<String>,
    cursor: Cursor,
    fail_opens: bool,
    /// Commands that reached the editor, in order.
    pub commands: Vec<EditorCommand>,
    /// Messages shown to the user.
    pub messages: Vec<String>,
}

impl RecordingHost {
    pub fn new(snapshot: BufferSnapshot) -> Self {
        Self {
            path: snapshot.path().to_path_buf(),
            lines: snapshot.lines().to_vec(),
            cursor: snapshot.cursor(),
            fail_opens: false,
            commands: Vec::new(),
            messages: Vec::new(),
        }
    }

    /// Make every `open_file` fail with a permission error.
    pub fn failing_opens(mut self) -> Self {
        self.fail_opens = true;
        self
    }
}

impl EditorHost for RecordingHost {
    fn buffer_path(&self) -> &Path {
        &self.path
    }

    fn buffer_lines(&self) -> Vec<String> {
        self.lines.clone()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }

    fn open_file(&mut self, path: &Path) -> Result<(), HostError> {
        if self.fail_opens {
            return Err(HostError::OpenFailed {
                path: path.to_path_buf(),
                reason: "permission denied".to_string(),
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
        self.messages.push(text.to_string());
    }
}
