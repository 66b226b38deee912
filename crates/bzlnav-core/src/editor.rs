//! Editor host abstraction and cursor navigation.
//!
//! The editor is reached only through [`EditorHost`], one implementation per
//! supported host. [`ExScriptHost`] renders the actions as Vim ex commands
//! for the CLI; tests use a recording host.

/// Ex-command script host.
pub mod script;

use std::borrow::Cow;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::buffer::{BufferSnapshot, Cursor};
use crate::definition::DefinitionLocation;

pub use script::ExScriptHost;

/// Errors reported by an editor host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error("cannot open {}: {reason}", .path.display())]
    OpenFailed { path: PathBuf, reason: String },
}

/// Errors from [`navigate_to`].
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("failed to open {}: {source}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: HostError,
    },

    #[error(transparent)]
    Host(#[from] HostError),
}

/// A command issued to the editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditorCommand {
    /// Open or switch to a buffer.
    Edit(PathBuf),
    /// Record the current position in the jump list.
    MarkJump,
    SetCursor(Cursor),
    /// Show an informational message.
    Echo(String),
}

impl EditorCommand {
    /// Render as a Vim ex command.
    pub fn to_ex(&self) -> String {
        match self {
            EditorCommand::Edit(path) => format!("edit {}", escape_path(&path.to_string_lossy())),
            EditorCommand::MarkJump => "normal! m'".to_string(),
            EditorCommand::SetCursor(cursor) => {
                format!("call cursor({}, {})", cursor.row, cursor.col + 1)
            }
            EditorCommand::Echo(message) => format!("echo \"{}\"", escape_message(message)),
        }
    }
}

impl fmt::Display for EditorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_ex())
    }
}

/// Characters Vim treats specially in a file argument (`%` and `#` expand to
/// buffer names, `|` ends the command).
const PATH_SPECIAL: &[char] = &[
    ' ', '\t', '\n', '*', '?', '[', '{', '`', '$', '\\', '%', '#', '\'', '"', '|', '!', '<',
];

/// Escape a path for embedding in an ex command, as Vim's `fnameescape()`
/// does: every special character gets a preceding backslash, as does a
/// leading `+`. Paths with nothing to escape are returned unchanged.
pub fn escape_path(path: &str) -> Cow<'_, str> {
    if !path.starts_with('+') && !path.contains(PATH_SPECIAL) {
        return Cow::Borrowed(path);
    }
    let mut escaped = String::with_capacity(path.len() + 8);
    for (i, c) in path.char_indices() {
        if PATH_SPECIAL.contains(&c) || (i == 0 && c == '+') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Cow::Owned(escaped)
}

fn escape_message(message: &str) -> String {
    message
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', " ")
}

/// The capabilities bzlnav needs from an editor.
pub trait EditorHost {
    /// Path of the current buffer.
    fn buffer_path(&self) -> &Path;

    /// Lines of the current buffer.
    fn buffer_lines(&self) -> Vec<String>;

    /// Current cursor position (1-based row, 0-based column).
    fn cursor(&self) -> Cursor;

    fn open_file(&mut self, path: &Path) -> Result<(), HostError>;

    /// Record the current position so "jump back" returns here.
    fn mark_jump(&mut self) -> Result<(), HostError>;

    fn set_cursor(&mut self, cursor: Cursor) -> Result<(), HostError>;

    /// Show an informational message to the user.
    fn message(&mut self, text: &str);

    /// Snapshot of the current buffer and cursor.
    fn snapshot(&self) -> BufferSnapshot {
        BufferSnapshot::new(self.buffer_path(), self.buffer_lines(), self.cursor())
    }
}

/// Move the editor to `location`.
///
/// Opens the file when it differs from the current buffer, otherwise marks
/// the current position in the jump list. The cursor lands on column 0 of
/// the target line. A failed open leaves the cursor where it was.
pub fn navigate_to(
    host: &mut dyn EditorHost,
    location: &DefinitionLocation,
) -> Result<(), NavigationError> {
    if same_file(host.buffer_path(), &location.path) {
        host.mark_jump()?;
    } else {
        host.open_file(&location.path)
            .map_err(|source| NavigationError::Open {
                path: location.path.clone(),
                source,
            })?;
    }
    host.set_cursor(Cursor::new(location.line, 0))?;
    tracing::debug!(
        path = %location.path.display(),
        line = location.line,
        "Navigated to definition"
    );
    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
