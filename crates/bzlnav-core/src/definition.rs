//! Jump-to-definition for BUILD and `.bzl` buffers.
//!
//! A [`DefinitionFinder`] maps the token under the cursor to a file and line.
//! `Ok(None)` means "nothing to jump to" and is a normal outcome; an `Err` is
//! a genuine failure such as a malformed label or an unterminated string at
//! the cursor.
//!
//! [`BuildFileFinder`] handles:
//!
//! | cursor on | jumps to |
//! |-----------|----------|
//! | `"//pkg:target"`, `":target"`, `"target"` | rule `name = "target"` in the package's build file |
//! | `"//pkg:file.h"` (an existing file) | the file, line 1 |
//! | `load("//x:defs.bzl", ...)` first string | the `.bzl` file, line 1 |
//! | `load(..., "sym")` / `alias = "sym"` | `def sym(` or `sym =` in the loaded file |
//! | bare identifier | a top-level definition in the buffer, else through `load` |

mod scan;

use std::path::{Path, PathBuf};

use bzlnav_config::DefinitionConfig;
use serde::Serialize;
use tracing::debug;

use crate::BoxFuture;
use crate::buffer::BufferSnapshot;
use crate::label::{BuildLabel, LabelError};
use crate::workspace::{self, WorkspaceError, WorkspaceLocator};

use scan::{LoadStatement, Token};

pub use scan::ScanError;

/// Where a definition lives. `line` is 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DefinitionLocation {
    pub path: PathBuf,
    pub line: usize,
}

impl DefinitionLocation {
    pub fn new(path: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }
}

/// Errors from definition lookup.
#[derive(Debug, thiserror::Error)]
pub enum DefinitionError {
    #[error("{} is not inside a workspace", .0.display())]
    NotInWorkspace(PathBuf),

    #[error("malformed label {text:?}: {source}")]
    MalformedLabel {
        text: String,
        #[source]
        source: LabelError,
    },

    #[error("syntax error at row {row}: {source}")]
    Syntax {
        row: usize,
        #[source]
        source: ScanError,
    },

    #[error("cursor row {row} is outside the buffer ({lines} lines)")]
    CursorOutOfRange { row: usize, lines: usize },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Workspace(WorkspaceError),
}

impl From<WorkspaceError> for DefinitionError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NotInWorkspace(path) => DefinitionError::NotInWorkspace(path),
            other => DefinitionError::Workspace(other),
        }
    }
}

/// Resolves the symbol under the cursor to its definition.
pub trait DefinitionFinder: Send + Sync {
    fn find_definition<'a>(
        &'a self,
        snapshot: &'a BufferSnapshot,
    ) -> BoxFuture<'a, Result<Option<DefinitionLocation>, DefinitionError>>;
}

/// Definition lookup over the workspace's BUILD and `.bzl` files.
#[derive(Debug, Clone)]
pub struct BuildFileFinder {
    locator: WorkspaceLocator,
    build_file_names: Vec<String>,
}

/// Per-lookup context: the workspace and the package of the buffer.
struct Scope<'a> {
    root: PathBuf,
    package: String,
    snapshot: &'a BufferSnapshot,
}

impl BuildFileFinder {
    pub fn new(locator: WorkspaceLocator, build_file_names: Vec<String>) -> Self {
        Self {
            locator,
            build_file_names,
        }
    }

    pub fn from_config(locator: WorkspaceLocator, config: &DefinitionConfig) -> Self {
        Self::new(locator, config.build_file_names.clone())
    }

    /// The buffer's package is the nearest directory at or above it that
    /// holds a build file, or the root package when none does.
    async fn scope<'a>(
        &self,
        snapshot: &'a BufferSnapshot,
    ) -> Result<Scope<'a>, DefinitionError> {
        let root = self.locator.locate(snapshot.path())?;
        let dir = snapshot.path().parent().unwrap_or(root.as_path());
        let rel = workspace::relative_path(&root, dir)?;

        let mut parts: Vec<&str> = rel.split('/').filter(|p| !p.is_empty()).collect();
        let package = loop {
            let candidate = parts.join("/");
            if parts.is_empty() || self.build_file_in(&root.join(&candidate)).await.is_some() {
                break BuildLabel::package_of(&candidate);
            }
            parts.pop();
        };

        Ok(Scope {
            root,
            package,
            snapshot,
        })
    }

    /// The first configured build file present in `dir`.
    async fn build_file_in(&self, dir: &Path) -> Option<PathBuf> {
        for name in &self.build_file_names {
            let path = dir.join(name);
            if is_file(&path).await {
                return Some(path);
            }
        }
        None
    }

    /// Parse a label written in the buffer. Strings that do not look like
    /// labels at all are `Ok(None)`.
    fn label(scope: &Scope<'_>, text: &str) -> Result<Option<BuildLabel>, DefinitionError> {
        let explicit = text.starts_with("//") || text.starts_with('@') || text.starts_with(':');
        match BuildLabel::resolve_relative(text, &scope.package) {
            Ok(label) => Ok(Some(label)),
            Err(source) if explicit => Err(DefinitionError::MalformedLabel {
                text: text.to_string(),
                source,
            }),
            Err(_) => Ok(None),
        }
    }

    /// The package directory of a label in the main repository.
    fn package_dir(scope: &Scope<'_>, label: &BuildLabel) -> Option<PathBuf> {
        if let Some(repo) = label.repository()
            && !repo.trim_start_matches('@').is_empty()
        {
            debug!(label = %label, "Label is in an external repository");
            return None;
        }
        Some(scope.root.join(label.package_path()))
    }

    /// The source file named by `label`, if it exists.
    async fn file_of(scope: &Scope<'_>, label: &BuildLabel) -> Option<PathBuf> {
        let path = Self::package_dir(scope, label)?.join(label.target());
        is_file(&path).await.then_some(path)
    }

    /// A file target, or the rule declaring the target in its package.
    async fn locate_label(
        &self,
        scope: &Scope<'_>,
        label: &BuildLabel,
    ) -> Result<Option<DefinitionLocation>, DefinitionError> {
        if let Some(path) = Self::file_of(scope, label).await {
            return Ok(Some(DefinitionLocation::new(path, 1)));
        }
        let Some(dir) = Self::package_dir(scope, label) else {
            return Ok(None);
        };
        let Some(build_file) = self.build_file_in(&dir).await else {
            debug!(label = %label, dir = %dir.display(), "No build file for package");
            return Ok(None);
        };
        let lines = read_lines(&build_file).await?;
        Ok(scan::find_rule_row(&lines, label.target())
            .map(|row| DefinitionLocation::new(build_file, row)))
    }

    /// `symbol` inside the `.bzl` file loaded by `load`. Falls back to the
    /// top of the file when the symbol is not found textually.
    async fn locate_loaded_symbol(
        scope: &Scope<'_>,
        load: &LoadStatement,
        symbol: &str,
    ) -> Result<Option<DefinitionLocation>, DefinitionError> {
        let Some(label) = Self::label(scope, &load.module)? else {
            return Ok(None);
        };
        let Some(path) = Self::file_of(scope, &label).await else {
            return Ok(None);
        };
        let lines = read_lines(&path).await?;
        let row = scan::find_symbol_row(&lines, symbol).unwrap_or(1);
        Ok(Some(DefinitionLocation::new(path, row)))
    }

    async fn locate_in_load(
        scope: &Scope<'_>,
        load: &LoadStatement,
        token: Token<'_>,
    ) -> Result<Option<DefinitionLocation>, DefinitionError> {
        match token {
            Token::Str(text) if text == load.module => {
                let Some(label) = Self::label(scope, text)? else {
                    return Ok(None);
                };
                Ok(Self::file_of(scope, &label)
                    .await
                    .map(|path| DefinitionLocation::new(path, 1)))
            }
            Token::Str(text) => match load.by_exported(text) {
                Some(binding) => Self::locate_loaded_symbol(scope, load, &binding.exported).await,
                None => Ok(None),
            },
            Token::Ident(ident) => match load.by_local(ident) {
                Some(binding) => Self::locate_loaded_symbol(scope, load, &binding.exported).await,
                None => Ok(None),
            },
        }
    }

    async fn locate_ident(
        scope: &Scope<'_>,
        loads: &[LoadStatement],
        ident: &str,
    ) -> Result<Option<DefinitionLocation>, DefinitionError> {
        let lines = scope.snapshot.lines();
        if let Some(row) = scan::find_symbol_row(lines, ident) {
            return Ok(Some(DefinitionLocation::new(scope.snapshot.path(), row)));
        }
        for load in loads {
            if let Some(binding) = load.by_local(ident) {
                return Self::locate_loaded_symbol(scope, load, &binding.exported).await;
            }
        }
        Ok(None)
    }

    async fn find(
        &self,
        snapshot: &BufferSnapshot,
    ) -> Result<Option<DefinitionLocation>, DefinitionError> {
        let cursor = snapshot.cursor();
        let line = snapshot
            .cursor_line()
            .ok_or(DefinitionError::CursorOutOfRange {
                row: cursor.row,
                lines: snapshot.lines().len(),
            })?;

        let token = scan::token_at(line, cursor.col).map_err(|source| DefinitionError::Syntax {
            row: cursor.row,
            source,
        })?;
        let Some(token) = token else {
            debug!(row = cursor.row, col = cursor.col, "No token under cursor");
            return Ok(None);
        };

        let scope = self.scope(snapshot).await?;
        debug!(token = ?token, package = %scope.package, "Looking up definition");

        let loads = scan::load_statements(snapshot.lines());
        if let Some(load) = loads.iter().find(|l| l.spans(cursor.row)) {
            return Self::locate_in_load(&scope, load, token).await;
        }

        match token {
            Token::Str(text) => match Self::label(&scope, text)? {
                Some(label) => self.locate_label(&scope, &label).await,
                None => Ok(None),
            },
            Token::Ident(ident) => Self::locate_ident(&scope, &loads, ident).await,
        }
    }
}

impl DefinitionFinder for BuildFileFinder {
    fn find_definition<'a>(
        &'a self,
        snapshot: &'a BufferSnapshot,
    ) -> BoxFuture<'a, Result<Option<DefinitionLocation>, DefinitionError>> {
        Box::pin(self.find(snapshot))
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .is_ok_and(|meta| meta.is_file())
}

async fn read_lines(path: &Path) -> Result<Vec<String>, DefinitionError> {
    tokio::fs::read_to_string(path)
        .await
        .map(|text| text.lines().map(str::to_string).collect())
        .map_err(|source| DefinitionError::Io {
            path: path.to_path_buf(),
            source,
        })
}
