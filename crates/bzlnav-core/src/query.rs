//! Build-graph queries.
//!
//! The resolver never talks to Bazel directly. It formats a [`QueryExpr`] and
//! hands it to a [`QueryTool`], so tests can answer with canned text while
//! production uses [`BazelQuery`] to spawn the real executable.

/// Subprocess-backed query tool.
pub mod bazel;

use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::BoxFuture;
use crate::label::BuildLabel;

pub use bazel::BazelQuery;

/// Errors from running a query.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed waiting for query process: {0}")]
    Wait(#[source] std::io::Error),

    #[error("query `{expr}` failed with exit code {}: {stderr}", exit_code(.code))]
    Failed {
        expr: String,
        code: Option<i32>,
        stderr: String,
    },

    #[error("query output is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query `{expr}` produced unparsable output: {output:?}")]
    Unparsable { expr: String, output: String },
}

fn exit_code(code: &Option<i32>) -> String {
    code.map_or_else(|| "none (killed by signal)".to_string(), |c| c.to_string())
}

/// A query expression in the build tool's query language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryExpr {
    /// A workspace-relative file path; answers with the file's own label.
    Path(String),
    /// Targets in `package` whose `attribute` lists `label`.
    Attr {
        attribute: SourceAttr,
        label: BuildLabel,
        package: String,
    },
}

impl QueryExpr {
    pub fn path(rel: impl Into<String>) -> Self {
        QueryExpr::Path(rel.into())
    }

    /// `attr('<attribute>',<label>,<package>:*)` for the label's own package.
    pub fn attr(attribute: SourceAttr, label: &BuildLabel) -> Self {
        QueryExpr::Attr {
            attribute,
            label: label.clone(),
            package: label.package().to_string(),
        }
    }
}

impl fmt::Display for QueryExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryExpr::Path(rel) => f.write_str(rel),
            QueryExpr::Attr {
                attribute,
                label,
                package,
            } => write!(f, "attr('{attribute}',{label},{package}:*)"),
        }
    }
}

/// Rule attributes that list a file as an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceAttr {
    Srcs,
    Hdrs,
}

impl SourceAttr {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceAttr::Srcs => "srcs",
            SourceAttr::Hdrs => "hdrs",
        }
    }
}

impl fmt::Display for SourceAttr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Answers build-graph queries.
///
/// Implementations return the tool's stdout with a single trailing newline
/// removed. Empty output is a valid answer ("nothing matched"), not an error.
pub trait QueryTool: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Run `expr` against the workspace rooted at `workspace`.
    fn query<'a>(
        &'a self,
        workspace: &'a Path,
        expr: &'a QueryExpr,
    ) -> BoxFuture<'a, Result<String, QueryError>>;
}

/// Remove exactly one trailing line terminator (`\n` or `\r\n`).
pub fn strip_trailing_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
