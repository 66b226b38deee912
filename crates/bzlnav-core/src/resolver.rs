//! Build label resolution: which target owns the file in a buffer.
//!
//! ```text
//! /ws/pkg/foo.cc ──locate──▶ /ws ──relative──▶ pkg/foo.cc
//!        query `pkg/foo.cc`                 ──▶ //pkg:foo.cc
//!        query attr('srcs',//pkg:foo.cc,//pkg:*) ──▶ //pkg:foolib
//!        (empty? query attr('hdrs',...) instead)
//! ```
//!
//! Empty query output at any step is a normal answer ("the build does not
//! reference this file"), reported as a [`LabelResolution`] variant. Only a
//! failing query tool or unparsable output is an error.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::buffer::BufferSnapshot;
use crate::label::BuildLabel;
use crate::query::{QueryError, QueryExpr, QueryTool, SourceAttr};
use crate::workspace::{self, WorkspaceError, WorkspaceLocator};

/// Errors from label resolution.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    #[error("{} is not inside a workspace", .0.display())]
    NotInWorkspace(PathBuf),

    #[error(transparent)]
    Workspace(WorkspaceError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

impl From<WorkspaceError> for ResolveError {
    fn from(err: WorkspaceError) -> Self {
        match err {
            WorkspaceError::NotInWorkspace(path) => ResolveError::NotInWorkspace(path),
            other => ResolveError::Workspace(other),
        }
    }
}

/// Outcome of resolving the owning build label of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LabelResolution {
    /// The query tool returned nothing for the file path.
    Unowned { relative_path: String },
    /// The file has a label, but no target in its package lists it.
    Unreferenced {
        file_label: BuildLabel,
        package: String,
    },
    /// Targets in the package that list the file in `attribute`.
    Owned {
        file_label: BuildLabel,
        package: String,
        attribute: SourceAttr,
        targets: Vec<BuildLabel>,
    },
}

impl LabelResolution {
    /// The first owning target, if any.
    pub fn primary(&self) -> Option<&BuildLabel> {
        match self {
            LabelResolution::Owned { targets, .. } => targets.first(),
            _ => None,
        }
    }

    /// The package the file belongs to, when the file has a label.
    pub fn package(&self) -> Option<&str> {
        match self {
            LabelResolution::Unowned { .. } => None,
            LabelResolution::Unreferenced { package, .. }
            | LabelResolution::Owned { package, .. } => Some(package),
        }
    }
}

/// Resolves the build target that owns a source file.
#[derive(Clone)]
pub struct LabelResolver {
    locator: WorkspaceLocator,
    tool: Arc<dyn QueryTool>,
}

impl LabelResolver {
    pub fn new(locator: WorkspaceLocator, tool: Arc<dyn QueryTool>) -> Self {
        Self { locator, tool }
    }

    /// Resolve the owning label of the snapshot's file. Buffer contents and
    /// cursor do not influence the result.
    pub async fn resolve(&self, snapshot: &BufferSnapshot) -> Result<LabelResolution, ResolveError> {
        self.resolve_path(snapshot.path()).await
    }

    /// Resolve the owning label of the file at `path`.
    pub async fn resolve_path(&self, path: &Path) -> Result<LabelResolution, ResolveError> {
        let root = self.locator.locate(path)?;
        let relative_path = workspace::relative_path(&root, path)?;
        debug!(
            tool = self.tool.name(),
            root = %root.display(),
            file = %relative_path,
            "Resolving build label"
        );

        let expr = QueryExpr::path(relative_path.clone());
        let output = self.tool.query(&root, &expr).await?;
        if output.trim().is_empty() {
            debug!(file = %relative_path, "File has no label");
            return Ok(LabelResolution::Unowned { relative_path });
        }
        let file_label = parse_single_label(&expr, &output)?;
        let package = file_label.package().to_string();

        for attribute in [SourceAttr::Srcs, SourceAttr::Hdrs] {
            let expr = QueryExpr::attr(attribute, &file_label);
            let output = self.tool.query(&root, &expr).await?;
            if output.trim().is_empty() {
                debug!(attribute = %attribute, label = %file_label, "No target lists the file");
                continue;
            }
            let targets = parse_label_lines(&expr, &output)?;
            debug!(attribute = %attribute, targets = targets.len(), "Found owning targets");
            return Ok(LabelResolution::Owned {
                file_label,
                package,
                attribute,
                targets,
            });
        }

        Ok(LabelResolution::Unreferenced {
            file_label,
            package,
        })
    }
}

fn unparsable(expr: &QueryExpr, output: &str) -> QueryError {
    QueryError::Unparsable {
        expr: expr.to_string(),
        output: output.to_string(),
    }
}

fn parse_single_label(expr: &QueryExpr, output: &str) -> Result<BuildLabel, QueryError> {
    let mut lines = output.lines().filter(|l| !l.trim().is_empty());
    match (lines.next(), lines.next()) {
        (Some(line), None) => BuildLabel::parse(line).map_err(|_| unparsable(expr, output)),
        _ => Err(unparsable(expr, output)),
    }
}

fn parse_label_lines(expr: &QueryExpr, output: &str) -> Result<Vec<BuildLabel>, QueryError> {
    output
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| BuildLabel::parse(l).map_err(|_| unparsable(expr, output)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_single_label_rejects_multiple_lines() {
        let expr = QueryExpr::path("pkg/foo.cc");
        assert!(parse_single_label(&expr, "//pkg:foo.cc").is_ok());
        assert!(matches!(
            parse_single_label(&expr, "//pkg:a\n//pkg:b"),
            Err(QueryError::Unparsable { .. })
        ));
        assert!(matches!(
            parse_single_label(&expr, "Loading: 0 packages loaded"),
            Err(QueryError::Unparsable { .. })
        ));
    }

    #[test]
    fn test_parse_label_lines_keeps_order() {
        let expr = QueryExpr::path("x");
        let labels = parse_label_lines(&expr, "//pkg:b\n\n//pkg:a").unwrap();
        let texts: Vec<_> = labels.iter().map(BuildLabel::as_str).collect();
        assert_eq!(texts, vec!["//pkg:b", "//pkg:a"]);
    }

    #[test]
    fn test_resolution_accessors() {
        let file_label = BuildLabel::parse("//pkg:foo.cc").unwrap();
        let owned = LabelResolution::Owned {
            file_label: file_label.clone(),
            package: "//pkg".into(),
            attribute: SourceAttr::Srcs,
            targets: vec![BuildLabel::parse("//pkg:foolib").unwrap()],
        };
        assert_eq!(owned.primary().map(BuildLabel::as_str), Some("//pkg:foolib"));
        assert_eq!(owned.package(), Some("//pkg"));

        let unref = LabelResolution::Unreferenced {
            file_label,
            package: "//pkg".into(),
        };
        assert_eq!(unref.primary(), None);
        assert_eq!(unref.package(), Some("//pkg"));

        let unowned = LabelResolution::Unowned {
            relative_path: "pkg/foo.cc".into(),
        };
        assert_eq!(unowned.package(), None);
    }

    #[test]
    fn test_resolution_serializes_with_kind_tag() {
        let res = LabelResolution::Owned {
            file_label: BuildLabel::parse("//pkg:foo.h").unwrap(),
            package: "//pkg".into(),
            attribute: SourceAttr::Hdrs,
            targets: vec![BuildLabel::parse("//pkg:foo_header").unwrap()],
        };
        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["kind"], "owned");
        assert_eq!(json["attribute"], "hdrs");
        assert_eq!(json["targets"][0], "//pkg:foo_header");
    }
}
