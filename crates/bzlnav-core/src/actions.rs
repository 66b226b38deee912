//! User-triggered actions: "jump to definition" and "show build label".
//!
//! Each action reads a fresh snapshot from the host, does its work, and
//! reports back through [`EditorHost::message`]. Nothing escapes an action:
//! every failure becomes an [`ActionOutcome::Failed`] so the editor session
//! survives and the next invocation starts clean.

use std::sync::Arc;

use bzlnav_config::AppConfig;
use serde::Serialize;
use tracing::{info, warn};

use crate::definition::{BuildFileFinder, DefinitionError, DefinitionFinder, DefinitionLocation};
use crate::editor::{EditorHost, navigate_to};
use crate::label::BuildLabel;
use crate::query::{BazelQuery, QueryError, QueryTool, SourceAttr};
use crate::resolver::{LabelResolution, LabelResolver, ResolveError};
use crate::workspace::WorkspaceLocator;

/// Message shown when there is nothing to jump to.
pub const NO_DEFINITION_MESSAGE: &str = "Failed to find the definition";

/// Why an action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NotInWorkspace,
    QueryTool,
    Timeout,
    Resolution,
    Navigation,
}

/// Result of one user action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The cursor moved to the definition.
    Jumped { location: DefinitionLocation },
    /// No definition under the cursor; the cursor did not move.
    NotFound,
    /// A target lists the file.
    Label {
        label: BuildLabel,
        package: String,
        attribute: SourceAttr,
        others: Vec<BuildLabel>,
    },
    /// The build does not reference the file from any rule.
    NoLabel { package: Option<String> },
    Failed { kind: FailureKind, message: String },
}

impl ActionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self, ActionOutcome::Failed { .. })
    }

    fn failed(kind: FailureKind, message: impl Into<String>) -> Self {
        ActionOutcome::Failed {
            kind,
            message: message.into(),
        }
    }
}

/// Runs the editor actions against a resolver and a definition finder.
pub struct Navigator {
    resolver: LabelResolver,
    finder: Box<dyn DefinitionFinder>,
}

impl Navigator {
    pub fn new(resolver: LabelResolver, finder: Box<dyn DefinitionFinder>) -> Self {
        Self { resolver, finder }
    }

    /// Wire up the production components from configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let locator = WorkspaceLocator::from_config(&config.workspace);
        let tool: Arc<dyn QueryTool> = Arc::new(BazelQuery::from_config(&config.query));
        let finder = BuildFileFinder::from_config(locator.clone(), &config.definition);
        Self::new(LabelResolver::new(locator, tool), Box::new(finder))
    }

    /// Jump to the definition of the symbol under the cursor.
    pub async fn find_definition(&self, host: &mut dyn EditorHost) -> ActionOutcome {
        let snapshot = host.snapshot();
        let location = match self.finder.find_definition(&snapshot).await {
            Ok(Some(location)) => location,
            Ok(None) => {
                info!(path = %snapshot.path().display(), "No definition under cursor");
                host.message(NO_DEFINITION_MESSAGE);
                return ActionOutcome::NotFound;
            }
            Err(err) => {
                warn!(error = %err, "Definition lookup failed");
                let kind = match err {
                    DefinitionError::NotInWorkspace(_) => FailureKind::NotInWorkspace,
                    _ => FailureKind::Resolution,
                };
                host.message(&format!("{NO_DEFINITION_MESSAGE}: {err}"));
                return ActionOutcome::failed(kind, err.to_string());
            }
        };

        match navigate_to(host, &location) {
            Ok(()) => ActionOutcome::Jumped { location },
            Err(err) => {
                warn!(error = %err, "Navigation failed");
                host.message(&err.to_string());
                ActionOutcome::failed(FailureKind::Navigation, err.to_string())
            }
        }
    }

    /// Show the build label of the target that lists the current file.
    pub async fn show_label(&self, host: &mut dyn EditorHost) -> ActionOutcome {
        let snapshot = host.snapshot();
        let outcome = match self.resolver.resolve(&snapshot).await {
            Ok(LabelResolution::Owned {
                package,
                attribute,
                mut targets,
                ..
            }) if !targets.is_empty() => {
                let label = targets.remove(0);
                ActionOutcome::Label {
                    label,
                    package,
                    attribute,
                    others: targets,
                }
            }
            Ok(resolution) => ActionOutcome::NoLabel {
                package: resolution.package().map(str::to_string),
            },
            Err(err) => {
                warn!(error = %err, "Label resolution failed");
                let kind = match err {
                    ResolveError::NotInWorkspace(_) => FailureKind::NotInWorkspace,
                    ResolveError::Query(QueryError::Timeout(_)) => FailureKind::Timeout,
                    ResolveError::Query(_) => FailureKind::QueryTool,
                    ResolveError::Workspace(_) => FailureKind::Resolution,
                };
                ActionOutcome::failed(kind, err.to_string())
            }
        };

        host.message(&label_message(&outcome));
        outcome
    }
}

fn label_message(outcome: &ActionOutcome) -> String {
    match outcome {
        ActionOutcome::Label { label, others, .. } if others.is_empty() => label.to_string(),
        ActionOutcome::Label { label, others, .. } => {
            format!("{label} (+{} more)", others.len())
        }
        ActionOutcome::NoLabel {
            package: Some(package),
        } => format!("No rule in {package} references this file"),
        ActionOutcome::NoLabel { package: None } => {
            "This file is not known to the build".to_string()
        }
        ActionOutcome::Failed {
            kind: FailureKind::NotInWorkspace,
            ..
        } => "failed: not inside a workspace".to_string(),
        ActionOutcome::Failed { message, .. } => format!("failed: {message}"),
        ActionOutcome::Jumped { .. } | ActionOutcome::NotFound => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_label_messages() {
        let label = BuildLabel::parse("//pkg:foolib").unwrap();
        let outcome = ActionOutcome::Label {
            label: label.clone(),
            package: "//pkg".into(),
            attribute: SourceAttr::Srcs,
            others: vec![],
        };
        assert_eq!(label_message(&outcome), "//pkg:foolib");

        let outcome = ActionOutcome::Label {
            label,
            package: "//pkg".into(),
            attribute: SourceAttr::Srcs,
            others: vec![BuildLabel::parse("//pkg:other").unwrap()],
        };
        assert_eq!(label_message(&outcome), "//pkg:foolib (+1 more)");

        let outcome = ActionOutcome::NoLabel {
            package: Some("//pkg".into()),
        };
        assert_eq!(label_message(&outcome), "No rule in //pkg references this file");

        let outcome = ActionOutcome::failed(FailureKind::NotInWorkspace, "whatever");
        assert_eq!(label_message(&outcome), "failed: not inside a workspace");
    }

    #[test]
    fn test_outcome_json_shape() {
        let outcome = ActionOutcome::failed(FailureKind::Timeout, "query timed out after 1s");
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["outcome"], "failed");
        assert_eq!(json["kind"], "timeout");
        assert!(outcome.is_failure());

        let json = serde_json::to_value(ActionOutcome::NotFound).unwrap();
        assert_eq!(json["outcome"], "not_found");
    }
}
