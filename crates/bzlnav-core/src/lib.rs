#![deny(unsafe_code)]

//! bzlnav core: build label resolution and BUILD file navigation.
//!
//! Resolves which build target owns a source file by asking an external
//! build-graph query tool, and finds definitions of labels and symbols in
//! BUILD and `.bzl` buffers. Editors reach this through the `bzlnav` CLI;
//! everything here is written against injectable [`QueryTool`] and
//! [`EditorHost`] traits so it can be driven without Bazel or an editor.

use std::future::Future;
use std::pin::Pin;

/// A type-erased, `Send`-safe, boxed future, the return type for async
/// trait methods that need dynamic dispatch (`dyn QueryTool`).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// "Jump to definition" and "show build label" actions.
pub mod actions;
/// Buffer snapshots.
pub mod buffer;
/// Compile-time build metadata (version, git hash, profile).
pub mod build_info;
/// Definition lookup in BUILD and `.bzl` files.
pub mod definition;
/// Editor host trait, ex-command rendering, and navigation.
pub mod editor;
/// Build label parsing.
pub mod label;
/// Build-graph query expressions and tools.
pub mod query;
/// Owning-target resolution for source files.
pub mod resolver;
/// Workspace root discovery.
pub mod workspace;

pub use actions::{ActionOutcome, FailureKind, Navigator};
pub use buffer::{BufferSnapshot, Cursor};
pub use definition::{BuildFileFinder, DefinitionError, DefinitionFinder, DefinitionLocation};
pub use editor::{EditorCommand, EditorHost, ExScriptHost, HostError, escape_path, navigate_to};
pub use label::{BuildLabel, LabelError};
pub use query::{BazelQuery, QueryError, QueryExpr, QueryTool, SourceAttr};
pub use resolver::{LabelResolution, LabelResolver, ResolveError};
pub use workspace::{WorkspaceError, WorkspaceLocator};
