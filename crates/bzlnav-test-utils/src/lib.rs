#![deny(unsafe_code)]

//! Shared test utilities for the bzlnav workspace.
//!
//! Provides throwaway workspaces on disk, a scripted query tool, a recording
//! editor host, config builders, and tracing helpers so that individual
//! crate tests stay concise and consistent.
//!
//! Add this crate as a `[dev-dependency]` in any workspace member:
//!
//! ```toml
//! [dev-dependencies]
//! bzlnav-test-utils = { workspace = true }
//! ```

pub mod config;
pub mod host;
pub mod query;
pub mod tracing_setup;
pub mod workspace;

pub use host::RecordingHost;
pub use query::ScriptedQuery;
pub use workspace::TestWorkspace;
