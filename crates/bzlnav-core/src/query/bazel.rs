//! Runs `bazel query` as a subprocess.
//!
//! The command line is `<command...> query <expr> <flags...>`, executed in the
//! workspace root. The expression is passed as a single argument so paths and
//! `attr(...)` expressions never need shell quoting.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use bzlnav_config::QueryConfig;

use crate::BoxFuture;

use super::{QueryError, QueryExpr, QueryTool, strip_trailing_newline};

/// Query tool backed by the Bazel (or Bazelisk) executable.
#[derive(Debug, Clone)]
pub struct BazelQuery {
    command: Vec<String>,
    flags: Vec<String>,
    timeout: Option<Duration>,
}

impl BazelQuery {
    /// Create a query tool running `command` (program plus leading args).
    pub fn new(command: Vec<String>, flags: Vec<String>) -> Self {
        Self {
            command,
            flags,
            timeout: None,
        }
    }

    pub fn from_config(config: &QueryConfig) -> Self {
        Self::new(config.command.clone(), config.flags.clone()).with_timeout(config.timeout())
    }

    /// Kill the query and report [`QueryError::Timeout`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The full argument vector (after the program) for `expr`.
    pub fn args(&self, expr: &QueryExpr) -> Vec<String> {
        let mut args: Vec<String> = self.command.iter().skip(1).cloned().collect();
        args.push("query".to_string());
        args.push(expr.to_string());
        args.extend(self.flags.iter().cloned());
        args
    }
}

impl Default for BazelQuery {
    fn default() -> Self {
        Self::from_config(&QueryConfig::default())
    }
}

impl QueryTool for BazelQuery {
    fn name(&self) -> &str {
        self.command.first().map(String::as_str).unwrap_or("bazel")
    }

    fn query<'a>(
        &'a self,
        workspace: &'a Path,
        expr: &'a QueryExpr,
    ) -> BoxFuture<'a, Result<String, QueryError>> {
        Box::pin(async move {
            let program = self.name().to_string();
            let args = self.args(expr);
            tracing::debug!(
                program = %program,
                expr = %expr,
                workspace = %workspace.display(),
                "Running build query"
            );

            let start = std::time::Instant::now();

            let child = tokio::process::Command::new(&program)
                .args(&args)
                .current_dir(workspace)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|source| QueryError::Spawn {
                    program: program.clone(),
                    source,
                })?;

            let output = match self.timeout {
                Some(dur) => match tokio::time::timeout(dur, child.wait_with_output()).await {
                    Ok(result) => result.map_err(QueryError::Wait)?,
                    Err(_) => {
                        tracing::warn!(expr = %expr, timeout = ?dur, "Build query timed out");
                        return Err(QueryError::Timeout(dur));
                    }
                },
                None => child.wait_with_output().await.map_err(QueryError::Wait)?,
            };

            tracing::debug!(
                expr = %expr,
                status = %output.status,
                elapsed = ?start.elapsed(),
                "Build query finished"
            );

            if !output.status.success() {
                return Err(QueryError::Failed {
                    expr: expr.to_string(),
                    code: output.status.code(),
                    stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
                });
            }

            let stdout = String::from_utf8(output.stdout)?;
            Ok(strip_trailing_newline(stdout))
        })
    }
}
