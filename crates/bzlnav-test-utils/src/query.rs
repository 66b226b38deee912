//! A [`QueryTool`] that answers from a script instead of spawning Bazel.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use bzlnav_core::{BoxFuture, QueryError, QueryExpr, QueryTool};

#[derive(Debug, Clone)]
enum Response {
    Output(String),
    Fail { code: i32, stderr: String },
    Timeout(Duration),
}

/// Canned query answers keyed by the rendered expression.
///
/// Unknown expressions answer with empty output. Every call is recorded so
/// tests can assert on the exact queries issued.
///
/// # Example
///
/// ```ignore
/// let tool = Arc::new(
///     ScriptedQuery::new()
///         .respond("pkg/foo.cc", "//pkg:foo.cc")
///         .respond("attr('srcs',//pkg:foo.cc,//pkg:*)", "//pkg:foolib"),
/// );
/// ```
#[derive(Debug, Default)]
pub struct ScriptedQuery {
    responses: HashMap<String, Response>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `expr` with `output`.
    pub fn respond(mut self, expr: &str, output: &str) -> Self {
        self.responses
            .insert(expr.to_string(), Response::Output(output.to_string()));
        self
    }

    /// Fail `expr` as if the tool exited with `code`.
    pub fn fail(mut self, expr: &str, code: i32, stderr: &str) -> Self {
        self.responses.insert(
            expr.to_string(),
            Response::Fail {
                code,
                stderr: stderr.to_string(),
            },
        );
        self
    }

    /// Report a timeout for `expr`.
    pub fn time_out(mut self, expr: &str, after: Duration) -> Self {
        self.responses
            .insert(expr.to_string(), Response::Timeout(after));
        self
    }

    /// Every expression queried so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

impl QueryTool for ScriptedQuery {
    fn name(&self) -> &str {
        "scripted"
    }

    fn query<'a>(
        &'a self,
        _workspace: &'a Path,
        expr: &'a QueryExpr,
    ) -> BoxFuture<'a, Result<String, QueryError>> {
        let key = expr.to_string();
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(key.clone());
        }
        let response = self.responses.get(&key).cloned();

        Box::pin(async move {
            match response {
                None => Ok(String::new()),
                Some(Response::Output(out)) => Ok(out),
                Some(Response::Fail { code, stderr }) => Err(QueryError::Failed {
                    expr: key,
                    code: Some(code),
                    stderr,
                }),
                Some(Response::Timeout(after)) => Err(QueryError::Timeout(after)),
            }
        })
    }
}
