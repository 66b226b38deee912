//! Build labels (`//package:target`).
//!
//! A [`BuildLabel`] is opaque apart from the split at its last `:` into a
//! package part and a target name. Labels are normally produced by the query
//! tool; the only hand-built labels are relative references found in BUILD
//! files (`:target`, `target`), resolved against the package they appear in.

use std::fmt;

use serde::{Serialize, Serializer};

/// Errors from label parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LabelError {
    #[error("label is empty")]
    Empty,

    #[error("label {0:?} contains whitespace")]
    Whitespace(String),

    #[error("label {0:?} is not absolute (expected `//` or `@`)")]
    NotAbsolute(String),

    #[error("label {0:?} has an empty target name")]
    EmptyTarget(String),

    #[error("label {0:?} has a malformed repository part")]
    BadRepository(String),
}

/// A canonical, absolute build label. Always carries an explicit target,
/// so `//pkg` is stored as `//pkg:pkg`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildLabel {
    text: String,
    colon: usize,
}

impl BuildLabel {
    /// Parse an absolute label (`//pkg:t`, `//pkg`, `@repo//pkg:t`, `@repo`).
    pub fn parse(s: &str) -> Result<Self, LabelError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(LabelError::Empty);
        }
        if s.chars().any(char::is_whitespace) {
            return Err(LabelError::Whitespace(s.to_string()));
        }

        let (repo, rest) = if let Some(stripped) = s.strip_prefix('@') {
            // `@@canonical` repositories are accepted as-is.
            let stripped = stripped.trim_start_matches('@');
            match stripped.find("//") {
                Some(idx) => (&s[..s.len() - stripped.len() + idx], &stripped[idx..]),
                None => {
                    if stripped.is_empty() || stripped.contains(':') || stripped.contains('/') {
                        return Err(LabelError::BadRepository(s.to_string()));
                    }
                    // `@repo` is shorthand for `@repo//:repo`.
                    return Ok(Self::assemble(s, "//", stripped));
                }
            }
        } else if s.starts_with("//") {
            ("", s)
        } else {
            return Err(LabelError::NotAbsolute(s.to_string()));
        };

        match rest.rfind(':') {
            Some(idx) => {
                let target = &rest[idx + 1..];
                if target.is_empty() {
                    return Err(LabelError::EmptyTarget(s.to_string()));
                }
                Ok(Self {
                    text: s.to_string(),
                    colon: repo.len() + idx,
                })
            }
            None => {
                let path = rest.trim_start_matches('/');
                let target = path.rsplit('/').next().unwrap_or_default();
                if target.is_empty() {
                    return Err(LabelError::EmptyTarget(s.to_string()));
                }
                Ok(Self::assemble(repo, rest, target))
            }
        }
    }

    /// Resolve a label as written inside a BUILD file of `package`
    /// (e.g. `//foo/bar`). Absolute labels are returned unchanged.
    pub fn resolve_relative(s: &str, package: &str) -> Result<Self, LabelError> {
        let s = s.trim();
        if s.starts_with("//") || s.starts_with('@') {
            return Self::parse(s);
        }
        if s.is_empty() {
            return Err(LabelError::Empty);
        }
        let target = s.strip_prefix(':').unwrap_or(s);
        if target.is_empty() {
            return Err(LabelError::EmptyTarget(s.to_string()));
        }
        Self::parse(&format!("{package}:{target}"))
    }

    /// The label for a package directory relative to the workspace root
    /// (`""` is the root package `//`).
    pub fn package_of(rel_dir: &str) -> String {
        format!("//{}", rel_dir.trim_matches('/'))
    }

    fn assemble(repo: &str, package: &str, target: &str) -> Self {
        let text = format!("{repo}{package}:{target}");
        let colon = repo.len() + package.len();
        Self { text, colon }
    }

    /// The full label text.
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Everything before the last `:` (e.g. `//pkg` or `@repo//pkg`).
    pub fn package(&self) -> &str {
        &self.text[..self.colon]
    }

    /// Everything after the last `:`.
    pub fn target(&self) -> &str {
        &self.text[self.colon + 1..]
    }

    /// The `@repo` prefix for labels in an external repository.
    pub fn repository(&self) -> Option<&str> {
        if !self.text.starts_with('@') {
            return None;
        }
        self.text.find("//").map(|idx| &self.text[..idx])
    }

    /// The package directory relative to its repository root (`foo/bar`, or
    /// `""` for the root package).
    pub fn package_path(&self) -> &str {
        let package = self.package();
        match package.find("//") {
            Some(idx) => &package[idx + 2..],
            None => "",
        }
    }
}

impl fmt::Display for BuildLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for BuildLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}
