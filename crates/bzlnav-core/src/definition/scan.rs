//! Line-oriented scanning of Starlark source.
//!
//! This is not a parser. It recognises just enough of BUILD and `.bzl`
//! syntax to find the token under the cursor, `load(...)` statements, rule
//! `name = "..."` attributes and top-level definitions.

/// Upper bound on the number of lines a single `load(...)` may span.
const MAX_LOAD_LINES: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanError {
    #[error("unterminated string starting at column {column}")]
    UnterminatedString { column: usize },
}

/// The token under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// Contents of a quoted string literal, without the quotes.
    Str(&'a str),
    /// A bare identifier.
    Ident(&'a str),
}

/// One `name = "value"` / `"value"` binding of a `load(...)` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadBinding {
    /// Name bound in the loading file.
    pub local: String,
    /// Name exported by the loaded file.
    pub exported: String,
}

/// A parsed `load(...)` statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadStatement {
    /// 1-based row of the `load(` line.
    pub first_row: usize,
    /// 1-based row of the closing parenthesis.
    pub last_row: usize,
    /// The loaded file's label, as written.
    pub module: String,
    pub bindings: Vec<LoadBinding>,
}

impl LoadStatement {
    pub fn spans(&self, row: usize) -> bool {
        (self.first_row..=self.last_row).contains(&row)
    }

    /// Binding whose exported name is `name`.
    pub fn by_exported(&self, name: &str) -> Option<&LoadBinding> {
        self.bindings.iter().find(|b| b.exported == name)
    }

    /// Binding whose local name is `name`.
    pub fn by_local(&self, name: &str) -> Option<&LoadBinding> {
        self.bindings.iter().find(|b| b.local == name)
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Index of the closing `quote` for a literal whose contents start at `from`.
fn find_closing(bytes: &[u8], from: usize, quote: &[u8]) -> Option<usize> {
    let mut j = from;
    while j < bytes.len() {
        if bytes[j] == b'\\' {
            j += 2;
            continue;
        }
        if bytes[j..].starts_with(quote) {
            return Some(j);
        }
        j += 1;
    }
    None
}

/// Find the token covering byte column `col` of `line`.
///
/// Returns `Ok(None)` when the cursor sits on whitespace, punctuation, a
/// comment, or past the end of the line.
pub fn token_at(line: &str, col: usize) -> Result<Option<Token<'_>>, ScanError> {
    let bytes = line.as_bytes();
    if col >= bytes.len() {
        return Ok(None);
    }

    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                if col >= i {
                    return Ok(None);
                }
                break;
            }
            q @ (b'"' | b'\'') => {
                let triple = [q, q, q];
                let delim: &[u8] = if bytes[i..].starts_with(&triple) {
                    &triple
                } else {
                    &triple[..1]
                };
                let content_start = i + delim.len();
                match find_closing(bytes, content_start, delim) {
                    Some(close) => {
                        let stop = close + delim.len();
                        if (i..stop).contains(&col) {
                            return Ok(Some(Token::Str(&line[content_start..close])));
                        }
                        i = stop;
                    }
                    // A triple-quoted string continuing on later lines.
                    None if delim.len() == 3 => {
                        if col >= i {
                            return Ok(None);
                        }
                        break;
                    }
                    None => {
                        if col >= i {
                            return Err(ScanError::UnterminatedString { column: i });
                        }
                        break;
                    }
                }
            }
            _ => i += 1,
        }
    }

    if !is_ident_byte(bytes[col]) {
        return Ok(None);
    }
    let start = (0..col)
        .rev()
        .take_while(|&k| is_ident_byte(bytes[k]))
        .last()
        .unwrap_or(col);
    let end = (col..bytes.len())
        .find(|&k| !is_ident_byte(bytes[k]))
        .unwrap_or(bytes.len());
    if bytes[start].is_ascii_digit() {
        return Ok(None);
    }
    Ok(Some(Token::Ident(&line[start..end])))
}

/// Every top-level `load(...)` statement in the buffer.
pub fn load_statements(lines: &[String]) -> Vec<LoadStatement> {
    lines
        .iter()
        .enumerate()
        .filter(|(_, line)| line.starts_with("load("))
        .filter_map(|(idx, _)| parse_load(lines, idx))
        .collect()
}

fn parse_load(lines: &[String], start: usize) -> Option<LoadStatement> {
    let window = &lines[start..lines.len().min(start + MAX_LOAD_LINES)];
    let text = window.join("\n");
    let bytes = text.as_bytes();

    let mut module: Option<String> = None;
    let mut bindings = Vec::new();
    let mut pending: Option<String> = None;
    let mut i = "load(".len();

    while i < bytes.len() {
        match bytes[i] {
            b'#' => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            q @ (b'"' | b'\'') => {
                let close = find_closing(bytes, i + 1, &[q])?;
                let value = text[i + 1..close].to_string();
                if module.is_none() {
                    module = Some(value);
                } else {
                    bindings.push(LoadBinding {
                        local: pending.take().unwrap_or_else(|| value.clone()),
                        exported: value,
                    });
                }
                i = close + 1;
            }
            b')' => {
                let newlines = text[..i].matches('\n').count();
                return Some(LoadStatement {
                    first_row: start + 1,
                    last_row: start + newlines + 1,
                    module: module?,
                    bindings,
                });
            }
            b if is_ident_byte(b) => {
                let ident_start = i;
                while i < bytes.len() && is_ident_byte(bytes[i]) {
                    i += 1;
                }
                let mut k = i;
                while k < bytes.len() && bytes[k].is_ascii_whitespace() {
                    k += 1;
                }
                if k < bytes.len() && bytes[k] == b'=' {
                    pending = Some(text[ident_start..i].to_string());
                    i = k + 1;
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Whether `line` carries a `name = "<name>"` attribute.
fn has_name_attr(line: &str, name: &str) -> bool {
    let bytes = line.as_bytes();
    line.match_indices("name").any(|(idx, _)| {
        if idx > 0 && is_ident_byte(bytes[idx - 1]) {
            return false;
        }
        let rest = line[idx + 4..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            return false;
        };
        let rest = rest.trim_start();
        ['"', '\''].iter().any(|&q| {
            rest.strip_prefix(q)
                .and_then(|r| r.strip_prefix(name))
                .is_some_and(|r| r.starts_with(q))
        })
    })
}

/// 1-based row of the rule declaring `name = "<name>"`. Points at the rule
/// call (`cc_library(`) when it starts at column 0 above the attribute.
pub fn find_rule_row(lines: &[String], name: &str) -> Option<usize> {
    let attr_idx = lines.iter().position(|l| has_name_attr(l, name))?;
    let rule_idx = (0..=attr_idx)
        .rev()
        .find(|&k| {
            lines[k]
                .bytes()
                .next()
                .is_some_and(|b| !b.is_ascii_whitespace() && b != b'#' && b != b')')
        })
        .filter(|&k| lines[k].contains('('))
        .unwrap_or(attr_idx);
    Some(rule_idx + 1)
}

/// 1-based row of a top-level `def <symbol>(` or `<symbol> = ...`.
pub fn find_symbol_row(lines: &[String], symbol: &str) -> Option<usize> {
    lines
        .iter()
        .position(|line| {
            if let Some(rest) = line.strip_prefix("def ") {
                let rest = rest.trim_start();
                return rest
                    .strip_prefix(symbol)
                    .is_some_and(|r| r.trim_start().starts_with('('));
            }
            line.strip_prefix(symbol).is_some_and(|r| {
                let r = r.trim_start();
                r.starts_with('=') && !r.starts_with("==")
            })
        })
        .map(|idx| idx + 1)
}
