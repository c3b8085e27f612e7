//! Definition extractor: recognizes the schema compiler's fixed emission
//! shape and captures brace-balanced definition spans.
//!
//! The emitted shape is a naming comment (`// Name: ...`, optionally
//! followed by more comment lines), a derive attribute, and a
//! brace-delimited `pub struct`/`pub enum` body, optionally followed by an
//! `impl Name` block carrying a `validate` function. Bodies are captured by
//! an explicit brace-depth scan, not a single pattern, so nested braces in
//! field expressions or validation string literals never truncate a span.

use std::ops::Range;
use std::path::PathBuf;

use regex::Regex;
use tracing::{debug, warn};

use crate::resolve::resolve_type_expr;
use crate::types::{Field, TypeDefinition, TypeKind};

const HEADER_PATTERN: &str =
    r"(?m)^// (\w+): [^\n]*\n(?://[^\n]*\n)*#\[derive[^\]]*\]\npub (struct|enum) (\w+)\s*\{";

const FIELD_PATTERN: &str = r"(?m)^\s*pub\s+(\w+):\s*([^,\n]+)";

/// A corpus file together with its extracted definitions.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub path: PathBuf,
    pub text: String,
    pub defs: Vec<TypeDefinition>,
}

pub struct Extractor {
    header: Regex,
    field: Regex,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            header: Regex::new(HEADER_PATTERN).expect("header pattern is valid"),
            field: Regex::new(FIELD_PATTERN).expect("field pattern is valid"),
        }
    }

    /// Extracts every definition from `text` in order of appearance. A
    /// definition whose body cannot be brace-balanced is skipped with a
    /// diagnostic, never partially emitted.
    pub fn scan(&self, path: PathBuf, text: String) -> ScannedFile {
        let mut defs = Vec::new();
        for caps in self.header.captures_iter(&text) {
            let header = caps.get(0).expect("whole match");
            let comment_name = &caps[1];
            let kind = if &caps[2] == "struct" {
                TypeKind::Struct
            } else {
                TypeKind::Enum
            };
            let name = caps.get(3).expect("name group").as_str();
            if comment_name != name {
                debug!(
                    "{}: naming comment `{}` does not match definition `{}`, ignored",
                    path.display(),
                    comment_name,
                    name
                );
                continue;
            }
            let open = header.end() - 1;
            let Some(body_end) = balance_braces(&text, open) else {
                warn!(
                    "{}: unbalanced braces in `{}`, definition skipped",
                    path.display(),
                    name
                );
                continue;
            };
            let fields = if kind == TypeKind::Struct {
                self.parse_fields(&text, open + 1, body_end - 1)
            } else {
                Vec::new()
            };
            let validation_span = validation_block(&text, body_end, name);
            defs.push(TypeDefinition {
                name: name.to_string(),
                kind,
                fields,
                span: header.start()..body_end,
                validation_span,
                file: path.clone(),
            });
        }
        ScannedFile { path, text, defs }
    }

    fn parse_fields(&self, text: &str, start: usize, end: usize) -> Vec<Field> {
        let body = &text[start..end];
        let mut fields = Vec::new();
        for caps in self.field.captures_iter(body) {
            let expr = caps.get(2).expect("type expression group");
            let type_expr = expr.as_str().trim_end();
            let abs_start = start + expr.start();
            let resolved = resolve_type_expr(type_expr);
            fields.push(Field {
                name: caps[1].to_string(),
                type_expr: type_expr.to_string(),
                type_span: abs_start..abs_start + type_expr.len(),
                wrapper: resolved.wrapper,
                core_type: resolved.core,
            });
        }
        fields
    }
}

/// Captures an `impl <name>` block immediately following a definition,
/// provided it carries the generated `validate` function.
fn validation_block(text: &str, from: usize, name: &str) -> Option<Range<usize>> {
    let rest = &text[from..];
    let trimmed = rest.trim_start();
    let impl_start = from + (rest.len() - trimmed.len());
    let header = format!("impl {name} {{");
    if !trimmed.starts_with(&header) {
        return None;
    }
    let open = impl_start + header.len() - 1;
    let end = balance_braces(text, open)?;
    if !text[impl_start..end].contains("pub fn validate") {
        return None;
    }
    Some(impl_start..end)
}

/// Scans from the opening brace at `open` to its matching close, skipping
/// string literals (with escapes) and line comments. Returns the index one
/// past the closing brace, or None when the text ends first.
pub fn balance_braces(text: &str, open: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + 1);
                }
            }
            b'"' => {
                i += 1;
                while i < bytes.len() && bytes[i] != b'"' {
                    if bytes[i] == b'\\' {
                        i += 1;
                    }
                    i += 1;
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                while i < bytes.len() && bytes[i] != b'\n' {
                    i += 1;
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}
