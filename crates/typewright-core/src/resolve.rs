//! Strips wrapper containers from a declared field type down to the core
//! referenced type.

use crate::types::WrapperKind;

/// A declared type expression reduced to its innermost named type.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedType {
    pub core: String,
    pub wrapper: WrapperKind,
}

/// Peels `wrapper<inner>` when `s` is exactly that shape.
fn peel<'a>(s: &'a str, wrapper: &str) -> Option<&'a str> {
    let rest = s.strip_prefix(wrapper)?.strip_prefix('<')?;
    let inner = rest.strip_suffix('>')?;
    Some(inner.trim())
}

/// Strips at most one `Box` layer, then `Option`/`Vec` wrappers in either
/// order (both may co-occur), yielding the core type name and a precise
/// wrapper classification.
pub fn resolve_type_expr(expr: &str) -> ResolvedType {
    let mut s = expr.trim().trim_end_matches(',').trim_end();
    let mut optional = false;
    let mut sequence = false;
    let mut boxed = false;
    loop {
        if let Some(inner) = peel(s, "Option") {
            optional = true;
            s = inner;
        } else if let Some(inner) = peel(s, "Vec") {
            sequence = true;
            s = inner;
        } else if !boxed {
            if let Some(inner) = peel(s, "Box") {
                boxed = true;
                s = inner;
            } else {
                break;
            }
        } else {
            break;
        }
    }
    let core: String = s
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let wrapper = if boxed {
        WrapperKind::AlreadyBoxed
    } else {
        match (optional, sequence) {
            (false, false) => WrapperKind::None,
            (true, false) => WrapperKind::Optional,
            (false, true) => WrapperKind::Sequence,
            (true, true) => WrapperKind::OptionalSequence,
        }
    };
    ResolvedType { core, wrapper }
}
