//! Data model for extracted composite-type definitions

use std::ops::Range;
use std::path::PathBuf;

/// Exact-match primitive set; these names are never composite references.
pub const PRIMITIVE_TYPES: &[&str] = &[
    "String", "bool", "f64", "f32", "u64", "i64", "u32", "i32", "u16", "i16", "u8", "i8", "usize",
    "isize", "char",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVE_TYPES.contains(&name)
}

/// Cardinality and indirection wrappers around a field's core type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WrapperKind {
    None,
    Optional,
    Sequence,
    OptionalSequence,
    /// The field already carries a `Box` layer and is never re-wrapped.
    AlreadyBoxed,
}

impl WrapperKind {
    /// True for sequence-valued fields (`Vec<T>` or `Option<Vec<T>>`).
    pub fn is_sequence(self) -> bool {
        matches!(self, WrapperKind::Sequence | WrapperKind::OptionalSequence)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    /// Declared type expression exactly as written in the source.
    pub type_expr: String,
    /// Byte range of `type_expr` within the originating file.
    pub type_span: Range<usize>,
    pub wrapper: WrapperKind,
    pub core_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Struct,
    Enum,
}

/// One extracted definition: naming comment through closing brace, plus an
/// optional immediately-following validation impl for the same name.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDefinition {
    pub name: String,
    pub kind: TypeKind,
    pub fields: Vec<Field>,
    pub span: Range<usize>,
    pub validation_span: Option<Range<usize>>,
    pub file: PathBuf,
}

impl TypeDefinition {
    /// Full byte range to relocate or delete: definition plus validation block.
    pub fn full_span(&self) -> Range<usize> {
        match &self.validation_span {
            Some(v) => self.span.start..v.end,
            None => self.span.clone(),
        }
    }

    /// Lowercase-named definitions are generator-private helpers.
    pub fn is_private_helper(&self) -> bool {
        self.name.chars().next().is_some_and(|c| c.is_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_set_is_exact_match() {
        assert!(is_primitive("String"));
        assert!(is_primitive("u8"));
        assert!(is_primitive("char"));
        assert!(!is_primitive("Strings"));
        assert!(!is_primitive("MessageHeader91"));
        assert!(!is_primitive(""));
    }

    #[test]
    fn test_sequence_wrappers() {
        assert!(WrapperKind::Sequence.is_sequence());
        assert!(WrapperKind::OptionalSequence.is_sequence());
        assert!(!WrapperKind::None.is_sequence());
        assert!(!WrapperKind::Optional.is_sequence());
        assert!(!WrapperKind::AlreadyBoxed.is_sequence());
    }
}
