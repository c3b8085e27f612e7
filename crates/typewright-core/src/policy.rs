//! Indirection policy engine: configurable, independently toggleable
//! strategies deciding per-field boxing.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::graph::{NestingDepths, TypeGraph};
use crate::types::{is_primitive, Field, TypeDefinition, WrapperKind};

/// Configuration for boxing decisions, round-trippable as pretty-printed
/// JSON. Missing keys fall back to the corpus defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxConfig {
    /// Core types boxed wherever they appear.
    pub always_box_types: BTreeSet<String>,
    /// Box sequence elements whose core type matches one of these.
    pub box_in_vec_patterns: Vec<String>,
    /// Box sequence elements when the enclosing type matches one of these.
    pub box_vec_if_parent_matches: Vec<String>,
    /// Size heuristic: box sequence elements of types with at least this
    /// many fields.
    pub min_fields_to_box: usize,
    /// Depth heuristic: box sequence elements of types nested at least this
    /// deep.
    pub max_nesting_depth: u32,
    pub use_element_patterns: bool,
    pub use_parent_patterns: bool,
    pub use_size_heuristic: bool,
    pub use_nesting_analysis: bool,
}

impl Default for BoxConfig {
    fn default() -> Self {
        let always_box = [
            "ReportEntry101",
            "ReportEntry102",
            "ReportEntry103",
            "EntryDetails91",
            "EntryDetails92",
            "EntryDetails93",
            "EntryTransaction101",
            "EntryTransaction102",
            "EntryTransaction103",
            "TransactionParties61",
            "TransactionParties62",
            "TransactionParties63",
            "TransactionAgents51",
            "TransactionAgents52",
            "TransactionAgents53",
            "RemittanceInformation161",
            "RemittanceInformation162",
            "RemittanceInformation163",
        ];
        Self {
            always_box_types: always_box.iter().map(|s| s.to_string()).collect(),
            box_in_vec_patterns: vec![
                r".*Entry\d+$".to_string(),
                r".*Transaction\d+$".to_string(),
                r".*Details\d+$".to_string(),
                r".*Parties\d+$".to_string(),
            ],
            box_vec_if_parent_matches: vec![
                r".*Report\d+$".to_string(),
                r".*Statement\d+$".to_string(),
            ],
            min_fields_to_box: 10,
            max_nesting_depth: 4,
            use_element_patterns: true,
            use_parent_patterns: true,
            use_size_heuristic: true,
            use_nesting_analysis: true,
        }
    }
}

impl BoxConfig {
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| CoreError::Config(format!("cannot read {}: {e}", path.display())))?;
        serde_json::from_str(&text)
            .map_err(|e| CoreError::Config(format!("malformed {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        let text =
            serde_json::to_string_pretty(self).map_err(|e| CoreError::Config(e.to_string()))?;
        std::fs::write(path, text + "\n")?;
        Ok(())
    }
}

/// Which strategy decided a boxing; carried for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    Explicit,
    ElementPattern,
    ParentPattern,
    Size,
    Depth,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Strategy::Explicit => "explicit list",
            Strategy::ElementPattern => "element pattern",
            Strategy::ParentPattern => "parent pattern",
            Strategy::Size => "size heuristic",
            Strategy::Depth => "nesting depth",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BoxDecision {
    pub type_name: String,
    pub field_name: String,
    pub strategy: Strategy,
}

/// Evaluates the strategy OR over one immutable analysis state: the config,
/// the corpus-wide graph and the precomputed depths.
#[derive(Debug)]
pub struct PolicyEngine<'a> {
    config: &'a BoxConfig,
    graph: &'a TypeGraph,
    depths: &'a NestingDepths,
    element_patterns: Vec<Regex>,
    parent_patterns: Vec<Regex>,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(
        config: &'a BoxConfig,
        graph: &'a TypeGraph,
        depths: &'a NestingDepths,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            element_patterns: compile_anchored(&config.box_in_vec_patterns)?,
            parent_patterns: compile_anchored(&config.box_vec_if_parent_matches)?,
            config,
            graph,
            depths,
        })
    }

    /// Returns the first firing strategy for `field` of `parent`, or None
    /// when the field must keep its declared shape. Primitive fields and
    /// fields already wrapped in indirection never fire.
    pub fn evaluate(&self, parent: &TypeDefinition, field: &Field) -> Option<Strategy> {
        if is_primitive(&field.core_type) || field.wrapper == WrapperKind::AlreadyBoxed {
            return None;
        }
        if self.config.always_box_types.contains(&field.core_type) {
            return Some(Strategy::Explicit);
        }
        // The remaining strategies only apply to sequence-wrapped fields.
        if !field.wrapper.is_sequence() {
            return None;
        }
        if self.config.use_element_patterns
            && self
                .element_patterns
                .iter()
                .any(|p| p.is_match(&field.core_type))
        {
            return Some(Strategy::ElementPattern);
        }
        if self.config.use_parent_patterns
            && self.parent_patterns.iter().any(|p| p.is_match(&parent.name))
        {
            return Some(Strategy::ParentPattern);
        }
        if self.config.use_size_heuristic
            && self
                .graph
                .field_count(&field.core_type)
                .is_some_and(|n| n >= self.config.min_fields_to_box)
        {
            return Some(Strategy::Size);
        }
        if self.config.use_nesting_analysis
            && self.graph.contains(&field.core_type)
            && self.depths.get(&field.core_type) >= self.config.max_nesting_depth
        {
            return Some(Strategy::Depth);
        }
        None
    }
}

/// Patterns match from the start of the name, mirroring the configured
/// shape-pattern semantics.
fn compile_anchored(patterns: &[String]) -> Result<Vec<Regex>, CoreError> {
    patterns
        .iter()
        .map(|p| {
            Regex::new(&format!("^(?:{p})"))
                .map_err(|e| CoreError::InvalidPattern(format!("{p}: {e}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Extractor;
    use crate::types::TypeKind;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    fn bare_config() -> BoxConfig {
        BoxConfig {
            always_box_types: BTreeSet::new(),
            box_in_vec_patterns: Vec::new(),
            box_vec_if_parent_matches: Vec::new(),
            min_fields_to_box: 10,
            max_nesting_depth: 4,
            use_element_patterns: true,
            use_parent_patterns: true,
            use_size_heuristic: true,
            use_nesting_analysis: true,
        }
    }

    fn parent(name: &str) -> TypeDefinition {
        TypeDefinition {
            name: name.to_string(),
            kind: TypeKind::Struct,
            fields: Vec::new(),
            span: 0..0,
            validation_span: None,
            file: PathBuf::from("camt_052_001_08.rs"),
        }
    }

    fn field(type_expr: &str) -> Field {
        let resolved = crate::resolve::resolve_type_expr(type_expr);
        Field {
            name: "f".to_string(),
            type_expr: type_expr.to_string(),
            type_span: 0..type_expr.len(),
            wrapper: resolved.wrapper,
            core_type: resolved.core,
        }
    }

    fn empty_analysis() -> (TypeGraph, NestingDepths) {
        let graph = TypeGraph::build(std::iter::empty());
        let depths = NestingDepths::compute(&graph);
        (graph, depths)
    }

    #[test]
    fn test_no_strategy_means_no_boxing() {
        let config = bare_config();
        let (graph, depths) = empty_analysis();
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("Vec<Plain1>")), None);
    }

    #[test]
    fn test_primitives_and_boxed_fields_never_fire() {
        let mut config = bare_config();
        config.always_box_types.insert("String".to_string());
        config.always_box_types.insert("ReportEntry101".to_string());
        let (graph, depths) = empty_analysis();
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("Vec<String>")), None);
        assert_eq!(
            engine.evaluate(&parent("AnyType1"), &field("Vec<Box<ReportEntry101>>")),
            None
        );
    }

    #[test]
    fn test_explicit_list_fires_for_any_wrapper_shape() {
        let mut config = bare_config();
        config.always_box_types.insert("TransactionParties61".to_string());
        let (graph, depths) = empty_analysis();
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(
            engine.evaluate(&parent("AnyType1"), &field("TransactionParties61")),
            Some(Strategy::Explicit)
        );
        assert_eq!(
            engine.evaluate(&parent("AnyType1"), &field("Vec<TransactionParties61>")),
            Some(Strategy::Explicit)
        );
    }

    #[test]
    fn test_element_pattern_requires_sequence_and_flag() {
        let mut config = bare_config();
        config.box_in_vec_patterns = vec![r".*Entry\d+$".to_string()];
        let (graph, depths) = empty_analysis();
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(
            engine.evaluate(&parent("AnyType1"), &field("Vec<ReportEntry101>")),
            Some(Strategy::ElementPattern)
        );
        // Not sequence-wrapped: no firing.
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("ReportEntry101")), None);

        config.use_element_patterns = false;
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("Vec<ReportEntry101>")), None);
    }

    #[test]
    fn test_parent_pattern_matches_enclosing_type() {
        let mut config = bare_config();
        config.box_vec_if_parent_matches = vec![r".*Report\d+$".to_string()];
        let (graph, depths) = empty_analysis();
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(
            engine.evaluate(&parent("AccountReport25"), &field("Vec<Plain1>")),
            Some(Strategy::ParentPattern)
        );
        assert_eq!(engine.evaluate(&parent("Unrelated1"), &field("Vec<Plain1>")), None);

        config.use_parent_patterns = false;
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(engine.evaluate(&parent("AccountReport25"), &field("Vec<Plain1>")), None);
    }

    #[test]
    fn test_size_heuristic_counts_fields_of_core_type() {
        let mut config = bare_config();
        config.min_fields_to_box = 3;
        let mut text = String::from(
            "// Wide1: many fields\n#[derive(Debug, Clone)]\npub struct Wide1 {\n",
        );
        for i in 0..3 {
            text.push_str(&format!("    pub f{i}: String,\n"));
        }
        text.push_str("}\n");
        let file = Extractor::new().scan(PathBuf::from("camt_052_001_08.rs"), text);
        let graph = TypeGraph::build([&file]);
        let depths = NestingDepths::compute(&graph);
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(
            engine.evaluate(&parent("AnyType1"), &field("Vec<Wide1>")),
            Some(Strategy::Size)
        );

        config.use_size_heuristic = false;
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("Vec<Wide1>")), None);
    }

    #[test]
    fn test_depth_heuristic_uses_computed_nesting() {
        let mut config = bare_config();
        config.max_nesting_depth = 2;
        let text = "\
// Outer1: level two
#[derive(Debug, Clone)]
pub struct Outer1 {
    pub mid: Middle1,
}

// Middle1: level one
#[derive(Debug, Clone)]
pub struct Middle1 {
    pub inner: Inner1,
}

// Inner1: leaf
#[derive(Debug, Clone)]
pub struct Inner1 {
    pub value: String,
}
";
        let file = Extractor::new().scan(PathBuf::from("camt_052_001_08.rs"), text.to_string());
        let graph = TypeGraph::build([&file]);
        let depths = NestingDepths::compute(&graph);
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(
            engine.evaluate(&parent("AnyType1"), &field("Vec<Outer1>")),
            Some(Strategy::Depth)
        );
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("Vec<Middle1>")), None);

        config.use_nesting_analysis = false;
        let engine = PolicyEngine::new(&config, &graph, &depths).unwrap();
        assert_eq!(engine.evaluate(&parent("AnyType1"), &field("Vec<Outer1>")), None);
    }

    #[test]
    fn test_config_round_trips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box-config.json");
        let mut config = BoxConfig::default();
        config.min_fields_to_box = 7;
        config.use_size_heuristic = false;
        config.save(&path).unwrap();
        let loaded = BoxConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_malformed_config_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("box-config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = BoxConfig::load(&path).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_invalid_pattern_is_rejected_up_front() {
        let mut config = bare_config();
        config.box_in_vec_patterns = vec!["(".to_string()];
        let (graph, depths) = empty_analysis();
        let err = PolicyEngine::new(&config, &graph, &depths).unwrap_err();
        assert!(matches!(err, CoreError::InvalidPattern(_)));
    }
}
