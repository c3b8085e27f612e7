//! Corpus-wide type graph and cycle-safe nesting-depth analysis.

use std::collections::{BTreeMap, BTreeSet};

use crate::extract::ScannedFile;
use crate::types::{is_primitive, TypeDefinition};

/// Name-keyed registry over every definition in the corpus, built once per
/// invocation and immutable afterwards. The first occurrence of a name wins;
/// same-named definitions across files are assumed verbatim copies.
#[derive(Debug, Default)]
pub struct TypeGraph {
    types: BTreeMap<String, TypeDefinition>,
}

impl TypeGraph {
    pub fn build<'a>(files: impl IntoIterator<Item = &'a ScannedFile>) -> Self {
        let mut types = BTreeMap::new();
        for file in files {
            for def in &file.defs {
                types
                    .entry(def.name.clone())
                    .or_insert_with(|| def.clone());
            }
        }
        Self { types }
    }

    pub fn get(&self, name: &str) -> Option<&TypeDefinition> {
        self.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn field_count(&self, name: &str) -> Option<usize> {
        self.types.get(name).map(|d| d.fields.len())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.types.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Memoized nesting depths over a type graph.
///
/// `depth(T) = 1 + max(depth(C))` over the non-primitive children of `T`
/// resolvable in the graph, `0` when there are none. A type already on the
/// current traversal path contributes `0` instead of recursing, so
/// legitimately recursive schemas terminate. Unresolved (foreign) references
/// contribute `0`.
#[derive(Debug)]
pub struct NestingDepths {
    depths: BTreeMap<String, u32>,
}

impl NestingDepths {
    pub fn compute(graph: &TypeGraph) -> Self {
        let mut depths = BTreeMap::new();
        let mut path = BTreeSet::new();
        for name in graph.names() {
            depth_of(graph, name, &mut depths, &mut path);
        }
        Self { depths }
    }

    /// Depth for `name`; unknown names report 0.
    pub fn get(&self, name: &str) -> u32 {
        self.depths.get(name).copied().unwrap_or(0)
    }
}

fn depth_of(
    graph: &TypeGraph,
    name: &str,
    memo: &mut BTreeMap<String, u32>,
    path: &mut BTreeSet<String>,
) -> u32 {
    if let Some(&depth) = memo.get(name) {
        return depth;
    }
    if path.contains(name) {
        return 0;
    }
    let Some(def) = graph.get(name) else {
        return 0;
    };
    path.insert(name.to_string());
    let mut max = 0;
    for field in &def.fields {
        if is_primitive(&field.core_type) || !graph.contains(&field.core_type) {
            continue;
        }
        max = max.max(1 + depth_of(graph, &field.core_type, memo, path));
    }
    path.remove(name);
    memo.insert(name.to_string(), max);
    max
}
