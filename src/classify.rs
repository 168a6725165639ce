//! Structural classification of semantic values
//!
//! Decides which shape a payload has and whether the logical-expression
//! notation applies to it at all.

use crate::value::SemanticValue;

/// Default depth for [`contains_functor_node`]
pub const DEFAULT_SEARCH_DEPTH: usize = 5;

/// Shape of a value, as far as rendering is concerned
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Scalar,
    EmptyList,
    List,
    EmptyRecord,
    Record,
    Functor,
}

/// Classify a value. The envelope key is not looked through here.
pub fn classify(value: &SemanticValue) -> Kind {
    match value {
        SemanticValue::Null => Kind::Null,
        SemanticValue::Bool(_) | SemanticValue::Number(_) | SemanticValue::String(_) => {
            Kind::Scalar
        }
        SemanticValue::List(items) if items.is_empty() => Kind::EmptyList,
        SemanticValue::List(_) => Kind::List,
        SemanticValue::Record(entries) if entries.is_empty() => Kind::EmptyRecord,
        SemanticValue::Record(_) => Kind::Record,
        SemanticValue::Functor(_) => Kind::Functor,
    }
}

/// Bounded search for any functor node reachable through lists, records
/// and the envelope key.
///
/// Nodes deeper than `max_depth` are not inspected; the search answers
/// `false` for them instead of recursing further.
pub fn contains_functor_node(value: &SemanticValue, max_depth: usize) -> bool {
    search(value, 0, max_depth)
}

fn search(value: &SemanticValue, depth: usize, max_depth: usize) -> bool {
    if depth > max_depth {
        return false;
    }
    match value {
        SemanticValue::Functor(_) => true,
        SemanticValue::List(items) => items.iter().any(|v| search(v, depth + 1, max_depth)),
        // the envelope key is one of the record's entries
        SemanticValue::Record(entries) => entries
            .iter()
            .any(|(_, v)| search(v, depth + 1, max_depth)),
        _ => false,
    }
}

/// Classifier carrying a configured search depth
#[derive(Debug, Clone, Copy)]
pub struct StructuralClassifier {
    max_depth: usize,
}

impl Default for StructuralClassifier {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_SEARCH_DEPTH,
        }
    }
}

impl StructuralClassifier {
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    pub fn classify(&self, value: &SemanticValue) -> Kind {
        classify(value)
    }

    pub fn contains_functor_node(&self, value: &SemanticValue) -> bool {
        contains_functor_node(value, self.max_depth)
    }
}
