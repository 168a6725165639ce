//! Semantic values - normalized pipeline payloads
//!
//! The service returns schema-free JSON for every step. Before any rendering
//! logic sees it, the payload is normalized into [`SemanticValue`], an
//! explicit sum type. Objects carrying a `functor` or an `args` key become
//! [`SemanticValue::Functor`]; either key alone is enough.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};

/// Reserved key that wraps the real payload one level down.
pub const ENVELOPE_KEY: &str = "T";

const FUNCTOR_KEY: &str = "functor";
const ARGS_KEY: &str = "args";

/// A normalized step payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum SemanticValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    List(Vec<SemanticValue>),
    /// Key/value record in the order the service sent it
    Record(Vec<(String, SemanticValue)>),
    Functor(FunctorNode),
}

/// A tagged logical-expression node: `{functor, args}`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctorNode {
    /// `None` when the node only carried `args`
    pub functor: Option<String>,
    /// Conventionally a list, but any value is accepted
    pub args: Option<Box<SemanticValue>>,
    /// Any other keys found next to `functor`/`args`
    pub extra: Vec<(String, SemanticValue)>,
}

impl FunctorNode {
    pub fn new(functor: impl Into<String>, args: Vec<SemanticValue>) -> Self {
        Self {
            functor: Some(functor.into()),
            args: Some(Box::new(SemanticValue::List(args))),
            extra: Vec::new(),
        }
    }

    /// Functor name, or `""` when absent
    pub fn name(&self) -> &str {
        self.functor.as_deref().unwrap_or("")
    }

    /// Arguments viewed as a slice.
    ///
    /// A list yields its elements, a missing or null `args` yields nothing,
    /// and any other value is treated as a single argument.
    pub fn arg_slice(&self) -> &[SemanticValue] {
        match self.args.as_deref() {
            None | Some(SemanticValue::Null) => &[],
            Some(SemanticValue::List(items)) => items,
            Some(other) => std::slice::from_ref(other),
        }
    }
}

impl SemanticValue {
    /// Convenience constructor for string scalars
    pub fn string(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Convenience constructor for functor nodes with list args
    pub fn functor(name: impl Into<String>, args: Vec<SemanticValue>) -> Self {
        Self::Functor(FunctorNode::new(name, args))
    }

    /// Normalize an untrusted JSON value
    pub fn from_json(value: Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::from_object(map),
        }
    }

    fn from_object(map: Map<String, Value>) -> Self {
        let is_functor = map.contains_key(FUNCTOR_KEY) || map.contains_key(ARGS_KEY);
        if !is_functor {
            return Self::Record(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            );
        }

        let mut node = FunctorNode {
            functor: None,
            args: None,
            extra: Vec::new(),
        };
        for (key, value) in map {
            match key.as_str() {
                FUNCTOR_KEY => {
                    node.functor = match value {
                        Value::Null => None,
                        Value::String(s) => Some(s),
                        other => Some(other.to_string()),
                    }
                }
                ARGS_KEY => node.args = Some(Box::new(Self::from_json(value))),
                _ => node.extra.push((key, Self::from_json(value))),
            }
        }
        Self::Functor(node)
    }

    /// Convert back to plain JSON (for the raw view)
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Number(n) => Value::Number(n.clone()),
            Self::String(s) => Value::String(s.clone()),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Record(entries) => Value::Object(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Functor(node) => {
                let mut map = Map::new();
                if let Some(name) = &node.functor {
                    map.insert(FUNCTOR_KEY.to_string(), Value::String(name.clone()));
                }
                if let Some(args) = &node.args {
                    map.insert(ARGS_KEY.to_string(), args.to_json());
                }
                for (k, v) in &node.extra {
                    map.insert(k.clone(), v.to_json());
                }
                Value::Object(map)
            }
        }
    }

    /// Indented JSON serialization
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.to_json()).unwrap_or_else(|_| "null".to_string())
    }

    /// Single-line JSON serialization
    pub fn to_compact_json(&self) -> String {
        self.to_json().to_string()
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SemanticValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_functor(&self) -> Option<&FunctorNode> {
        match self {
            Self::Functor(node) => Some(node),
            _ => None,
        }
    }

    /// Look up a key on a record
    pub fn get(&self, key: &str) -> Option<&SemanticValue> {
        match self {
            Self::Record(entries) => entries.iter().find(|(k, _)| k == key).map(|(_, v)| v),
            _ => None,
        }
    }

    /// Payload wrapped under the envelope key, if this is an envelope record
    pub fn envelope(&self) -> Option<&SemanticValue> {
        self.get(ENVELOPE_KEY)
    }

    /// Strip one level of envelope. Never recurses.
    pub fn unwrap_envelope(&self) -> &SemanticValue {
        self.envelope().unwrap_or(self)
    }

    /// Literal text of a scalar (`None` for collections and functors).
    ///
    /// Strings come back unquoted; callers decide how to present them.
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Self::Null => Some("null".to_string()),
            Self::Bool(b) => Some(b.to_string()),
            Self::Number(n) => Some(n.to_string()),
            Self::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl Default for SemanticValue {
    fn default() -> Self {
        Self::Null
    }
}

impl From<Value> for SemanticValue {
    fn from(value: Value) -> Self {
        Self::from_json(value)
    }
}

impl From<SemanticValue> for Value {
    fn from(value: SemanticValue) -> Self {
        value.to_json()
    }
}

impl From<&str> for SemanticValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_functor_needs_only_one_key() {
        let only_functor = SemanticValue::from_json(json!({"functor": "dog"}));
        let only_args = SemanticValue::from_json(json!({"args": ["x"]}));
        assert!(only_functor.as_functor().is_some());
        assert!(only_args.as_functor().is_some());
        assert_eq!(only_args.as_functor().map(|n| n.name()), Some(""));
    }

    #[test]
    fn test_plain_object_is_record_in_order() {
        let value = SemanticValue::from_json(json!({"zeta": 1, "alpha": 2}));
        match value {
            SemanticValue::Record(entries) => {
                let keys: Vec<_> = entries.iter().map(|(k, _)| k.as_str()).collect();
                assert_eq!(keys, vec!["zeta", "alpha"]);
            }
            other => panic!("expected record, got {:?}", other),
        }
    }

    #[test]
    fn test_non_list_args_is_single_argument() {
        let value = SemanticValue::from_json(json!({"functor": "f", "args": "x"}));
        let node = value.as_functor().unwrap();
        assert_eq!(node.arg_slice(), &[SemanticValue::string("x")]);

        let value = SemanticValue::from_json(json!({"functor": "f", "args": null}));
        assert!(value.as_functor().unwrap().arg_slice().is_empty());
    }

    #[test]
    fn test_envelope_unwraps_one_level_only() {
        let value = SemanticValue::from_json(json!({"T": {"T": {"functor": "p"}}}));
        let once = value.unwrap_envelope();
        assert!(once.envelope().is_some());
        assert!(once.unwrap_envelope().as_functor().is_some());
    }

    #[test]
    fn test_json_conversion_keeps_extra_keys() {
        let raw = json!({"functor": "p", "args": [1, true], "arity": 2});
        let value = SemanticValue::from_json(raw.clone());
        assert_eq!(value.to_json(), raw);
    }

    #[test]
    fn test_deserialize_through_serde() {
        let value: SemanticValue = serde_json::from_str(r#"[{"functor":"x","args":[]}]"#).unwrap();
        assert!(value.as_list().unwrap()[0].as_functor().is_some());
    }
}
