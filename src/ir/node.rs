//! Generic tree value model shared by every pattern, mapping and transform.
//!
//! A [`Node`] is a JSON-like value. Arrays and objects are persistent (`rpds`) collections,
//! so cloning a node is cheap and rewriting one field of an object shares every other child
//! with the original tree.

use std::fmt;

use archery::ArcK;
use bitflags::bitflags;
use rpds::{RedBlackTreeMap, Vector};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};

/// Field holding the node type tag.
pub const KEY_TYPE: &str = "@type";
/// Field holding the canonical position of a node.
pub const KEY_POS: &str = "@pos";
/// Field holding the source text of a token.
pub const KEY_TOKEN: &str = "@token";
/// Field holding the role tags attached by the annotation stage.
pub const KEY_ROLE: &str = "@role";

pub type NodeVector = Vector<Node, ArcK>;
pub type NodeMap = RedBlackTreeMap<String, Node, ArcK>;

bitflags! {
    /// Set of node kinds an operation is applicable to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Kinds: u8 {
        const NULL = 1 << 0;
        const BOOL = 1 << 1;
        const INT = 1 << 2;
        const FLOAT = 1 << 3;
        const STRING = 1 << 4;
        const ARRAY = 1 << 5;
        const OBJECT = 1 << 6;

        const VALUES = Self::BOOL.bits() | Self::INT.bits() | Self::FLOAT.bits() | Self::STRING.bits();
        const NODES = Self::ARRAY.bits() | Self::OBJECT.bits();
        const ANY = Self::NULL.bits() | Self::VALUES.bits() | Self::NODES.bits();
    }
}

/// A single value of the tree.
///
/// `Null` is a first-class value distinct from an absent field; rewrites use it as a
/// tombstone for nodes that are deleted before the surrounding arrays are cleaned up.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Node {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Array(NodeVector),
    Object(NodeMap),
}

impl Node {
    /// Creates an empty array node.
    pub fn empty_array() -> Self {
        Node::Array(Vector::new_with_ptr_kind())
    }

    /// Creates an empty object node.
    pub fn empty_object() -> Self {
        Node::Object(RedBlackTreeMap::new_with_ptr_kind())
    }

    /// Builds an array node from any sequence of nodes.
    pub fn array<I>(items: I) -> Self
    where
        I: IntoIterator<Item = Node>,
    {
        Node::Array(items.into_iter().collect())
    }

    /// Builds an object node from `(field, value)` pairs. Later duplicates win.
    pub fn object<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        let mut map = NodeMap::new_with_ptr_kind();
        for (key, value) in fields {
            map.insert_mut(key.into(), value);
        }
        Node::Object(map)
    }

    /// Builds an object whose `@type` is `typ`, plus the given fields.
    pub fn typed<I, K>(typ: &str, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Node)>,
        K: Into<String>,
    {
        let mut map = NodeMap::new_with_ptr_kind();
        map.insert_mut(KEY_TYPE.to_string(), Node::from(typ));
        for (key, value) in fields {
            map.insert_mut(key.into(), value);
        }
        Node::Object(map)
    }

    /// The kind of this node as a single-bit [`Kinds`] set.
    pub fn kind(&self) -> Kinds {
        match self {
            Node::Null => Kinds::NULL,
            Node::Bool(_) => Kinds::BOOL,
            Node::Int(_) => Kinds::INT,
            Node::Float(_) => Kinds::FLOAT,
            Node::String(_) => Kinds::STRING,
            Node::Array(_) => Kinds::ARRAY,
            Node::Object(_) => Kinds::OBJECT,
        }
    }

    /// Short human readable kind name, used in error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Null => "null",
            Node::Bool(_) => "bool",
            Node::Int(_) => "int",
            Node::Float(_) => "float",
            Node::String(_) => "string",
            Node::Array(_) => "array",
            Node::Object(_) => "object",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Node::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Node::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Node::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Node::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&NodeVector> {
        match self {
            Node::Array(arr) => Some(arr),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&NodeMap> {
        match self {
            Node::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the value of `key` if this node is an object carrying it.
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.as_object().and_then(|obj| obj.get(key))
    }

    /// The `@type` tag of an object node, if any.
    pub fn type_of(&self) -> Option<&str> {
        self.get(KEY_TYPE).and_then(Node::as_str)
    }

    /// Returns a copy of this object with `key` set to `value`.
    /// Non-object nodes are returned unchanged.
    pub fn with_field(&self, key: &str, value: Node) -> Node {
        match self {
            Node::Object(obj) => Node::Object(obj.insert(key.to_string(), value)),
            other => other.clone(),
        }
    }

    /// Returns a copy of this object without `key`.
    pub fn without_field(&self, key: &str) -> Node {
        match self {
            Node::Object(obj) => Node::Object(obj.remove(key)),
            other => other.clone(),
        }
    }

    /// Number of direct children (array elements or object fields).
    pub fn len(&self) -> usize {
        match self {
            Node::Array(arr) => arr.len(),
            Node::Object(obj) => obj.size(),
            _ => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Converts this node into a `serde_json::Value`.
    pub fn to_json(&self) -> Value {
        Value::from(self)
    }
}

impl From<bool> for Node {
    fn from(b: bool) -> Self {
        Node::Bool(b)
    }
}

impl From<i64> for Node {
    fn from(i: i64) -> Self {
        Node::Int(i)
    }
}

impl From<f64> for Node {
    fn from(f: f64) -> Self {
        Node::Float(f)
    }
}

impl From<&str> for Node {
    fn from(s: &str) -> Self {
        Node::String(s.to_string())
    }
}

impl From<String> for Node {
    fn from(s: String) -> Self {
        Node::String(s)
    }
}

impl From<Vec<Node>> for Node {
    fn from(items: Vec<Node>) -> Self {
        Node::array(items)
    }
}

impl From<Value> for Node {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Node::Null,
            Value::Bool(b) => Node::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Node::Int(i),
                None => Node::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => Node::String(s),
            Value::Array(items) => Node::array(items.into_iter().map(Node::from)),
            Value::Object(fields) => Node::object(fields.into_iter().map(|(k, v)| (k, Node::from(v)))),
        }
    }
}

impl From<&Node> for Value {
    fn from(node: &Node) -> Self {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::Number((*i).into()),
            // NaN and infinities have no JSON representation.
            Node::Float(f) => Number::from_f64(*f).map(Value::Number).unwrap_or(Value::Null),
            Node::String(s) => Value::String(s.clone()),
            Node::Array(arr) => Value::Array(arr.iter().map(Value::from).collect()),
            Node::Object(obj) => Value::Object(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl Serialize for Node {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        use serde::ser::{SerializeMap, SerializeSeq};
        match self {
            Node::Null => serializer.serialize_unit(),
            Node::Bool(b) => serializer.serialize_bool(*b),
            Node::Int(i) => serializer.serialize_i64(*i),
            Node::Float(f) => serializer.serialize_f64(*f),
            Node::String(s) => serializer.serialize_str(s),
            Node::Array(arr) => {
                let mut seq = serializer.serialize_seq(Some(arr.len()))?;
                for item in arr.iter() {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Node::Object(obj) => {
                let mut map = serializer.serialize_map(Some(obj.size()))?;
                for (key, value) in obj.iter() {
                    map.serialize_entry(key, value)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Value::deserialize(deserializer).map(Node::from)
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::from(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_conversion_keeps_structure() {
        let value = json!({
            "@type": "IdentifierToken",
            "Text": "x",
            "IsMissing": false,
            "Arity": 0,
            "Weight": 1.5,
            "LeadingTrivia": [null, {"@type": "WhitespaceTrivia"}],
        });
        let node = Node::from(value.clone());
        assert_eq!(node.type_of(), Some("IdentifierToken"));
        assert_eq!(node.get("Arity"), Some(&Node::Int(0)));
        assert_eq!(node.get("Weight"), Some(&Node::Float(1.5)));
        assert_eq!(node.get("LeadingTrivia").map(Node::len), Some(2));
        assert_eq!(node.to_json(), value);
    }

    #[test]
    fn test_with_field_does_not_touch_original() {
        let node = Node::typed("Block", [("Statements", Node::empty_array())]);
        let updated = node.with_field("Statements", Node::array([Node::Null]));
        assert_eq!(node.get("Statements").map(Node::len), Some(0));
        assert_eq!(updated.get("Statements").map(Node::len), Some(1));

        let removed = updated.without_field("Statements");
        assert_eq!(removed.get("Statements"), None);
        assert_eq!(removed.type_of(), Some("Block"));
    }

    #[test]
    fn test_kinds() {
        assert_eq!(Node::Null.kind(), Kinds::NULL);
        assert!(Kinds::VALUES.contains(Node::from("x").kind()));
        assert!(!Kinds::VALUES.contains(Node::empty_object().kind()));
        assert!(Kinds::ANY.contains(Node::empty_array().kind()));
    }

    #[test]
    fn test_serde_roundtrip() {
        let node = Node::typed("uast:Bool", [("Value", Node::Bool(true))]);
        let text = serde_json::to_string(&node).unwrap();
        assert_eq!(text, r#"{"@type":"uast:Bool","Value":true}"#);
        let back: Node = serde_json::from_str(&text).unwrap();
        assert_eq!(back, node);
    }
}
