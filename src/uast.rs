//! The canonical semantic node schema and helpers to build mappings that target it.

use std::sync::Arc;

use crate::ir::error::Result;
use crate::ir::node::{KEY_POS, KEY_TYPE, Kinds, Node, NodeMap};
use crate::ir::op::{Mapping, Op, OpRef};
use crate::ir::ops::{Obj, ObjectOp, obj, string, var};
use crate::ir::state::State;

pub const TYPE_IDENTIFIER: &str = "uast:Identifier";
pub const TYPE_STRING: &str = "uast:String";
pub const TYPE_BOOL: &str = "uast:Bool";
pub const TYPE_BLOCK: &str = "uast:Block";
pub const TYPE_COMMENT: &str = "uast:Comment";
pub const TYPE_IMPORT: &str = "uast:Import";
pub const TYPE_QUALIFIED_IDENTIFIER: &str = "uast:QualifiedIdentifier";
pub const TYPE_ARGUMENT: &str = "uast:Argument";
pub const TYPE_FUNCTION_GROUP: &str = "uast:FunctionGroup";
pub const TYPE_ALIAS: &str = "uast:Alias";
pub const TYPE_FUNCTION: &str = "uast:Function";
pub const TYPE_FUNCTION_TYPE: &str = "uast:FunctionType";
pub const TYPE_GROUP: &str = "uast:Group";
pub const TYPE_POSITIONS: &str = "uast:Positions";
pub const TYPE_POSITION: &str = "uast:Position";

pub const FIELD_NODES: &str = "Nodes";

/// Semantic node kinds produced by the normalizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticKind {
    Identifier,
    String,
    Bool,
    Block,
    Comment,
    Import,
    QualifiedIdentifier,
    Argument,
    FunctionGroup,
    Alias,
    Function,
    FunctionType,
    Group,
}

impl SemanticKind {
    pub fn type_name(self) -> &'static str {
        match self {
            SemanticKind::Identifier => TYPE_IDENTIFIER,
            SemanticKind::String => TYPE_STRING,
            SemanticKind::Bool => TYPE_BOOL,
            SemanticKind::Block => TYPE_BLOCK,
            SemanticKind::Comment => TYPE_COMMENT,
            SemanticKind::Import => TYPE_IMPORT,
            SemanticKind::QualifiedIdentifier => TYPE_QUALIFIED_IDENTIFIER,
            SemanticKind::Argument => TYPE_ARGUMENT,
            SemanticKind::FunctionGroup => TYPE_FUNCTION_GROUP,
            SemanticKind::Alias => TYPE_ALIAS,
            SemanticKind::Function => TYPE_FUNCTION,
            SemanticKind::FunctionType => TYPE_FUNCTION_TYPE,
            SemanticKind::Group => TYPE_GROUP,
        }
    }

    /// Schema fields with their zero values. Lists and optional children default to `Null`.
    pub fn defaults(self) -> Vec<(&'static str, Node)> {
        let empty = || Node::from("");
        match self {
            SemanticKind::Identifier => vec![("Name", empty())],
            SemanticKind::String => vec![("Value", empty()), ("Format", empty())],
            SemanticKind::Bool => vec![("Value", Node::Bool(false))],
            SemanticKind::Block => vec![("Statements", Node::Null)],
            SemanticKind::Comment => vec![
                ("Text", empty()),
                ("Prefix", empty()),
                ("Suffix", empty()),
                ("Tab", empty()),
                ("Block", Node::Bool(false)),
            ],
            SemanticKind::Import => vec![
                ("Path", Node::Null),
                ("All", Node::Bool(false)),
                ("Names", Node::Null),
                ("Target", Node::Null),
            ],
            SemanticKind::QualifiedIdentifier => vec![("Names", Node::Null)],
            SemanticKind::Argument => vec![
                ("Name", Node::Null),
                ("Type", Node::Null),
                ("Init", Node::Null),
                ("Variadic", Node::Bool(false)),
                ("MapVariadic", Node::Bool(false)),
                ("Receiver", Node::Bool(false)),
            ],
            SemanticKind::FunctionGroup | SemanticKind::Group => vec![(FIELD_NODES, Node::Null)],
            SemanticKind::Alias => vec![
                ("Name", SemanticKind::Identifier.zero()),
                ("Node", Node::Null),
            ],
            SemanticKind::Function => vec![
                ("Type", SemanticKind::FunctionType.zero()),
                ("Body", Node::Null),
            ],
            SemanticKind::FunctionType => vec![("Arguments", Node::Null), ("Returns", Node::Null)],
        }
    }

    /// A node of this kind with every field at its zero value.
    pub fn zero(self) -> Node {
        Node::typed(self.type_name(), self.defaults())
    }

    /// Adds `@type` and any schema field missing from `fields`.
    pub fn complete(self, mut fields: NodeMap) -> NodeMap {
        fields.insert_mut(KEY_TYPE.to_string(), Node::from(self.type_name()));
        for (name, value) in self.defaults() {
            if !fields.contains_key(name) {
                fields.insert_mut(name.to_string(), value);
            }
        }
        fields
    }
}

/// An object pattern made of a fixed header (type tag, position) followed by a body.
///
/// With a `kind`, construction completes the object with the schema defaults of that kind.
struct SchemaObj {
    header: Obj,
    body: Arc<dyn ObjectOp>,
    kind: Option<SemanticKind>,
}

impl ObjectOp for SchemaObj {
    fn match_fields(&self, st: &mut State, fields: &NodeMap) -> Result<Option<NodeMap>> {
        match self.header.match_fields(st, fields)? {
            Some(rest) => self.body.match_fields(st, &rest),
            None => Ok(None),
        }
    }

    fn construct_fields(&self, st: &State, base: NodeMap) -> Result<NodeMap> {
        let base = self.header.construct_fields(st, base)?;
        let fields = self.body.construct_fields(st, base)?;
        Ok(match self.kind {
            Some(kind) => kind.complete(fields),
            None => fields,
        })
    }
}

impl Op for SchemaObj {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        match node {
            Node::Object(fields) => Ok(self.match_fields(st, fields)?.is_some()),
            _ => Ok(false),
        }
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        Ok(Node::Object(
            self.construct_fields(st, NodeMap::new_with_ptr_kind())?,
        ))
    }
}

/// Pattern for a semantic node of `kind`: checks the type tag and, on construction, fills in
/// every schema field the body does not set.
pub fn uast_type(kind: SemanticKind, body: impl ObjectOp + 'static) -> OpRef {
    Arc::new(SchemaObj {
        header: obj().field(KEY_TYPE, string(kind.type_name())),
        body: Arc::new(body),
        kind: Some(kind),
    })
}

const POS_FLAG: &str = "optPos";
const POS_VAR: &str = "pos";

/// Maps a native node type to a semantic kind.
///
/// Both sides get the type tag and carry `@pos` over when the native node has one.
pub fn map_semantic(
    native: &str,
    kind: SemanticKind,
    src: impl ObjectOp + 'static,
    dst: impl ObjectOp + 'static,
) -> Mapping {
    let src = SchemaObj {
        header: obj()
            .field(KEY_TYPE, string(native))
            .opt(POS_FLAG, KEY_POS, var(POS_VAR)),
        body: Arc::new(src),
        kind: None,
    };
    let dst = SchemaObj {
        header: obj()
            .field(KEY_TYPE, string(kind.type_name()))
            .opt(POS_FLAG, KEY_POS, var(POS_VAR)),
        body: Arc::new(dst),
        kind: Some(kind),
    };
    Mapping::new(native, Arc::new(src), Arc::new(dst))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::boolean;
    use serde_json::json;

    #[test]
    fn test_zero_values() {
        assert_eq!(
            SemanticKind::Argument.zero().to_json(),
            json!({
                "@type": "uast:Argument",
                "Name": null, "Type": null, "Init": null,
                "Variadic": false, "MapVariadic": false, "Receiver": false,
            })
        );
        assert_eq!(
            SemanticKind::Alias.zero().get("Name").map(Node::to_json),
            Some(json!({"@type": "uast:Identifier", "Name": ""}))
        );
    }

    #[test]
    fn test_map_semantic_carries_position() {
        let m = map_semantic(
            "TrueLiteralExpression",
            SemanticKind::Bool,
            obj().field("IsMissing", boolean(false)),
            obj().field("Value", boolean(true)),
        );
        let pos = json!({"@type": "uast:Positions"});
        let input = Node::from(json!({"@type": "TrueLiteralExpression", "@pos": pos, "IsMissing": false}));
        let out = m.apply(&input).unwrap().unwrap();
        assert_eq!(out.to_json(), json!({"@type": "uast:Bool", "@pos": pos, "Value": true}));

        let bare = Node::from(json!({"@type": "TrueLiteralExpression", "IsMissing": false}));
        let out = m.apply(&bare).unwrap().unwrap();
        assert_eq!(out.to_json(), json!({"@type": "uast:Bool", "Value": true}));
    }

    #[test]
    fn test_uast_type_checks_tag() {
        let o = uast_type(SemanticKind::Identifier, obj().field("Name", var("n")));
        let mut st = State::new();
        let ident = Node::from(json!({"@type": "uast:Identifier", "Name": "x"}));
        assert!(crate::ir::op::check(o.as_ref(), &mut st, &ident).unwrap());
        let other = Node::from(json!({"@type": "uast:String", "Name": "x"}));
        assert!(!crate::ir::op::check(o.as_ref(), &mut State::new(), &other).unwrap());
    }
}
