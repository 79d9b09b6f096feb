//! Hoisting of `LeadingTrivia`/`TrailingTrivia` out of the nodes that own them.
//!
//! Comments in the native tree hang off tokens. After hoisting, a node that carried trivia is
//! wrapped into a `uast:Group` whose `Nodes` are the leading trivia, the node itself and the
//! trailing trivia, in that order. Some container types receive the trivia into one of their
//! own array fields instead of being wrapped.
//!
//! Traversal is post-order, so by the time a parent is visited its token children may already
//! be groups. Those groups are unwrapped again and their trivia joined into the parent's, which
//! lets later mappings keep matching on the original token shapes.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{KEY_TYPE, Kinds, Node, NodeMap, NodeVector};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;
use crate::uast;

pub const LEADING_TRIVIA: &str = "LeadingTrivia";
pub const TRAILING_TRIVIA: &str = "TrailingTrivia";

/// Node type → array field receiving the hoisted trivia instead of a wrapping group.
pub type TriviaRedirect = FxHashMap<String, String>;

pub fn default_redirect() -> TriviaRedirect {
    [("Block", "Statements"), ("CompilationUnit", "Members")]
        .into_iter()
        .map(|(t, f)| (t.to_string(), f.to_string()))
        .collect()
}

pub struct MoveTrivias {
    sub: OpRef,
    redirect: Arc<TriviaRedirect>,
}

pub fn move_trivias(sub: OpRef, redirect: Arc<TriviaRedirect>) -> OpRef {
    Arc::new(MoveTrivias { sub, redirect })
}

/// Whether a field may hold a group produced by hoisting the trivia of a token child.
fn is_absorbable_field(key: &str) -> bool {
    key == "ReturnType" || key.ends_with("Token") || key.ends_with("Keyword")
}

fn is_trivia(node: &Node) -> bool {
    node.type_of().is_some_and(|t| t.ends_with("Trivia"))
}

fn extend(dst: &mut NodeVector, items: impl IntoIterator<Item = Node>) {
    for item in items {
        dst.push_back_mut(item);
    }
}

impl Op for MoveTrivias {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Node::Object(original) = node else {
            return Ok(false);
        };
        let mut obj: NodeMap = original.clone();
        let mut modified = false;
        let mut leading = NodeVector::new_with_ptr_kind();
        let mut trailing = NodeVector::new_with_ptr_kind();

        let lead = original.get(LEADING_TRIVIA).and_then(Node::as_array);
        let trail = original.get(TRAILING_TRIVIA).and_then(Node::as_array);
        if lead.is_some() || trail.is_some() {
            if let Some(items) = lead {
                leading = items.clone();
            }
            if let Some(items) = trail {
                trailing = items.clone();
            }
            obj.remove_mut(LEADING_TRIVIA);
            obj.remove_mut(TRAILING_TRIVIA);
            modified = true;
        }

        for (key, sub) in original.iter() {
            if !is_absorbable_field(key) || sub.type_of() != Some(uast::TYPE_GROUP) {
                continue;
            }
            let Some(items) = sub.get(uast::FIELD_NODES).and_then(Node::as_array) else {
                continue;
            };
            let replacement = match items.iter().position(|n| !is_trivia(n)) {
                Some(index) => {
                    extend(&mut leading, items.iter().take(index).cloned());
                    let mut after: NodeVector = items.iter().skip(index + 1).cloned().collect();
                    extend(&mut after, trailing.iter().cloned());
                    trailing = after;
                    items.get(index).cloned().unwrap_or(Node::Null)
                }
                None => {
                    extend(&mut leading, items.iter().cloned());
                    Node::Null
                }
            };
            obj.insert_mut(key.clone(), replacement);
            modified = true;
        }

        if leading.is_empty() && trailing.is_empty() {
            if !modified {
                return Ok(false);
            }
            return op::check(self.sub.as_ref(), st, &Node::Object(obj));
        }

        let typ = obj
            .get(KEY_TYPE)
            .and_then(Node::as_str)
            .map(str::to_string);
        if let Some(field) = typ.and_then(|t| self.redirect.get(&t)) {
            let Some(existing) = obj.get(field).and_then(Node::as_array) else {
                return Err(TransformError::Structural(format!(
                    "expected {field:?} field to be an array"
                )));
            };
            let mut joined = leading;
            extend(&mut joined, existing.iter().cloned());
            extend(&mut joined, trailing.iter().cloned());
            obj.insert_mut(field.clone(), Node::Array(joined));
            return op::check(self.sub.as_ref(), st, &Node::Object(obj));
        }

        let mut nodes = leading;
        nodes.push_back_mut(Node::Object(obj));
        extend(&mut nodes, trailing.iter().cloned());
        let group = Node::typed(uast::TYPE_GROUP, [(uast::FIELD_NODES, Node::Array(nodes))]);
        op::check(self.sub.as_ref(), st, &group)
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        self.sub.construct(st, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::var;
    use serde_json::json;

    fn run(input: serde_json::Value) -> Option<Node> {
        let o = move_trivias(var("group"), Arc::new(default_redirect()));
        let mut st = State::new();
        if op::check(o.as_ref(), &mut st, &Node::from(input)).unwrap() {
            Some(o.construct(&st, None).unwrap())
        } else {
            None
        }
    }

    fn comment(text: &str) -> serde_json::Value {
        json!({"@type": "SingleLineCommentTrivia", "@token": text})
    }

    #[test]
    fn test_wraps_node_into_group() {
        let out = run(json!({
            "@type": "IdentifierToken",
            "Text": "x",
            "LeadingTrivia": [comment("// a"), comment("// b")],
            "TrailingTrivia": [comment("// c")],
        }))
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"@type": "uast:Group", "Nodes": [
                comment("// a"),
                comment("// b"),
                {"@type": "IdentifierToken", "Text": "x"},
                comment("// c"),
            ]})
        );
    }

    #[test]
    fn test_empty_trivia_only_strips_fields() {
        let out = run(json!({"@type": "SemicolonToken", "LeadingTrivia": [], "TrailingTrivia": []}));
        assert_eq!(out.unwrap().to_json(), json!({"@type": "SemicolonToken"}));
    }

    #[test]
    fn test_nothing_to_move_is_no_match() {
        assert!(run(json!({"@type": "IdentifierName", "Arity": 0})).is_none());
    }

    #[test]
    fn test_redirects_into_block_statements() {
        let out = run(json!({
            "@type": "Block",
            "Statements": [{"@type": "ReturnStatement"}],
            "LeadingTrivia": [comment("// lead")],
            "TrailingTrivia": [comment("// trail")],
        }))
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"@type": "Block", "Statements": [
                comment("// lead"),
                {"@type": "ReturnStatement"},
                comment("// trail"),
            ]})
        );
    }

    #[test]
    fn test_redirect_field_must_be_array() {
        let o = move_trivias(var("group"), Arc::new(default_redirect()));
        let input = Node::from(json!({
            "@type": "CompilationUnit",
            "Members": null,
            "LeadingTrivia": [comment("// x")],
        }));
        assert!(matches!(
            op::check(o.as_ref(), &mut State::new(), &input),
            Err(TransformError::Structural(_))
        ));
    }

    #[test]
    fn test_reabsorbs_token_groups() {
        let out = run(json!({
            "@type": "MethodDeclaration",
            "SemicolonToken": {"@type": "uast:Group", "Nodes": [
                comment("// before"),
                {"@type": "SemicolonToken"},
                comment("// after"),
            ]},
            "Body": {"@type": "uast:Group", "Nodes": [comment("// untouched")]},
        }))
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"@type": "uast:Group", "Nodes": [
                comment("// before"),
                {
                    "@type": "MethodDeclaration",
                    "SemicolonToken": {"@type": "SemicolonToken"},
                    "Body": {"@type": "uast:Group", "Nodes": [comment("// untouched")]},
                },
                comment("// after"),
            ]})
        );
    }

    #[test]
    fn test_group_of_only_trivia_becomes_leading() {
        let out = run(json!({
            "@type": "Parameter",
            "CommaToken": {"@type": "uast:Group", "Nodes": [comment("// only")]},
        }))
        .unwrap();
        assert_eq!(
            out.to_json(),
            json!({"@type": "uast:Group", "Nodes": [
                comment("// only"),
                {"@type": "Parameter", "CommaToken": null},
            ]})
        );
    }
}
