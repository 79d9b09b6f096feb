use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Node, NodeVector};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;

const TYPE_FIELD: &str = "Type";

/// Converts between a flat modifier array plus a terminal type and a right-nested chain of
/// modifier objects linked through their `Type` field.
///
/// Element 0 of the array is the outermost link of the chain.
pub struct ArrToChain {
    mods: OpRef,
    typ: OpRef,
}

pub fn arr_to_chain(mods: OpRef, typ: OpRef) -> OpRef {
    Arc::new(ArrToChain { mods, typ })
}

fn is_modifier(node: &Node) -> bool {
    node.type_of().is_some_and(|t| t.ends_with("Keyword")) && node.get(TYPE_FIELD).is_some()
}

impl Op for ArrToChain {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let mut mods = NodeVector::new_with_ptr_kind();
        let mut current = node;
        while is_modifier(current) {
            mods.push_back_mut(current.without_field(TYPE_FIELD));
            match current.get(TYPE_FIELD) {
                Some(inner) => current = inner,
                None => break,
            }
        }
        if !op::check(self.typ.as_ref(), st, current)? {
            return Ok(false);
        }
        op::check(self.mods.as_ref(), st, &Node::Array(mods))
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        let mods = match self.mods.construct(st, None)? {
            Node::Array(items) => items,
            Node::Null => NodeVector::new_with_ptr_kind(),
            other => return Err(TransformError::unexpected("array", &other)),
        };
        let mut typ = self.typ.construct(st, seed)?;
        let mods: Vec<&Node> = mods.iter().collect();
        for modifier in mods.into_iter().rev() {
            let Node::Object(fields) = modifier else {
                return Err(TransformError::unexpected("object", modifier));
            };
            if fields.contains_key(TYPE_FIELD) {
                return Err(TransformError::Structural(
                    "modifier already has a Type field".to_string(),
                ));
            }
            typ = Node::Object(fields.insert(TYPE_FIELD.to_string(), typ));
        }
        Ok(typ)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::var;

    fn keyword(typ: &str) -> Node {
        Node::typed(typ, [("Text", Node::from(typ.trim_end_matches("Keyword").to_lowercase()))])
    }

    #[test]
    fn test_fold_puts_first_modifier_outermost() {
        let o = arr_to_chain(var("mods"), var("typ"));
        let mut st = State::new();
        st.bind("mods", Node::array([keyword("RefKeyword"), keyword("ReadOnlyKeyword")]));
        st.bind("typ", Node::typed("PredefinedType", [("Keyword", Node::from("int"))]));
        let chain = o.construct(&st, None).unwrap();
        assert_eq!(chain.type_of(), Some("RefKeyword"));
        let inner = chain.get("Type").unwrap();
        assert_eq!(inner.type_of(), Some("ReadOnlyKeyword"));
        assert_eq!(inner.get("Type").and_then(Node::type_of), Some("PredefinedType"));
    }

    #[test]
    fn test_unfold_then_fold_round_trip() {
        let o = arr_to_chain(var("mods"), var("typ"));
        let mods = Node::array([keyword("RefKeyword"), keyword("OutKeyword")]);
        let typ = Node::typed("IdentifierName", [("Arity", Node::Int(0))]);
        let mut st = State::new();
        st.bind("mods", mods.clone());
        st.bind("typ", typ.clone());
        let chain = o.construct(&st, None).unwrap();

        let mut back = State::new();
        assert!(op::check(o.as_ref(), &mut back, &chain).unwrap());
        assert_eq!(back.get("mods"), Some(&mods));
        assert_eq!(back.get("typ"), Some(&typ));
    }

    #[test]
    fn test_plain_type_has_no_modifiers() {
        let o = arr_to_chain(var("mods"), var("typ"));
        let mut st = State::new();
        let typ = Node::typed("PredefinedType", Vec::<(String, Node)>::new());
        assert!(op::check(o.as_ref(), &mut st, &typ).unwrap());
        assert_eq!(st.get("mods"), Some(&Node::empty_array()));
    }

    #[test]
    fn test_modifier_with_type_is_rejected() {
        let o = arr_to_chain(var("mods"), var("typ"));
        let mut st = State::new();
        st.bind("mods", Node::array([keyword("RefKeyword").with_field("Type", Node::Null)]));
        st.bind("typ", Node::Null);
        assert!(matches!(o.construct(&st, None), Err(TransformError::Structural(_))));

        let mut st = State::new();
        st.bind("mods", Node::array([Node::from("ref")]));
        st.bind("typ", Node::Null);
        assert!(matches!(o.construct(&st, None), Err(TransformError::UnexpectedType { .. })));
    }
}
