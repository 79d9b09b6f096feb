use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Kinds, Node};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;

/// Turns the presence of a keyword token in an array into a boolean flag.
///
/// On check, the first element whose `@type` equals `keyword` is removed; `has` sees
/// `Bool(true)` and `rest` sees the remaining elements in their original order. When no
/// element matches, `has` sees `Bool(false)` and `rest` the untouched array.
///
/// Construction reads the flag back but does not put the keyword token back into the array.
pub struct ArrHasKeyword {
    keyword: String,
    has: OpRef,
    rest: OpRef,
}

pub fn arr_has_keyword(keyword: &str, has: OpRef, rest: OpRef) -> OpRef {
    Arc::new(ArrHasKeyword {
        keyword: keyword.to_string(),
        has,
        rest,
    })
}

impl Op for ArrHasKeyword {
    fn kinds(&self) -> Kinds {
        Kinds::ARRAY
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Node::Array(items) = node else {
            return Ok(false);
        };
        let found = items
            .iter()
            .position(|item| item.type_of() == Some(self.keyword.as_str()));
        match found {
            Some(index) => {
                if !op::check(self.has.as_ref(), st, &Node::Bool(true))? {
                    return Ok(false);
                }
                let rest = Node::array(
                    items
                        .iter()
                        .enumerate()
                        .filter(|(i, _)| *i != index)
                        .map(|(_, item)| item.clone()),
                );
                op::check(self.rest.as_ref(), st, &rest)
            }
            None => {
                if !op::check(self.has.as_ref(), st, &Node::Bool(false))? {
                    return Ok(false);
                }
                op::check(self.rest.as_ref(), st, node)
            }
        }
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        let flag = self.has.construct(st, None)?;
        if flag.as_bool().is_none() {
            return Err(TransformError::unexpected("bool", &flag));
        }
        // The keyword token itself is not synthesized; only the residual array is rebuilt.
        self.rest.construct(st, seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::{boolean, var};

    fn token(typ: &str) -> Node {
        Node::typed(typ, [("Text", Node::from(typ))])
    }

    #[test]
    fn test_keyword_present() {
        let o = arr_has_keyword("ParamsKeyword", var("variadic"), var("rest"));
        let input = Node::array([token("RefKeyword"), token("ParamsKeyword"), token("ThisKeyword")]);
        let mut st = State::new();
        assert!(op::check(o.as_ref(), &mut st, &input).unwrap());
        assert!(st.flag("variadic").unwrap());
        assert_eq!(
            st.get("rest"),
            Some(&Node::array([token("RefKeyword"), token("ThisKeyword")]))
        );
    }

    #[test]
    fn test_keyword_absent_keeps_array() {
        let o = arr_has_keyword("ThisKeyword", var("this"), var("rest"));
        let input = Node::array([token("RefKeyword")]);
        let mut st = State::new();
        assert!(op::check(o.as_ref(), &mut st, &input).unwrap());
        assert!(!st.flag("this").unwrap());
        assert_eq!(st.get("rest"), Some(&input));
        assert_eq!(o.construct(&st, None).unwrap(), input);
    }

    #[test]
    fn test_has_pattern_can_reject() {
        let o = arr_has_keyword("ParamsKeyword", boolean(true), var("rest"));
        assert!(!op::check(o.as_ref(), &mut State::new(), &Node::empty_array()).unwrap());
    }

    #[test]
    fn test_construct_requires_bool_flag() {
        let o = arr_has_keyword("ParamsKeyword", var("flag"), var("rest"));
        let mut st = State::new();
        st.bind("flag", Node::from("yes"));
        st.bind("rest", Node::empty_array());
        assert!(matches!(
            o.construct(&st, None),
            Err(TransformError::UnexpectedType { expected: "bool", .. })
        ));
    }
}
