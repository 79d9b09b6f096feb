//! Ordered alternation.
//!
//! Both ops record the index of the winning alternative under a tag variable, and
//! construction reads that tag to rebuild through the same alternative.

use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Kinds, Node, NodeMap};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::ops::object::{Obj, ObjectOp};
use crate::ir::state::State;

pub struct Cases {
    tag: String,
    alts: Vec<OpRef>,
}

pub fn cases(tag: &str, alts: Vec<OpRef>) -> OpRef {
    Arc::new(Cases {
        tag: tag.to_string(),
        alts,
    })
}

fn unknown_branch(tag: &str, index: usize) -> TransformError {
    TransformError::Structural(format!("no alternative {index} for cases {tag:?}"))
}

impl Op for Cases {
    fn kinds(&self) -> Kinds {
        self.alts
            .iter()
            .fold(Kinds::empty(), |acc, alt| acc | alt.kinds())
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        for (i, alt) in self.alts.iter().enumerate() {
            let saved = st.snapshot();
            if op::check(alt.as_ref(), st, node)? && st.bind_branch(&self.tag, i) {
                return Ok(true);
            }
            st.restore(saved);
        }
        Ok(false)
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        let i = st.branch(&self.tag)?;
        let alt = self.alts.get(i).ok_or_else(|| unknown_branch(&self.tag, i))?;
        alt.construct(st, seed)
    }
}

/// Alternation over objects: a shared field set plus one of several alternative field sets.
pub struct CasesObj {
    tag: String,
    common: Obj,
    alts: Vec<Obj>,
}

pub fn cases_obj(tag: &str, common: Obj, alts: Vec<Obj>) -> CasesObj {
    CasesObj {
        tag: tag.to_string(),
        common,
        alts,
    }
}

impl CasesObj {
    pub fn into_op(self) -> OpRef {
        Arc::new(self)
    }
}

impl ObjectOp for CasesObj {
    fn match_fields(&self, st: &mut State, obj: &NodeMap) -> Result<Option<NodeMap>> {
        let Some(rest) = self.common.match_fields(st, obj)? else {
            return Ok(None);
        };
        for (i, alt) in self.alts.iter().enumerate() {
            let saved = st.snapshot();
            if let Some(left) = alt.match_fields(st, &rest)? {
                if st.bind_branch(&self.tag, i) {
                    return Ok(Some(left));
                }
            }
            st.restore(saved);
        }
        Ok(None)
    }

    fn construct_fields(&self, st: &State, base: NodeMap) -> Result<NodeMap> {
        let base = self.common.construct_fields(st, base)?;
        let i = st.branch(&self.tag)?;
        let alt = self.alts.get(i).ok_or_else(|| unknown_branch(&self.tag, i))?;
        alt.construct_fields(st, base)
    }
}

impl Op for CasesObj {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        match node {
            Node::Object(map) => Ok(self.match_fields(st, map)?.is_some()),
            _ => Ok(false),
        }
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        Ok(Node::Object(
            self.construct_fields(st, NodeMap::new_with_ptr_kind())?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::{has_type, check, int, null, obj, string, var};
    use serde_json::json;

    #[test]
    fn test_cases_records_and_reuses_branch() {
        let src = cases("c", vec![null(), obj().field("Value", var("v")).into_op()]);
        let dst = cases("c", vec![null(), var("v")]);

        let mut st = State::new();
        assert!(op::check(src.as_ref(), &mut st, &Node::Null).unwrap());
        assert_eq!(st.branch("c").unwrap(), 0);
        assert_eq!(dst.construct(&st, None).unwrap(), Node::Null);

        let mut st = State::new();
        let clause = Node::from(json!({"@type": "EqualsValueClause", "Value": 5}));
        assert!(op::check(src.as_ref(), &mut st, &clause).unwrap());
        assert_eq!(st.branch("c").unwrap(), 1);
        assert_eq!(dst.construct(&st, None).unwrap(), Node::Int(5));
    }

    #[test]
    fn test_failed_alternative_leaks_nothing() {
        let src = cases(
            "c",
            vec![
                obj().field("A", var("a")).field("B", int(1)).into_op(),
                obj().field("A", var("other")).into_op(),
            ],
        );
        let mut st = State::new();
        let input = Node::from(json!({"A": "x", "B": 2}));
        assert!(op::check(src.as_ref(), &mut st, &input).unwrap());
        assert!(st.get("a").is_none());
        assert_eq!(st.get("other"), Some(&Node::from("x")));
    }

    #[test]
    fn test_unknown_branch_is_structural() {
        let dst = cases("c", vec![null()]);
        let mut st = State::new();
        st.bind_branch("c", 3);
        assert!(matches!(dst.construct(&st, None), Err(TransformError::Structural(_))));
    }

    #[test]
    fn test_cases_obj_branches() {
        let src = cases_obj(
            "case",
            obj().field("Right", var("right")),
            vec![
                obj().field("Left", check(has_type("uast:Identifier"), var("left"))),
                obj().field("Left", var("other")),
            ],
        )
        .into_op();
        let dst = cases_obj(
            "case",
            obj().field("@type", string("Out")),
            vec![obj().field("L", var("left")), obj().field("O", var("other"))],
        )
        .into_op();

        let input = Node::from(json!({"Right": 1, "Left": {"@type": "Other"}, "Extra": true}));
        let mut st = State::new();
        assert!(op::check(src.as_ref(), &mut st, &input).unwrap());
        assert_eq!(st.branch("case").unwrap(), 1);
        assert_eq!(
            dst.construct(&st, None).unwrap(),
            Node::from(json!({"@type": "Out", "O": {"@type": "Other"}}))
        );
    }
}
