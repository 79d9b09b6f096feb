use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Kinds, Node, NodeVector};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;
use crate::uast;

/// Folds a `uast:Group` into the single `uast:FunctionGroup` it contains.
///
/// Hoisted comments end up in a group next to the function group they belong to; this op
/// splices the group's other children into the function group's `Nodes` at the position the
/// function group occupied. Groups with zero or several function groups are left alone.
pub struct MergeGroups {
    sub: OpRef,
}

pub fn merge_groups(sub: OpRef) -> OpRef {
    Arc::new(MergeGroups { sub })
}

fn nodes_of(group: &Node) -> Result<&NodeVector> {
    group
        .get(uast::FIELD_NODES)
        .and_then(Node::as_array)
        .ok_or_else(|| TransformError::Structural("expected an array in Group.Nodes".to_string()))
}

impl Op for MergeGroups {
    fn kinds(&self) -> Kinds {
        Kinds::OBJECT
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        if node.type_of() != Some(uast::TYPE_GROUP) {
            return Ok(false);
        }
        let children = nodes_of(node)?;
        let mut found = children
            .iter()
            .enumerate()
            .filter(|(_, n)| n.type_of() == Some(uast::TYPE_FUNCTION_GROUP));
        let (index, fgroup) = match (found.next(), found.next()) {
            (Some(hit), None) => hit,
            _ => return Ok(false),
        };
        let inner = nodes_of(fgroup)?;

        let mut merged = NodeVector::new_with_ptr_kind();
        for child in children.iter().take(index) {
            merged.push_back_mut(child.clone());
        }
        for child in inner.iter() {
            merged.push_back_mut(child.clone());
        }
        for child in children.iter().skip(index + 1) {
            merged.push_back_mut(child.clone());
        }
        let result = fgroup.with_field(uast::FIELD_NODES, Node::Array(merged));
        op::check(self.sub.as_ref(), st, &result)
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        self.sub.construct(st, seed)
    }
}
