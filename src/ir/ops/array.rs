//! Array patterns.

use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Kinds, Node, NodeVector};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;

/// Positional array pattern with exact arity.
pub struct Arr(Vec<OpRef>);

pub fn arr(elems: Vec<OpRef>) -> OpRef {
    Arc::new(Arr(elems))
}

impl Op for Arr {
    fn kinds(&self) -> Kinds {
        Kinds::ARRAY
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Node::Array(items) = node else {
            return Ok(false);
        };
        if items.len() != self.0.len() {
            return Ok(false);
        }
        for (elem, item) in self.0.iter().zip(items.iter()) {
            if !op::check(elem.as_ref(), st, item)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        let items = self
            .0
            .iter()
            .map(|elem| elem.construct(st, None))
            .collect::<Result<NodeVector>>()?;
        Ok(Node::Array(items))
    }

    fn fixed_len(&self) -> Option<usize> {
        Some(self.0.len())
    }
}

/// Splits one array across several parts; construct concatenates them back.
///
/// Parts with a [`Op::fixed_len`] take exactly that many elements from their position; the
/// single part of unknown length takes whatever is left.
pub struct Append(Vec<OpRef>);

pub fn append(parts: Vec<OpRef>) -> OpRef {
    Arc::new(Append(parts))
}

impl Append {
    fn split_lengths(&self, total: usize) -> Result<Option<Vec<usize>>> {
        let fixed: usize = self.0.iter().filter_map(|p| p.fixed_len()).sum();
        let open = self.0.iter().filter(|p| p.fixed_len().is_none()).count();
        if open > 1 {
            return Err(TransformError::Structural(
                "Append allows at most one part of unknown length".to_string(),
            ));
        }
        if fixed > total || (open == 0 && fixed != total) {
            return Ok(None);
        }
        let lengths = self
            .0
            .iter()
            .map(|p| p.fixed_len().unwrap_or(total - fixed))
            .collect();
        Ok(Some(lengths))
    }
}

impl Op for Append {
    fn kinds(&self) -> Kinds {
        Kinds::ARRAY
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Node::Array(items) = node else {
            return Ok(false);
        };
        let Some(lengths) = self.split_lengths(items.len())? else {
            return Ok(false);
        };
        let mut offset = 0;
        for (part, len) in self.0.iter().zip(lengths) {
            let slice = Node::array(items.iter().skip(offset).take(len).cloned());
            offset += len;
            if !op::check(part.as_ref(), st, &slice)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        let mut out = NodeVector::new_with_ptr_kind();
        for part in &self.0 {
            match part.construct(st, None)? {
                Node::Array(items) => {
                    for item in items.iter() {
                        out.push_back_mut(item.clone());
                    }
                }
                Node::Null => {}
                other => return Err(TransformError::unexpected("array", &other)),
            }
        }
        Ok(Node::Array(out))
    }

    fn fixed_len(&self) -> Option<usize> {
        self.0.iter().map(|p| p.fixed_len()).sum()
    }
}

/// Removes `Null` elements before handing the array to the inner op.
///
/// Construction does not put the removed elements back. `Null` itself is treated as an empty
/// array.
pub struct DropNils(OpRef);

pub fn drop_nils(inner: OpRef) -> OpRef {
    Arc::new(DropNils(inner))
}

impl Op for DropNils {
    fn kinds(&self) -> Kinds {
        Kinds::ARRAY | Kinds::NULL
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let filtered = match node {
            Node::Array(items) => Node::array(items.iter().filter(|n| !n.is_null()).cloned()),
            Node::Null => Node::empty_array(),
            _ => return Ok(false),
        };
        op::check(self.0.as_ref(), st, &filtered)
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        self.0.construct(st, seed)
    }
}

/// Predicate: some element of the array matches.
pub struct Contains(OpRef);

pub fn contains(inner: OpRef) -> OpRef {
    Arc::new(Contains(inner))
}

impl Op for Contains {
    fn kinds(&self) -> Kinds {
        Kinds::ARRAY
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let Node::Array(items) = node else {
            return Ok(false);
        };
        for item in items.iter() {
            let mut scratch = st.snapshot();
            if op::check(self.0.as_ref(), &mut scratch, item)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Err(TransformError::NotConstructible("Contains"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ops::{any, null, string, var};

    fn strings(items: &[&str]) -> Node {
        Node::array(items.iter().map(|s| Node::from(*s)))
    }

    #[test]
    fn test_arr_exact_arity() {
        let o = arr(vec![var("a"), any()]);
        let mut st = State::new();
        assert!(op::check(o.as_ref(), &mut st, &strings(&["x", "y"])).unwrap());
        assert!(!op::check(o.as_ref(), &mut State::new(), &strings(&["x"])).unwrap());
        assert_eq!(st.get("a"), Some(&Node::from("x")));
        assert_eq!(arr(vec![]).construct(&st, None).unwrap(), Node::empty_array());
    }

    #[test]
    fn test_append_splits_and_concatenates() {
        let o = append(vec![var("names"), arr(vec![var("last")])]);
        let input = strings(&["A", "B", "C"]);
        let mut st = State::new();
        assert!(op::check(o.as_ref(), &mut st, &input).unwrap());
        assert_eq!(st.get("names"), Some(&strings(&["A", "B"])));
        assert_eq!(st.get("last"), Some(&Node::from("C")));
        assert_eq!(o.construct(&st, None).unwrap(), input);
        assert!(!op::check(o.as_ref(), &mut State::new(), &Node::empty_array()).unwrap());
    }

    #[test]
    fn test_append_rejects_two_open_parts() {
        let o = append(vec![var("a"), var("b")]);
        assert!(matches!(
            op::check(o.as_ref(), &mut State::new(), &strings(&["x"])),
            Err(TransformError::Structural(_))
        ));
    }

    #[test]
    fn test_drop_nils_is_one_way() {
        let o = drop_nils(var("arr"));
        let input = Node::array([Node::Null, Node::from("c"), Node::Null]);
        let mut st = State::new();
        assert!(op::check(o.as_ref(), &mut st, &input).unwrap());
        assert_eq!(o.construct(&st, None).unwrap(), strings(&["c"]));

        let mut st = State::new();
        assert!(op::check(o.as_ref(), &mut st, &Node::Null).unwrap());
        assert_eq!(st.get("arr"), Some(&Node::empty_array()));
    }

    #[test]
    fn test_contains() {
        let o = contains(null());
        assert!(op::check(o.as_ref(), &mut State::new(), &Node::array([Node::Int(1), Node::Null])).unwrap());
        assert!(!op::check(o.as_ref(), &mut State::new(), &strings(&["a"])).unwrap());
        let bound = contains(string("b"));
        assert!(op::check(bound.as_ref(), &mut State::new(), &strings(&["a", "b"])).unwrap());
    }
}
