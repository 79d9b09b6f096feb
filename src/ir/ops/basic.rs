//! Leaf patterns and predicates.

use std::sync::Arc;

use crate::ir::error::{Result, TransformError};
use crate::ir::node::{Kinds, Node};
use crate::ir::op::{self, Op, OpRef};
use crate::ir::state::State;

/// Matches anything and binds nothing.
pub struct Any;

impl Op for Any {
    fn check(&self, _st: &mut State, _node: &Node) -> Result<bool> {
        Ok(true)
    }

    fn construct(&self, _st: &State, seed: Option<Node>) -> Result<Node> {
        seed.ok_or(TransformError::NotConstructible("Any"))
    }
}

/// Matches one exact value and constructs it back.
pub struct Is(pub Node);

impl Op for Is {
    fn kinds(&self) -> Kinds {
        self.0.kind()
    }

    fn check(&self, _st: &mut State, node: &Node) -> Result<bool> {
        Ok(*node == self.0)
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Ok(self.0.clone())
    }
}

/// Captures a subtree under a name.
pub struct Var(pub String);

impl Op for Var {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        Ok(st.bind(&self.0, node.clone()))
    }

    fn construct(&self, st: &State, _seed: Option<Node>) -> Result<Node> {
        st.must_get(&self.0).cloned()
    }
}

/// Runs a predicate first, then the inner op. Only the inner op constructs.
///
/// The predicate sees a scratch copy of the state, so anything it binds is discarded.
pub struct Check {
    pred: OpRef,
    inner: OpRef,
}

impl Op for Check {
    fn kinds(&self) -> Kinds {
        self.pred.kinds() & self.inner.kinds()
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let mut scratch = st.snapshot();
        if !op::check(self.pred.as_ref(), &mut scratch, node)? {
            return Ok(false);
        }
        op::check(self.inner.as_ref(), st, node)
    }

    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node> {
        self.inner.construct(st, seed)
    }

    fn fixed_len(&self) -> Option<usize> {
        self.inner.fixed_len()
    }
}

/// Negates a predicate.
pub struct Not(pub OpRef);

impl Op for Not {
    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        let mut scratch = st.snapshot();
        Ok(!op::check(self.0.as_ref(), &mut scratch, node)?)
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Err(TransformError::NotConstructible("Not"))
    }
}

/// Matches any of a fixed set of values.
pub struct In(pub Vec<Node>);

impl Op for In {
    fn kinds(&self) -> Kinds {
        self.0.iter().fold(Kinds::empty(), |acc, v| acc | v.kind())
    }

    fn check(&self, _st: &mut State, node: &Node) -> Result<bool> {
        Ok(self.0.contains(node))
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Err(TransformError::NotConstructible("In"))
    }
}

/// Every predicate must hold.
pub struct And(pub Vec<OpRef>);

impl Op for And {
    fn kinds(&self) -> Kinds {
        self.0.iter().fold(Kinds::ANY, |acc, o| acc & o.kinds())
    }

    fn check(&self, st: &mut State, node: &Node) -> Result<bool> {
        for pred in &self.0 {
            if !op::check(pred.as_ref(), st, node)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn construct(&self, _st: &State, _seed: Option<Node>) -> Result<Node> {
        Err(TransformError::NotConstructible("And"))
    }
}

pub fn any() -> OpRef {
    Arc::new(Any)
}

pub fn is(value: impl Into<Node>) -> OpRef {
    Arc::new(Is(value.into()))
}

pub fn null() -> OpRef {
    Arc::new(Is(Node::Null))
}

pub fn string(value: &str) -> OpRef {
    is(value)
}

pub fn boolean(value: bool) -> OpRef {
    is(value)
}

pub fn int(value: i64) -> OpRef {
    is(value)
}

pub fn var(name: &str) -> OpRef {
    Arc::new(Var(name.to_string()))
}

pub fn check(pred: OpRef, inner: OpRef) -> OpRef {
    Arc::new(Check { pred, inner })
}

pub fn not(pred: OpRef) -> OpRef {
    Arc::new(Not(pred))
}

pub fn is_in<I, V>(values: I) -> OpRef
where
    I: IntoIterator<Item = V>,
    V: Into<Node>,
{
    Arc::new(In(values.into_iter().map(Into::into).collect()))
}

pub fn and(preds: Vec<OpRef>) -> OpRef {
    Arc::new(And(preds))
}
