//! The bidirectional pattern interpreter.
//!
//! An [`Op`] is used in two directions. [`Op::check`] matches a node and records what it saw in
//! a [`State`]; [`Op::construct`] rebuilds a node from the same bindings. A [`Mapping`] pairs a
//! source op with a destination op: whatever the source binds, the destination reads.

use std::sync::Arc;

use tracing::trace;

use super::error::{Result, TransformError};
use super::node::{Kinds, Node};
use super::state::State;

/// A pattern that can both match and build nodes.
pub trait Op: Send + Sync {
    /// Node kinds this op can match. Nodes of other kinds are rejected by [`check`] without
    /// calling [`Op::check`].
    fn kinds(&self) -> Kinds {
        Kinds::ANY
    }

    /// Matches `node`, binding variables into `st`.
    ///
    /// Returns `Ok(false)` on a clean mismatch. Bindings made before a mismatch may remain in
    /// `st`; callers that try alternatives must snapshot and restore.
    fn check(&self, st: &mut State, node: &Node) -> Result<bool>;

    /// Builds a node from the bindings in `st`.
    ///
    /// `seed` is an optional starting value; ops that only forward their input (such as `Any`)
    /// return it, everything else ignores it.
    fn construct(&self, st: &State, seed: Option<Node>) -> Result<Node>;

    /// Number of array elements this op always consumes, if fixed.
    fn fixed_len(&self) -> Option<usize> {
        None
    }
}

pub type OpRef = Arc<dyn Op>;

/// Matches `node` against `op`, rejecting nodes outside `op.kinds()` up front.
pub fn check(op: &dyn Op, st: &mut State, node: &Node) -> Result<bool> {
    if !op.kinds().contains(node.kind()) {
        return Ok(false);
    }
    op.check(st, node)
}

/// A named rewrite rule: nodes matching `src` are replaced by `dst` built from the same bindings.
#[derive(Clone)]
pub struct Mapping {
    name: String,
    src: OpRef,
    dst: OpRef,
}

impl Mapping {
    pub fn new(name: impl Into<String>, src: OpRef, dst: OpRef) -> Self {
        Self {
            name: name.into(),
            src,
            dst,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tries this mapping on a single node with a fresh state.
    ///
    /// Returns `Ok(None)` when the source pattern does not match.
    pub fn apply(&self, node: &Node) -> Result<Option<Node>> {
        let mut st = State::new();
        let matched = check(self.src.as_ref(), &mut st, node).map_err(|e| self.wrap(e))?;
        if !matched {
            return Ok(None);
        }
        trace!(mapping = %self.name, bindings = st.len(), "mapping matched");
        let out = self.dst.construct(&st, None).map_err(|e| self.wrap(e))?;
        Ok(Some(out))
    }

    /// The same rule applied in the opposite direction.
    pub fn reverse(&self) -> Mapping {
        Mapping {
            name: format!("{}(reverse)", self.name),
            src: Arc::clone(&self.dst),
            dst: Arc::clone(&self.src),
        }
    }

    fn wrap(&self, err: TransformError) -> TransformError {
        TransformError::Mapping {
            mapping: self.name.clone(),
            source: Box::new(err),
        }
    }
}
