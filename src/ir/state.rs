use rustc_hash::FxHashMap;

use super::error::{Result, TransformError};
use super::node::Node;

/// Variable bindings for a single mapping attempt at a single tree position.
///
/// A fresh `State` is created for every attempt and dropped afterwards; nothing is shared
/// between sibling attempts. Alternation operators take a [`State::snapshot`] before trying a
/// branch and [`State::restore`] it when the branch fails, so failed branches never leak
/// bindings.
#[derive(Debug, Clone, Default)]
pub struct State {
    vars: FxHashMap<String, Node>,
}

impl State {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Node> {
        self.vars.get(name)
    }

    /// Reads a binding, failing if the variable was never bound.
    pub fn must_get(&self, name: &str) -> Result<&Node> {
        self.vars
            .get(name)
            .ok_or_else(|| TransformError::Undefined(name.to_string()))
    }

    /// Binds `name` to `node`.
    ///
    /// Returns `false` if `name` is already bound to a different value; the existing binding is
    /// kept in that case.
    pub fn bind(&mut self, name: &str, node: Node) -> bool {
        match self.vars.get(name) {
            Some(existing) => *existing == node,
            None => {
                self.vars.insert(name.to_string(), node);
                true
            }
        }
    }

    /// Records which alternative of `tag` matched.
    pub fn bind_branch(&mut self, tag: &str, index: usize) -> bool {
        self.bind(tag, Node::Int(index as i64))
    }

    /// Reads back the alternative recorded under `tag`.
    pub fn branch(&self, tag: &str) -> Result<usize> {
        match self.must_get(tag)? {
            Node::Int(i) if *i >= 0 => Ok(*i as usize),
            other => Err(TransformError::unexpected("branch index", other)),
        }
    }

    /// Reads a boolean flag bound by an optional field or keyword operator.
    pub fn flag(&self, name: &str) -> Result<bool> {
        let node = self.must_get(name)?;
        node.as_bool()
            .ok_or_else(|| TransformError::unexpected("bool", node))
    }

    pub fn snapshot(&self) -> State {
        self.clone()
    }

    pub fn restore(&mut self, snapshot: State) {
        *self = snapshot;
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
