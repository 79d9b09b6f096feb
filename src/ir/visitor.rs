//! Tree traversal.
//!
//! Two styles are provided. [`rewrite_post_order`] drives mapping stages: children are rewritten
//! before their parent and the callback decides per node whether to replace it. [`Visitor`] is a
//! trait for passes that need to look at arrays and objects as a whole (role handling, position
//! enrichment); implementors override the hooks they care about and call [`walk_array`] /
//! [`walk_object`] to recurse.

use crate::ir::error::Result;
use crate::ir::node::{Node, NodeMap, NodeVector};

/// Rewrites `node` bottom-up.
///
/// `f` is called once for every node, after all of its children have been rewritten. Returning
/// `Ok(Some(new))` replaces the node with `new`; the replacement is not visited again.
pub fn rewrite_post_order<F>(node: &Node, f: &mut F) -> Result<Node>
where
    F: FnMut(&Node) -> Result<Option<Node>>,
{
    let rebuilt = match node {
        Node::Array(items) => {
            let mut out = NodeVector::new_with_ptr_kind();
            for item in items.iter() {
                out.push_back_mut(rewrite_post_order(item, f)?);
            }
            Node::Array(out)
        }
        Node::Object(fields) => {
            let mut out = fields.clone();
            for (key, value) in fields.iter() {
                out.insert_mut(key.clone(), rewrite_post_order(value, f)?);
            }
            Node::Object(out)
        }
        leaf => leaf.clone(),
    };
    Ok(f(&rebuilt)?.unwrap_or(rebuilt))
}

/// Structural visitor over [`Node`] trees.
///
/// The default implementation is the identity transform.
pub trait Visitor {
    /// Dispatches on the node kind. Leaves are returned as they are.
    fn visit_node(&self, node: &Node) -> Result<Node> {
        match node {
            Node::Array(items) => self.visit_array(items),
            Node::Object(fields) => self.visit_object(fields),
            leaf => Ok(leaf.clone()),
        }
    }

    fn visit_array(&self, items: &NodeVector) -> Result<Node> {
        walk_array(self, items)
    }

    fn visit_object(&self, fields: &NodeMap) -> Result<Node> {
        walk_object(self, fields)
    }
}

/// Visits every element of an array and rebuilds it.
pub fn walk_array<V: Visitor + ?Sized>(visitor: &V, items: &NodeVector) -> Result<Node> {
    let mut out = NodeVector::new_with_ptr_kind();
    for item in items.iter() {
        out.push_back_mut(visitor.visit_node(item)?);
    }
    Ok(Node::Array(out))
}

/// Visits every field value of an object and rebuilds it.
pub fn walk_object<V: Visitor + ?Sized>(visitor: &V, fields: &NodeMap) -> Result<Node> {
    let mut out = fields.clone();
    for (key, value) in fields.iter() {
        out.insert_mut(key.clone(), visitor.visit_node(value)?);
    }
    Ok(Node::Object(out))
}
