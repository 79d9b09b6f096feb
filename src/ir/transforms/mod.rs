//! Whole-tree transformers and the custom structural operators used by the normalizer.

pub mod chain;
pub mod groups;
pub mod keyword;
pub mod roles;
pub mod trivia;

use tracing::debug;

use crate::ir::error::Result;
use crate::ir::node::Node;
use crate::ir::op::Mapping;
use crate::ir::visitor::rewrite_post_order;

pub use chain::arr_to_chain;
pub use groups::merge_groups;
pub use keyword::arr_has_keyword;
pub use roles::RolesDedup;
pub use trivia::{TriviaRedirect, default_redirect, move_trivias};

/// A pass over a whole tree.
pub trait Transformer: Send + Sync {
    fn name(&self) -> &str;

    fn transform(&self, tree: &Node) -> Result<Node>;
}

/// Applies an ordered list of mappings in a single post-order traversal.
///
/// At every node the mappings are tried in order and the first one that matches replaces the
/// node. Nodes no mapping matches are kept.
pub struct Mappings {
    name: String,
    mappings: Vec<Mapping>,
}

impl Mappings {
    pub fn new(name: impl Into<String>, mappings: Vec<Mapping>) -> Self {
        Self {
            name: name.into(),
            mappings,
        }
    }

    pub fn mappings(&self) -> &[Mapping] {
        &self.mappings
    }
}

impl Transformer for Mappings {
    fn name(&self) -> &str {
        &self.name
    }

    fn transform(&self, tree: &Node) -> Result<Node> {
        let mut rewrites = 0usize;
        let out = rewrite_post_order(tree, &mut |node: &Node| {
            for mapping in &self.mappings {
                if let Some(replacement) = mapping.apply(node)? {
                    rewrites += 1;
                    return Ok(Some(replacement));
                }
            }
            Ok(None)
        })?;
        debug!(stage = %self.name, rewrites, "mappings applied");
        Ok(out)
    }
}
