use rustc_hash::FxHashSet;
use tracing::debug;

use crate::ir::error::Result;
use crate::ir::node::{KEY_ROLE, Node, NodeMap};
use crate::ir::transforms::Transformer;
use crate::ir::visitor::{Visitor, walk_object};

/// Removes repeated role tags from every `@role` array, keeping the first occurrence.
pub struct RolesDedup;

impl Visitor for RolesDedup {
    fn visit_object(&self, fields: &NodeMap) -> Result<Node> {
        let walked = walk_object(self, fields)?;
        let Some(roles) = walked.get(KEY_ROLE).and_then(Node::as_array) else {
            return Ok(walked);
        };
        let mut seen = FxHashSet::default();
        let unique: Vec<Node> = roles
            .iter()
            .filter(|role| seen.insert(role.to_string()))
            .cloned()
            .collect();
        if unique.len() == roles.len() {
            return Ok(walked);
        }
        Ok(walked.with_field(KEY_ROLE, Node::from(unique)))
    }
}

impl Transformer for RolesDedup {
    fn name(&self) -> &str {
        "roles-dedup"
    }

    fn transform(&self, tree: &Node) -> Result<Node> {
        let out = self.visit_node(tree)?;
        debug!(stage = self.name(), "role tags deduplicated");
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_duplicate_roles_removed_in_order() {
        let tree = Node::from(json!({
            "@type": "Block",
            "@role": ["Block", "Scope", "Block"],
            "Statements": [{"@type": "X", "@role": ["Literal", "Literal", "String"]}],
        }));
        let out = RolesDedup.transform(&tree).unwrap();
        assert_eq!(
            out.to_json(),
            json!({
                "@type": "Block",
                "@role": ["Block", "Scope"],
                "Statements": [{"@type": "X", "@role": ["Literal", "String"]}],
            })
        );
        assert_eq!(RolesDedup.transform(&out).unwrap(), out);
    }
}
