//! Role annotation of native nodes.

use rustc_hash::FxHashMap;
use tracing::debug;

use crate::config::{NormalizerConfig, RoleRule};
use crate::ir::error::Result;
use crate::ir::node::{KEY_ROLE, KEY_TOKEN, KEY_TYPE, Node, NodeMap};
use crate::ir::pipeline::{Pipeline, Stage};
use crate::ir::transforms::{RolesDedup, Transformer};
use crate::ir::visitor::{Visitor, walk_object};

/// Appends the configured roles to every node whose native type is in the role table.
///
/// A rule with a `token_field` also moves that field's value to `@token`.
pub struct Annotate {
    table: FxHashMap<String, RoleRule>,
}

impl Annotate {
    pub fn new(config: &NormalizerConfig) -> Self {
        Self {
            table: config
                .roles
                .iter()
                .map(|(t, r)| (t.clone(), r.clone()))
                .collect(),
        }
    }
}

impl Visitor for Annotate {
    fn visit_object(&self, fields: &NodeMap) -> Result<Node> {
        let walked = walk_object(self, fields)?;
        let Some(rule) = walked
            .get(KEY_TYPE)
            .and_then(Node::as_str)
            .and_then(|t| self.table.get(t))
        else {
            return Ok(walked);
        };

        let mut roles: Vec<Node> = walked
            .get(KEY_ROLE)
            .and_then(Node::as_array)
            .map(|r| r.iter().cloned().collect())
            .unwrap_or_default();
        roles.extend(rule.roles.iter().map(|r| Node::from(r.as_str())));
        let mut out = walked.with_field(KEY_ROLE, Node::from(roles));

        if let Some(field) = &rule.token_field {
            if let Some(value) = out.get(field).cloned() {
                out = out.without_field(field).with_field(KEY_TOKEN, value);
            }
        }
        Ok(out)
    }
}

impl Transformer for Annotate {
    fn name(&self) -> &str {
        "annotate"
    }

    fn transform(&self, tree: &Node) -> Result<Node> {
        let out = self.visit_node(tree)?;
        debug!(stage = self.name(), rules = self.table.len(), "roles annotated");
        Ok(out)
    }
}

/// Annotation followed by role deduplication.
pub fn pipeline(config: &NormalizerConfig) -> Pipeline {
    let mut pipeline = Pipeline::new();
    pipeline.add_stage(Stage::new("annotate", &[], Annotate::new(config)));
    pipeline.add_stage(Stage::new("roles-dedup", &["annotate"], RolesDedup));
    pipeline
}
