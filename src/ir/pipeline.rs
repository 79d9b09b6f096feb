use std::collections::HashMap;
use std::sync::Arc;

use petgraph::Graph;
use petgraph::algo::toposort;
use petgraph::graph::NodeIndex;
use tracing::debug;

use super::error::{Result, TransformError};
use super::node::Node;
use super::transforms::Transformer;

/// Manages a pipeline of whole-tree transformations.
/// Stages are organized in a dependency graph and executed in topological order,
/// ensuring that dependent stages run after their prerequisites.
#[derive(Default)]
pub struct Pipeline {
    /// The dependency graph of stages.
    graph: Graph<Stage, ()>,
    /// Maps stage IDs to their indices in the graph.
    node_indices: HashMap<String, NodeIndex>,
}

/// A single stage in the pipeline, including its transformer and dependencies.
#[derive(Clone)]
pub struct Stage {
    /// Unique identifier for the stage.
    pub id: String,
    /// List of stage IDs this stage depends on.
    pub dependencies: Vec<String>,
    /// The transformer implementing the stage.
    pub transformer: Arc<dyn Transformer>,
}

impl Stage {
    pub fn new(id: &str, dependencies: &[&str], transformer: impl Transformer + 'static) -> Self {
        Stage {
            id: id.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            transformer: Arc::new(transformer),
        }
    }
}

impl Pipeline {
    /// Creates a new, empty pipeline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a stage to the pipeline, establishing its dependencies.
    ///
    /// Dependencies must be added before their dependents; unknown dependency IDs are ignored.
    pub fn add_stage(&mut self, stage: Stage) {
        let id = stage.id.clone();
        let deps = stage.dependencies.clone();
        let node = self.graph.add_node(stage);
        self.node_indices.insert(id, node);
        for dep_id in &deps {
            if let Some(dep_node) = self.node_indices.get(dep_id) {
                self.graph.add_edge(*dep_node, node, ());
            }
        }
    }

    /// Adds an ordering edge between two existing stages.
    pub fn add_dependency(&mut self, before: &str, after: &str) {
        if let (Some(a), Some(b)) = (self.node_indices.get(before), self.node_indices.get(after)) {
            self.graph.add_edge(*a, *b, ());
        }
    }

    /// Removes a stage from the pipeline by its ID.
    pub fn remove_stage(&mut self, id: &str) {
        if let Some(node) = self.node_indices.remove(id) {
            self.graph.remove_node(node);
            // `remove_node` moves the last node into the freed slot.
            self.node_indices = self
                .graph
                .node_indices()
                .map(|idx| (self.graph[idx].id.clone(), idx))
                .collect();
        }
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Stage IDs in execution order.
    pub fn order(&self) -> Result<Vec<String>> {
        Ok(self
            .sorted()?
            .into_iter()
            .map(|idx| self.graph[idx].id.clone())
            .collect())
    }

    fn sorted(&self) -> Result<Vec<NodeIndex>> {
        toposort(&self.graph, None)
            .map_err(|cycle| TransformError::Cycle(self.graph[cycle.node_id()].id.clone()))
    }

    /// Applies all stages to the tree in topological order.
    ///
    /// The first failing stage aborts the run; its error is wrapped with the stage ID.
    pub fn apply(&self, tree: &Node) -> Result<Node> {
        let mut current = tree.clone();
        for idx in self.sorted()? {
            let stage = &self.graph[idx];
            debug!(stage = %stage.id, "running stage");
            current = stage
                .transformer
                .transform(&current)
                .map_err(|e| TransformError::Stage {
                    stage: stage.id.clone(),
                    source: Box::new(e),
                })?;
        }
        Ok(current)
    }
}
