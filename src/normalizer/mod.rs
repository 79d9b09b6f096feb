//! The C# normalizer: preprocessing, role annotation and semantic normalization of the native
//! syntax tree, each an [`Pipeline`] of tree transforms.

pub mod annotation;
pub mod comments;
pub mod normalize;
pub mod positions;
pub mod preprocess;
pub mod semantic;

use tracing::debug;

use crate::config::NormalizerConfig;
use crate::ir::error::Result;
use crate::ir::node::Node;
use crate::ir::pipeline::Pipeline;

/// All normalizer pipelines, built once from a configuration and shared read-only.
pub struct Normalizer {
    config: NormalizerConfig,
    preprocess: Pipeline,
    annotate: Pipeline,
    normalize: Pipeline,
}

impl Normalizer {
    pub fn new(config: NormalizerConfig) -> Self {
        Self {
            preprocess: preprocess::pipeline(&config),
            annotate: annotation::pipeline(&config),
            normalize: normalize::pipeline(&config),
            config,
        }
    }

    pub fn config(&self) -> &NormalizerConfig {
        &self.config
    }

    /// Cleans up the native tree. With the source text, positions also get line/column numbers
    /// and comment tokens are read from the source.
    pub fn preprocess(&self, tree: &Node, source: Option<&str>) -> Result<Node> {
        let tree = self.preprocess.apply(tree)?;
        match source {
            Some(source) => positions::apply_source(&tree, source, &self.config.source_token_types),
            None => {
                debug!("no source text, skipping line/column positions");
                Ok(tree)
            }
        }
    }

    /// Adds roles to a preprocessed tree.
    pub fn annotate(&self, tree: &Node) -> Result<Node> {
        self.annotate.apply(tree)
    }

    /// Turns a preprocessed tree into semantic UAST.
    pub fn normalize(&self, tree: &Node) -> Result<Node> {
        self.normalize.apply(tree)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(NormalizerConfig::default())
    }
}
