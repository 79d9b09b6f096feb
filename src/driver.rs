//! Request handling: runs the normalizer pipelines selected by a [`Mode`] over one tree, or
//! over a batch of trees in parallel.

use clap::ValueEnum;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::NormalizerConfig;
use crate::ir::error::Result;
use crate::ir::node::Node;
use crate::normalizer::Normalizer;

/// How far a native tree is taken.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// The tree as produced by the native parser.
    Native,
    /// Whitespace trivia removed, canonical positions.
    Preprocessed,
    /// Preprocessed native tree with roles.
    Annotated,
    /// Semantic UAST.
    #[default]
    Semantic,
}

/// One tree to transform, with its source text when available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub ast: Node,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub status: Status,
    #[serde(default)]
    pub errors: Vec<String>,
    pub ast: Option<Node>,
}

impl Response {
    pub fn ok(ast: Node) -> Self {
        Self {
            status: Status::Ok,
            errors: Vec::new(),
            ast: Some(ast),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: Status::Error,
            errors: vec![message.into()],
            ast: None,
        }
    }
}

/// Worker stack size. Parsing, rewriting and dropping a tree all recurse once per level.
pub const WORKER_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Parses JSON without serde_json's nesting limit. Deep trees are expected; run this on a
/// [`Driver`] worker.
pub fn parse_json<T: DeserializeOwned>(text: &str) -> serde_json::Result<T> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = T::deserialize(&mut de)?;
    de.end()?;
    Ok(value)
}

/// Shared, read-only entry point to the normalizer.
pub struct Driver {
    normalizer: Normalizer,
    mode: Mode,
    pool: Option<ThreadPool>,
}

impl Driver {
    pub fn new(config: NormalizerConfig, mode: Mode) -> Self {
        let pool = ThreadPoolBuilder::new()
            .stack_size(WORKER_STACK_SIZE)
            .thread_name(|i| format!("normalizer-{i}"))
            .build();
        let pool = match pool {
            Ok(pool) => Some(pool),
            Err(e) => {
                warn!(error = %e, "could not build worker pool, using the global rayon pool");
                None
            }
        };
        Self {
            normalizer: Normalizer::new(config),
            mode,
            pool,
        }
    }

    /// Runs `op` on a worker with a large stack.
    pub fn install<R, F>(&self, op: F) -> R
    where
        F: FnOnce() -> R + Send,
        R: Send,
    {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Transforms a native tree according to the driver mode.
    pub fn transform(&self, tree: &Node, source: Option<&str>) -> Result<Node> {
        debug!(mode = ?self.mode, "transforming tree");
        if self.mode == Mode::Native {
            return Ok(tree.clone());
        }
        let tree = self.normalizer.preprocess(tree, source)?;
        match self.mode {
            Mode::Native | Mode::Preprocessed => Ok(tree),
            Mode::Annotated => self.normalizer.annotate(&tree),
            Mode::Semantic => self.normalizer.normalize(&tree),
        }
    }

    pub fn handle(&self, request: &Request) -> Response {
        match self.transform(&request.ast, request.content.as_deref()) {
            Ok(ast) => Response::ok(ast),
            Err(e) => {
                warn!(error = %e, "transform failed");
                Response::error(e.to_string())
            }
        }
    }

    /// Handles every request on the rayon pool. Responses keep the request order.
    pub fn handle_batch(&self, requests: &[Request]) -> Vec<Response> {
        self.install(|| requests.par_iter().map(|r| self.handle(r)).collect())
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(NormalizerConfig::default(), Mode::default())
    }
}
