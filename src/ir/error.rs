use thiserror::Error;

/// Errors raised while matching or building trees.
///
/// A pattern that simply does not match is not an error: `check` returns `Ok(false)`.
/// Every variant here aborts the whole run for the input tree.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("variable {0:?} is not defined")]
    Undefined(String),

    #[error("expected {expected}, got {got}")]
    UnexpectedType { expected: &'static str, got: String },

    #[error("structural violation: {0}")]
    Structural(String),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("{0} cannot be used to construct a node")]
    NotConstructible(&'static str),

    #[error("mapping {mapping:?}: {source}")]
    Mapping {
        mapping: String,
        #[source]
        source: Box<TransformError>,
    },

    #[error("stage {stage:?}: {source}")]
    Stage {
        stage: String,
        #[source]
        source: Box<TransformError>,
    },

    #[error("stage dependency cycle involving {0:?}")]
    Cycle(String),
}

impl TransformError {
    pub fn unexpected(expected: &'static str, got: &crate::ir::node::Node) -> Self {
        TransformError::UnexpectedType {
            expected,
            got: got.kind_name().to_string(),
        }
    }

    /// Whether this error (or the error it wraps) is a malformed input report.
    pub fn is_malformed_input(&self) -> bool {
        match self {
            TransformError::MalformedInput(_) => true,
            TransformError::Mapping { source, .. } | TransformError::Stage { source, .. } => {
                source.is_malformed_input()
            }
            _ => false,
        }
    }
}

pub type Result<T, E = TransformError> = std::result::Result<T, E>;
