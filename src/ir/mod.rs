pub mod error;
pub mod node;
pub mod op;
pub mod ops;
pub mod pipeline;
pub mod state;
pub mod transforms;
pub mod visitor;

pub use error::{Result, TransformError};
pub use node::Node;
