pub mod config;
pub mod driver;
pub mod ir;
pub mod logging;
pub mod normalizer;
pub mod server;
pub mod uast;
