pub mod cst;
pub mod generator;
