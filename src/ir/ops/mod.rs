//! Combinator library used to write mappings.
//!
//! Every combinator comes with a small constructor function returning an [`OpRef`]
//! (`crate::ir::op::OpRef`); object patterns are assembled with the [`obj`] builder.

pub mod array;
pub mod basic;
pub mod cases;
pub mod object;

pub use array::{append, arr, contains, drop_nils};
pub use basic::{and, any, boolean, check, int, is, is_in, not, null, string, var};
pub use cases::{cases, cases_obj};
pub use object::{Field, Obj, ObjectOp, has, has_type, obj, part};
