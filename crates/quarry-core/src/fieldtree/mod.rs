//! Field tree parsing: path specs in, validated selection trees out.

mod expand;
mod node;
mod parser;

pub use expand::{Expander, DEFAULT_MAX_DEPTH, MAX_DEPTH, MIN_DEPTH};
pub use node::{FieldNode, FieldSelection};
pub use parser::FieldTreeParser;
