//! The two compilation strategies over a normalized path selection.

mod flat;
mod graph;
mod normalize;

pub use flat::FlatCompiler;
pub use graph::GraphCompiler;
pub use normalize::normalize_selection;
