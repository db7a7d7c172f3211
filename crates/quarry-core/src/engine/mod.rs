//! A reference engine implementing the session contract in memory.
//!
//! Real deployments implement [`RelationalEngine`](quarry_plan::RelationalEngine)
//! over an actual store; [`MemoryEngine`] exists so compiled queries can be
//! executed end to end in tests and demos without one.

mod eval;
mod memory;

pub use memory::{InstanceId, MemoryEngine};
