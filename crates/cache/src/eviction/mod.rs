//! Cost-based eviction for the memory tier
//!
//! The policy tracks the admission cost and access frequency of every
//! resident key and picks the least frequently used key (oldest access on
//! ties) when a newcomer would overflow the budget.

mod lfu;
mod traits;

pub use lfu::LfuPolicy;
pub use traits::EvictionPolicy;
