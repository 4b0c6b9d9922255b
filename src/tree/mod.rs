//! The two tree variants and the engine they share.

pub(crate) mod core;
mod rebuild;
mod relaxed;
mod strict;

pub use relaxed::{BalancingPolicy, LooseBalancing, RelaxedKdTree, TightBalancing};
pub use strict::KdTree;
