pub mod appdatasim;
mod diff;
pub mod fixtures;
pub mod memory_target;
pub mod schemagen;
pub mod statesim;

pub use diff::*;
