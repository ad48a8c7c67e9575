pub mod stats;
pub mod task;

pub use stats::*;
pub use task::*;
