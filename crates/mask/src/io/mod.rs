pub mod collector;
pub mod output;

pub use collector::*;
pub use output::*;
