pub mod validation;
pub mod compositing;

pub use validation::*;
pub use compositing::*;
